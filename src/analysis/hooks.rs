//! Hook detection over a decoded instruction arena.
//!
//! The detector walks the function's instruction stream in address order and
//! checks every control transfer against the owning module's address range.
//! Immediate targets are checked directly; register-indirect branches and
//! returns are resolved through backward data-flow over the instructions
//! already seen, tracking one level of stack staging. Anything more obfuscated
//! than a single `push`/`pop` round-trip is accepted as undetectable.
//!
//! The scan reports the first qualifying instruction in forward address order
//! and stops; it does not enumerate further hooks.

use crate::analysis::decoder::decode_function;
use crate::analysis::types::{
    BranchKind, DecodedInstruction, HookDescriptor, HookKind, ModuleRange, Operation, X86Register,
};

/// Scan a function for control transfers that leave the owning module.
///
/// * `code` - the function's machine code, starting at `function_address`.
///   The caller may hand more bytes than `function_length`; only the first
///   `function_length` bytes are scanned.
/// * `bitness` - 32 or 64.
/// * `function_address` - virtual address of `code[0]`.
/// * `function_length` - byte length of the live code, typically obtained
///   from [`analyze_fn_length`](crate::analyze_fn_length).
/// * `module` - the trusted address span of the module owning the function.
///
/// Returns the first hook found in address order, or `None` if every resolved
/// control transfer stays inside `module`. Empty input, a zero length, and a
/// failed or empty decode all report `None`; there is nothing to analyze,
/// which is not an error.
///
/// # Example
///
/// ```rust
/// use hookscope::{analyze_fn_hook_presence, HookKind, ModuleRange};
///
/// let code = [
///     0xb8, 0x00, 0x00, 0x50, 0x00, // mov eax, 0x500000
///     0xff, 0xe0, // jmp eax
/// ];
/// let module = ModuleRange::new(0x40_0000, 0x1_0000);
/// let hook = analyze_fn_hook_presence(&code, 32, 0x40_1000, code.len(), &module)
///     .expect("redirect leaves the module");
/// assert_eq!(hook.kind, HookKind::RegisterIndirect);
/// assert_eq!(hook.hook_length, 7);
/// ```
#[must_use]
pub fn analyze_fn_hook_presence(
    code: &[u8],
    bitness: u32,
    function_address: u64,
    function_length: usize,
    module: &ModuleRange,
) -> Option<HookDescriptor> {
    if code.is_empty() || function_length == 0 {
        return None;
    }

    let window = &code[..function_length.min(code.len())];
    let instructions = decode_function(window, bitness, function_address).ok()?;
    if instructions.is_empty() {
        return None;
    }

    for (i, instr) in instructions.iter().enumerate() {
        match instr.operation {
            Operation::BranchImm { kind, target } => {
                if !module.contains(target) {
                    let kind = match kind {
                        BranchKind::Jmp => HookKind::DirectJump,
                        BranchKind::Call => HookKind::DirectCall,
                    };
                    return Some(materialize(window, function_address, &instructions, i, i, kind));
                }
            }
            Operation::BranchReg { reg, .. } => {
                if i == 0 {
                    continue;
                }
                if let Some(resolved) = resolve_register_source(&instructions, i, reg) {
                    if !module.contains(resolved.value) {
                        let kind = if resolved.staged {
                            HookKind::StackStaged
                        } else {
                            HookKind::RegisterIndirect
                        };
                        return Some(materialize(
                            window,
                            function_address,
                            &instructions,
                            resolved.anchor,
                            i,
                            kind,
                        ));
                    }
                }
            }
            Operation::Ret => {
                if i == 0 {
                    continue;
                }
                if let Some((anchor, value)) = resolve_stacked_value(&instructions, i) {
                    if !module.contains(value) {
                        return Some(materialize(
                            window,
                            function_address,
                            &instructions,
                            anchor,
                            i,
                            HookKind::ReturnRedirect,
                        ));
                    }
                }
            }
            Operation::MovImm { .. }
            | Operation::PushReg { .. }
            | Operation::PopReg { .. }
            | Operation::Other => {}
        }
    }

    None
}

/// Outcome of resolving the value a register holds at a branch site.
struct ResolvedSource {
    /// Index of the constant load that produced the value.
    anchor: usize,
    /// The resolved constant.
    value: u64,
    /// Whether the value travelled through a `push`/`pop` pair.
    staged: bool,
}

/// Resolve the value held in `reg` at instruction `i` by scanning backward
/// for the nearest write to an aliasing register.
///
/// The nearest write decides: a direct constant load yields its value, a
/// `pop` redirects resolution to the matching stack staging chain. Returns
/// `None` when the scan exhausts the arena without a qualifying write; the
/// caller skips the branch, it does not abort the scan.
fn resolve_register_source(
    instructions: &[DecodedInstruction],
    i: usize,
    reg: X86Register,
) -> Option<ResolvedSource> {
    for x in (0..i).rev() {
        match instructions[x].operation {
            Operation::MovImm { dst, value } if dst.aliases(reg) => {
                return Some(ResolvedSource {
                    anchor: x,
                    value,
                    staged: false,
                });
            }
            Operation::PopReg { dst } if dst.aliases(reg) => {
                let (anchor, value) = resolve_stacked_value(instructions, x)?;
                return Some(ResolvedSource {
                    anchor,
                    value,
                    staged: true,
                });
            }
            _ => {}
        }
    }
    None
}

/// Resolve the constant most recently staged on the stack before instruction
/// `limit`: the nearest preceding `push reg`, then the nearest constant load
/// into that pushed register.
///
/// This handles exactly one level of indirection; a value staged through two
/// pushes or mutated between `mov` and `push` is not resolvable.
fn resolve_stacked_value(instructions: &[DecodedInstruction], limit: usize) -> Option<(usize, u64)> {
    for y in (0..limit).rev() {
        if let Operation::PushReg { reg } = instructions[y].operation {
            for z in (0..y).rev() {
                if let Operation::MovImm { dst, value } = instructions[z].operation {
                    if dst.aliases(reg) {
                        return Some((z, value));
                    }
                }
            }
            // push found, but its source constant is not in the window
            return None;
        }
    }
    None
}

/// Build the evidence descriptor for the span `from..=to`.
///
/// `hook_data` is sliced from the scan window by address arithmetic; the
/// instructions in between were decoded contiguously, so the byte distance
/// equals the sum of the spanned instruction sizes.
fn materialize(
    window: &[u8],
    function_address: u64,
    instructions: &[DecodedInstruction],
    from: usize,
    to: usize,
    kind: HookKind,
) -> HookDescriptor {
    let hook_address = instructions[from].address;
    let hook_length = (instructions[to].end_address() - hook_address) as usize;
    let start = (hook_address - function_address) as usize;

    HookDescriptor {
        kind,
        hook_address,
        hook_length,
        hook_data: window[start..start + hook_length].to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MODULE: ModuleRange = ModuleRange {
        base: 0x40_0000,
        size: 0x1_0000,
    };
    const FN_ADDRESS: u64 = 0x40_1000;

    fn scan(code: &[u8]) -> Option<HookDescriptor> {
        analyze_fn_hook_presence(code, 32, FN_ADDRESS, code.len(), &MODULE)
    }

    #[test]
    fn test_empty_input_is_no_hook() {
        assert!(scan(&[]).is_none());
        let code = [0xc3];
        assert!(analyze_fn_hook_presence(&code, 32, FN_ADDRESS, 0, &MODULE).is_none());
    }

    #[test]
    fn test_direct_jump_out_of_module() {
        let code = [
            0xe9, 0xfb, 0xef, 0x0f, 0x00, // jmp 0x500000
            0xc3, // ret
        ];
        let hook = scan(&code).unwrap();
        assert_eq!(hook.kind, HookKind::DirectJump);
        assert_eq!(hook.hook_address, FN_ADDRESS);
        assert_eq!(hook.hook_length, 5);
        assert_eq!(hook.hook_data, &code[..5]);
    }

    #[test]
    fn test_direct_call_within_module_is_clean() {
        let code = [
            0xe8, 0x00, 0x01, 0x00, 0x00, // call 0x401105
            0xc3, // ret
        ];
        assert!(scan(&code).is_none());
    }

    #[test]
    fn test_register_indirect_hook_spans_mov_through_branch() {
        let code = [
            0xb8, 0x00, 0x00, 0x50, 0x00, // mov eax, 0x500000
            0x90, // nop
            0xff, 0xd0, // call eax
        ];
        let hook = scan(&code).unwrap();
        assert_eq!(hook.kind, HookKind::RegisterIndirect);
        assert_eq!(hook.hook_address, FN_ADDRESS);
        assert_eq!(hook.hook_length, 8);
        assert_eq!(hook.hook_data, code.to_vec());
    }

    #[test]
    fn test_register_indirect_within_module_is_clean() {
        let code = [
            0xb8, 0x34, 0x12, 0x40, 0x00, // mov eax, 0x401234
            0xff, 0xe0, // jmp eax
        ];
        assert!(scan(&code).is_none());
    }

    #[test]
    fn test_nearest_write_wins() {
        // A stale out-of-module constant is overwritten before the branch.
        let code = [
            0xb8, 0x00, 0x00, 0x50, 0x00, // mov eax, 0x500000
            0xb8, 0x34, 0x12, 0x40, 0x00, // mov eax, 0x401234
            0xff, 0xe0, // jmp eax
        ];
        assert!(scan(&code).is_none());
    }

    #[test]
    fn test_write_to_other_register_does_not_resolve() {
        let code = [
            0xb9, 0x00, 0x00, 0x50, 0x00, // mov ecx, 0x500000
            0xff, 0xe0, // jmp eax
        ];
        assert!(scan(&code).is_none());
    }

    #[test]
    fn test_stack_staged_within_module_is_clean() {
        let code = [
            0xb9, 0x34, 0x12, 0x40, 0x00, // mov ecx, 0x401234
            0x51, // push ecx
            0x58, // pop eax
            0xff, 0xe0, // jmp eax
        ];
        assert!(scan(&code).is_none());
    }

    #[test]
    fn test_return_within_module_is_clean() {
        let code = [
            0xb8, 0x34, 0x12, 0x40, 0x00, // mov eax, 0x401234
            0x50, // push eax
            0xc3, // ret
        ];
        assert!(scan(&code).is_none());
    }

    #[test]
    fn test_stack_staged_hook_anchors_at_constant_load() {
        let code = [
            0xb9, 0x00, 0x00, 0x50, 0x00, // mov ecx, 0x500000
            0x51, // push ecx
            0x90, // nop
            0x58, // pop eax
            0xff, 0xe0, // jmp eax
        ];
        let hook = scan(&code).unwrap();
        assert_eq!(hook.kind, HookKind::StackStaged);
        assert_eq!(hook.hook_address, FN_ADDRESS);
        assert_eq!(hook.hook_length, 10);
        assert_eq!(hook.hook_data, code.to_vec());
    }

    #[test]
    fn test_return_redirect_detected() {
        let code = [
            0xb8, 0x00, 0x00, 0x50, 0x00, // mov eax, 0x500000
            0x50, // push eax
            0xc3, // ret
        ];
        let hook = scan(&code).unwrap();
        assert_eq!(hook.kind, HookKind::ReturnRedirect);
        assert_eq!(hook.hook_address, FN_ADDRESS);
        assert_eq!(hook.hook_length, 7);
        assert_eq!(hook.hook_data, code.to_vec());
    }

    #[test]
    fn test_plain_ret_is_clean() {
        let code = [
            0xb8, 0x01, 0x00, 0x00, 0x00, // mov eax, 1
            0xc3, // ret
        ];
        assert!(scan(&code).is_none());
    }

    #[test]
    fn test_leading_ret_does_not_abort_scan() {
        let code = [
            0xc3, // ret
            0xe9, 0xf6, 0xef, 0x0f, 0x00, // jmp 0x4ffffc
        ];
        let hook = scan(&code).unwrap();
        assert_eq!(hook.kind, HookKind::DirectJump);
        assert_eq!(hook.hook_address, FN_ADDRESS + 1);
    }

    #[test]
    fn test_unresolved_register_branch_is_skipped() {
        // No write to eax anywhere in the window; the later direct hook is
        // still reported.
        let code = [
            0x90, // nop
            0xff, 0xe0, // jmp eax
            0xe9, 0xf3, 0xef, 0x0f, 0x00, // jmp 0x4ffffb
        ];
        let hook = scan(&code).unwrap();
        assert_eq!(hook.kind, HookKind::DirectJump);
        assert_eq!(hook.hook_address, FN_ADDRESS + 3);
    }

    #[test]
    fn test_first_match_wins() {
        let code = [
            0xe9, 0xfb, 0xef, 0x0f, 0x00, // jmp 0x500000
            0xe9, 0xf6, 0xef, 0x1f, 0x00, // jmp 0x600000
        ];
        let hook = scan(&code).unwrap();
        assert_eq!(hook.hook_address, FN_ADDRESS);
        assert_eq!(hook.hook_length, 5);
    }

    #[test]
    fn test_scan_window_is_clamped_to_function_length() {
        let code = [
            0xc3, // ret (the function)
            0xe9, 0xf6, 0xef, 0x0f, 0x00, // neighboring padding-area bytes
        ];
        assert!(analyze_fn_hook_presence(&code, 32, FN_ADDRESS, 1, &MODULE).is_none());
    }

    #[test]
    fn test_movabs_jmp_rax_hook_64bit() {
        let module = ModuleRange::new(0x1_8000_0000, 0x1_0000);
        let code = [
            0x48, 0xb8, 0x00, 0x00, 0x00, 0x00, 0xf8, 0x7f, 0x00,
            0x00, // mov rax, 0x7ff800000000
            0xff, 0xe0, // jmp rax
        ];
        let hook = analyze_fn_hook_presence(&code, 64, 0x1_8000_1000, code.len(), &module).unwrap();
        assert_eq!(hook.kind, HookKind::RegisterIndirect);
        assert_eq!(hook.hook_length, 12);
    }

    #[test]
    fn test_narrow_mov_satisfies_full_width_branch() {
        // mov eax zero-extends into rax; the 64-bit branch still leaves the
        // module.
        let module = ModuleRange::new(0x1_8000_0000, 0x1_0000);
        let code = [
            0xb8, 0x00, 0x00, 0x50, 0x00, // mov eax, 0x500000
            0xff, 0xe0, // jmp rax
        ];
        let hook = analyze_fn_hook_presence(&code, 64, 0x1_8000_1000, code.len(), &module).unwrap();
        assert_eq!(hook.kind, HookKind::RegisterIndirect);
    }
}
