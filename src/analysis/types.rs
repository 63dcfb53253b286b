//! Instruction and detection result types.
//!
//! This module provides the simplified instruction representation the hook
//! detector operates on. The types are a deliberately small subset of what
//! iced-x86 exposes: only the operations that participate in redirection
//! patterns are modeled, everything else collapses into [`Operation::Other`].
//!
//! # Overview
//!
//! - [`X86Register`] - general-purpose registers (32/64-bit)
//! - [`Operation`] - classified instruction with its relevant operands
//! - [`DecodedInstruction`] - operation with address and length metadata
//! - [`ModuleRange`] - the trusted address span of the owning module
//! - [`HookDescriptor`] / [`HookKind`] - detection evidence handed to the caller

/// x86/x64 general-purpose register.
///
/// Only full-width (32-bit and 64-bit) registers are modeled. Instructions
/// that touch 8- or 16-bit sub-registers cannot carry a code pointer and are
/// classified as [`Operation::Other`] by the decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum X86Register {
    // 32-bit
    Eax,
    Ecx,
    Edx,
    Ebx,
    Esp,
    Ebp,
    Esi,
    Edi,

    // 64-bit
    Rax,
    Rcx,
    Rdx,
    Rbx,
    Rsp,
    Rbp,
    Rsi,
    Rdi,
    R8,
    R9,
    R10,
    R11,
    R12,
    R13,
    R14,
    R15,
}

impl X86Register {
    /// Returns the architectural register index this register is part of.
    ///
    /// E.g. `EAX` and `RAX` both map to index 0.
    #[inline]
    #[must_use]
    pub fn base_index(&self) -> u8 {
        match self {
            X86Register::Eax | X86Register::Rax => 0,
            X86Register::Ecx | X86Register::Rcx => 1,
            X86Register::Edx | X86Register::Rdx => 2,
            X86Register::Ebx | X86Register::Rbx => 3,
            X86Register::Esp | X86Register::Rsp => 4,
            X86Register::Ebp | X86Register::Rbp => 5,
            X86Register::Esi | X86Register::Rsi => 6,
            X86Register::Edi | X86Register::Rdi => 7,
            X86Register::R8 => 8,
            X86Register::R9 => 9,
            X86Register::R10 => 10,
            X86Register::R11 => 11,
            X86Register::R12 => 12,
            X86Register::R13 => 13,
            X86Register::R14 => 14,
            X86Register::R15 => 15,
        }
    }

    /// Returns true if both registers name the same architectural register.
    ///
    /// Writes to a 32-bit register zero-extend into the full 64-bit register,
    /// so `mov eax, imm` determines the value a later `jmp rax` branches to.
    #[inline]
    #[must_use]
    pub fn aliases(&self, other: X86Register) -> bool {
        self.base_index() == other.base_index()
    }
}

/// Whether a control transfer is a jump or a call.
///
/// Both are treated identically during detection; the distinction is kept so
/// a [`HookDescriptor`] can report the exact shape of the redirect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchKind {
    /// Unconditional `jmp`.
    Jmp,
    /// `call`.
    Call,
}

/// Classified x86 instruction.
///
/// This is a closed set matched exhaustively at every dispatch site. Only the
/// kinds below participate in detection; conditional jumps, memory-indirect
/// branches, and all remaining instructions are [`Operation::Other`] and are
/// stepped over by the scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Control transfer to an immediate target: `jmp 0x1234` / `call 0x1234`.
    BranchImm {
        /// Jump or call.
        kind: BranchKind,
        /// Absolute target address.
        target: u64,
    },
    /// Control transfer through a register: `jmp rax` / `call rax`.
    BranchReg {
        /// Jump or call.
        kind: BranchKind,
        /// Register holding the target address.
        reg: X86Register,
    },
    /// Return: `ret`.
    Ret,
    /// Constant load into a register: `mov reg, imm`.
    MovImm {
        /// Destination register.
        dst: X86Register,
        /// Immediate value (a candidate code pointer).
        value: u64,
    },
    /// Register pushed onto the stack: `push reg`.
    PushReg {
        /// The pushed register.
        reg: X86Register,
    },
    /// Register popped off the stack: `pop reg`.
    PopReg {
        /// The destination register.
        dst: X86Register,
    },
    /// Any instruction not participating in detection.
    Other,
}

/// A decoded x86 instruction with its location metadata.
///
/// Instructions are ephemeral: they live in the arena produced by one
/// decode-and-analyze pass and are never retained past it. Evidence bytes are
/// sliced from the caller's code buffer by address arithmetic, so the arena
/// holds no copies of the machine code.
#[derive(Debug, Clone)]
pub struct DecodedInstruction {
    /// Virtual address of the instruction.
    pub address: u64,
    /// Length of the encoded instruction in bytes (1-15 for x86).
    pub length: usize,
    /// The classified operation.
    pub operation: Operation,
}

impl DecodedInstruction {
    /// Returns the address immediately after this instruction.
    #[inline]
    #[must_use]
    pub fn end_address(&self) -> u64 {
        self.address + self.length as u64
    }
}

/// The contiguous virtual-address span occupied by a loaded module.
///
/// Acts as the trust boundary for target-address validation: any control
/// transfer resolving outside `[base, base + size)` is reported as a hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModuleRange {
    /// Inclusive start address of the module image.
    pub base: u64,
    /// Size of the image in bytes.
    pub size: u64,
}

impl ModuleRange {
    /// Creates a new module range covering `[base, base + size)`.
    #[must_use]
    pub fn new(base: u64, size: u64) -> Self {
        Self { base, size }
    }

    /// Returns the exclusive end address of the module image.
    ///
    /// Saturates at `u64::MAX` for a degenerate range at the top of the
    /// address space.
    #[inline]
    #[must_use]
    pub fn end(&self) -> u64 {
        self.base.saturating_add(self.size)
    }

    /// Returns true if `address` lies within the module image.
    ///
    /// A zero-size range contains nothing.
    #[inline]
    #[must_use]
    pub fn contains(&self, address: u64) -> bool {
        address >= self.base && address < self.end()
    }
}

/// The redirection pattern a detected hook uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookKind {
    /// `jmp imm` straight out of the module.
    DirectJump,
    /// `call imm` straight out of the module.
    DirectCall,
    /// `mov reg, imm` followed by `jmp reg` / `call reg`.
    RegisterIndirect,
    /// The target staged through the stack: `mov`; `push`; ...; `pop`; branch.
    StackStaged,
    /// The target pushed for a `ret` to pop: `mov`; `push`; ...; `ret`.
    ReturnRedirect,
}

/// Evidence for a detected hook.
///
/// Returned by [`analyze_fn_hook_presence`](crate::analyze_fn_hook_presence)
/// when a function contains a control transfer resolving outside its module.
/// The descriptor is an owned value; dropping it releases the evidence bytes.
///
/// # Invariants
///
/// `hook_length` is the byte distance from `hook_address` through the end of
/// the triggering control-transfer instruction, and
/// `hook_data.len() == hook_length`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookDescriptor {
    /// The redirection pattern.
    pub kind: HookKind,
    /// Address of the instruction establishing the redirection.
    ///
    /// For indirect hooks this is the constant load feeding the branch, which
    /// may lie well before the control transfer itself.
    pub hook_address: u64,
    /// Byte span from `hook_address` through the end of the triggering
    /// instruction.
    pub hook_length: usize,
    /// Raw machine code copied from the hook span.
    pub hook_data: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_aliasing() {
        assert!(X86Register::Eax.aliases(X86Register::Rax));
        assert!(X86Register::Rax.aliases(X86Register::Rax));
        assert!(!X86Register::Eax.aliases(X86Register::Rcx));
        assert!(!X86Register::R8.aliases(X86Register::Rax));
    }

    #[test]
    fn test_module_range_is_half_open() {
        let module = ModuleRange::new(0x40_0000, 0x1000);
        assert!(module.contains(0x40_0000));
        assert!(module.contains(0x40_0fff));
        assert!(!module.contains(0x40_1000));
        assert!(!module.contains(0x3f_ffff));
    }

    #[test]
    fn test_zero_size_range_contains_nothing() {
        let module = ModuleRange::new(0x40_0000, 0);
        assert!(!module.contains(0x40_0000));
    }

    #[test]
    fn test_range_at_top_of_address_space() {
        // base + size overflows; end() saturates instead of panicking.
        let module = ModuleRange::new(u64::MAX - 0xfff, 0x2000);
        assert_eq!(module.end(), u64::MAX);
        assert!(module.contains(u64::MAX - 1));
        assert!(!module.contains(0));
    }

    #[test]
    fn test_end_address_follows_length() {
        let instr = DecodedInstruction {
            address: 0x1000,
            length: 5,
            operation: Operation::Other,
        };
        assert_eq!(instr.end_address(), 0x1005);
    }
}
