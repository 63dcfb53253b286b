//! x86/x64 instruction decoding using iced-x86.
//!
//! This module is a thin wrapper around iced-x86 that classifies its
//! instruction representation into the closed [`Operation`] set the detector
//! dispatches on. Decoding is always performed over a caller-supplied byte
//! slice with an explicit virtual address, so branch targets come out as
//! absolute addresses directly comparable against a module range.

use crate::{
    analysis::types::{BranchKind, DecodedInstruction, Operation, X86Register},
    Error, Result,
};
use iced_x86::{Decoder, DecoderOptions, Instruction, Mnemonic, OpKind, Register};

/// Decode a full scan window into an ordered instruction arena.
///
/// Instructions are decoded sequentially from the start of `code` with
/// `address` as the virtual address of the first byte. Decoding does **not**
/// stop at `ret`: hook scanning covers the entire window.
///
/// An undecodable instruction ends the arena early rather than failing: the
/// caller's byte budget may cut the final instruction in half, and everything
/// decoded up to that point is still analyzable.
///
/// # Errors
///
/// Returns [`Error::Empty`] for an empty slice and [`Error::InvalidBitness`]
/// if `bitness` is not 32 or 64.
pub fn decode_function(code: &[u8], bitness: u32, address: u64) -> Result<Vec<DecodedInstruction>> {
    if code.is_empty() {
        return Err(Error::Empty);
    }
    if bitness != 32 && bitness != 64 {
        return Err(Error::InvalidBitness(bitness));
    }

    let mut decoder = Decoder::with_ip(bitness, code, address, DecoderOptions::NONE);
    let mut instructions = Vec::new();

    for instr in &mut decoder {
        if instr.is_invalid() {
            break;
        }

        instructions.push(DecodedInstruction {
            address: instr.ip(),
            length: instr.len(),
            operation: classify(&instr),
        });
    }

    Ok(instructions)
}

/// Decode a single instruction at `offset` within `code`.
///
/// Used by the boundary analyzer's step loop, where the next cursor position
/// depends on the length of the instruction just decoded.
///
/// # Errors
///
/// Returns [`Error::Empty`] for an empty slice, [`Error::InvalidBitness`] if
/// `bitness` is not 32 or 64, [`Error::OutOfBounds`] if `offset` is past the
/// end of `code`, and [`Error::InvalidInstruction`] if the bytes at `offset`
/// do not form a valid instruction.
pub fn decode_single(
    code: &[u8],
    bitness: u32,
    address: u64,
    offset: usize,
) -> Result<DecodedInstruction> {
    if code.is_empty() {
        return Err(Error::Empty);
    }
    if bitness != 32 && bitness != 64 {
        return Err(Error::InvalidBitness(bitness));
    }
    if offset >= code.len() {
        return Err(Error::OutOfBounds);
    }

    let ip = address + offset as u64;
    let mut decoder = Decoder::with_ip(bitness, &code[offset..], ip, DecoderOptions::NONE);
    let instr = decoder.decode();

    if instr.is_invalid() {
        return Err(Error::InvalidInstruction(offset as u64));
    }

    Ok(DecodedInstruction {
        address: ip,
        length: instr.len(),
        operation: classify(&instr),
    })
}

/// Classify an iced-x86 instruction into the detection operation set.
fn classify(instr: &Instruction) -> Operation {
    match instr.mnemonic() {
        Mnemonic::Jmp => classify_branch(instr, BranchKind::Jmp),
        Mnemonic::Call => classify_branch(instr, BranchKind::Call),
        Mnemonic::Ret | Mnemonic::Retf => Operation::Ret,
        Mnemonic::Mov => classify_mov(instr),
        Mnemonic::Push => match register_operand(instr) {
            Some(reg) => Operation::PushReg { reg },
            None => Operation::Other,
        },
        Mnemonic::Pop => match register_operand(instr) {
            Some(dst) => Operation::PopReg { dst },
            None => Operation::Other,
        },
        _ => Operation::Other,
    }
}

/// Classify a `jmp`/`call`.
///
/// Memory-indirect and far branches are not representable in the operand
/// model (immediate or register only) and classify as [`Operation::Other`].
fn classify_branch(instr: &Instruction, kind: BranchKind) -> Operation {
    match instr.op0_kind() {
        OpKind::NearBranch16 => Operation::BranchImm {
            kind,
            target: u64::from(instr.near_branch16()),
        },
        OpKind::NearBranch32 => Operation::BranchImm {
            kind,
            target: u64::from(instr.near_branch32()),
        },
        OpKind::NearBranch64 => Operation::BranchImm {
            kind,
            target: instr.near_branch64(),
        },
        OpKind::Register => match convert_register(instr.op0_register()) {
            Some(reg) => Operation::BranchReg { kind, reg },
            None => Operation::Other,
        },
        _ => Operation::Other,
    }
}

/// Classify a `mov`, keeping only direct constant loads into a full-width
/// register. Everything else (memory operands, register-to-register moves,
/// sub-register destinations) cannot feed a tracked branch target.
fn classify_mov(instr: &Instruction) -> Operation {
    if instr.op0_kind() != OpKind::Register {
        return Operation::Other;
    }
    let Some(dst) = convert_register(instr.op0_register()) else {
        return Operation::Other;
    };

    let value = match instr.op1_kind() {
        OpKind::Immediate32 => u64::from(instr.immediate32()),
        // mov r64, imm32 sign-extends; kernel-space addresses survive this
        OpKind::Immediate32to64 => instr.immediate32to64() as u64,
        OpKind::Immediate64 => instr.immediate64(),
        _ => return Operation::Other,
    };

    Operation::MovImm { dst, value }
}

/// Returns the sole register operand of a `push`/`pop`, if that is what the
/// instruction has.
fn register_operand(instr: &Instruction) -> Option<X86Register> {
    if instr.op0_kind() == OpKind::Register {
        convert_register(instr.op0_register())
    } else {
        None
    }
}

/// Convert an iced-x86 register to our representation.
///
/// Returns `None` for anything outside the 32/64-bit general-purpose set.
fn convert_register(reg: Register) -> Option<X86Register> {
    match reg {
        // 32-bit
        Register::EAX => Some(X86Register::Eax),
        Register::ECX => Some(X86Register::Ecx),
        Register::EDX => Some(X86Register::Edx),
        Register::EBX => Some(X86Register::Ebx),
        Register::ESP => Some(X86Register::Esp),
        Register::EBP => Some(X86Register::Ebp),
        Register::ESI => Some(X86Register::Esi),
        Register::EDI => Some(X86Register::Edi),

        // 64-bit
        Register::RAX => Some(X86Register::Rax),
        Register::RCX => Some(X86Register::Rcx),
        Register::RDX => Some(X86Register::Rdx),
        Register::RBX => Some(X86Register::Rbx),
        Register::RSP => Some(X86Register::Rsp),
        Register::RBP => Some(X86Register::Rbp),
        Register::RSI => Some(X86Register::Rsi),
        Register::RDI => Some(X86Register::Rdi),
        Register::R8 => Some(X86Register::R8),
        Register::R9 => Some(X86Register::R9),
        Register::R10 => Some(X86Register::R10),
        Register::R11 => Some(X86Register::R11),
        Register::R12 => Some(X86Register::R12),
        Register::R13 => Some(X86Register::R13),
        Register::R14 => Some(X86Register::R14),
        Register::R15 => Some(X86Register::R15),

        _ => None,
    }
}
