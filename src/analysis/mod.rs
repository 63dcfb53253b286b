//! x86/x64 hook detection and function boundary analysis.
//!
//! # Architecture
//!
//! ```text
//! function bytes → decode (iced-x86) → Operation arena → detection scan
//! ```
//!
//! The module decodes machine code into a simplified instruction model
//! focused on the operations that participate in control-flow redirection,
//! then analyzes the decoded stream.
//!
//! # Components
//!
//! - [`Operation`], [`HookDescriptor`], [`ModuleRange`] - instruction model
//!   and detection results
//! - [`decode_function`] / [`decode_single`] - iced-x86 decoder wrapper
//! - [`analyze_fn_hook_presence`] - the hook detector
//! - [`analyze_fn_length`] - the function boundary analyzer
//!
//! # Detection model
//!
//! A hook is a control transfer whose resolved target lies outside the
//! owning module's address span. Three shapes are recognized:
//!
//! | Shape | Pattern | Resolution |
//! |-------|---------|------------|
//! | Direct | `jmp`/`call` imm | operand checked as-is |
//! | Register-indirect | `mov reg, imm` … `jmp reg` | backward scan for the nearest constant load |
//! | Stack-staged / return | `mov`; `push`; ... `pop`; branch (or `ret`) | one level of stack staging followed backward |
//!
//! The scan runs in forward address order and reports the first qualifying
//! instruction; deeper obfuscation than one `push`/`pop` round-trip is not
//! resolved.
//!
//! # Example
//!
//! ```rust
//! use hookscope::analysis::{analyze_fn_hook_presence, analyze_fn_length, ModuleRange};
//!
//! let code = [
//!     0xb8, 0x00, 0x00, 0x50, 0x00, // mov eax, 0x500000
//!     0xff, 0xe0, // jmp eax
//!     0xcc, 0xcc, // padding
//! ];
//! let module = ModuleRange::new(0x40_0000, 0x1_0000);
//!
//! let length = analyze_fn_length(&code, 32, 0x40_1000);
//! assert_eq!(length, 7);
//!
//! let hook = analyze_fn_hook_presence(&code, 32, 0x40_1000, length, &module);
//! assert!(hook.is_some());
//! ```

mod decoder;
mod hooks;
mod length;
mod types;

pub use decoder::{decode_function, decode_single};
pub use hooks::analyze_fn_hook_presence;
pub use length::{analyze_fn_length, MAX_SCAN_BYTES, TRAP_MARKER};
pub use types::{
    BranchKind, DecodedInstruction, HookDescriptor, HookKind, ModuleRange, Operation, X86Register,
};
