#![doc(html_no_source)]
#![deny(missing_docs)]

//! # hookscope
//!
//! A small, cross-platform library for detecting inline function hooks in
//! x86/x64 machine code. Built in pure Rust, `hookscope` decodes a function's
//! instruction stream and flags control transfers whose resolved target lies
//! outside the address span of the module that owns the function, the
//! signature of detours, trampolines, and other runtime redirection.
//!
//! ## Features
//!
//! - **Direct hook detection** - immediate `jmp`/`call` targets checked
//!   against the owning module's address range
//! - **Indirect hook detection** - backward data-flow resolution of
//!   register-indirect branches (`mov reg, imm` … `jmp reg`), including one
//!   level of stack staging (`push`/`pop`) and return-oriented redirection
//! - **Function boundary analysis** - determines how many bytes of a
//!   function are live code before `int3` trap padding
//! - **No process access required** - operates on caller-supplied byte
//!   slices and virtual addresses, so it works on memory dumps as well as
//!   live images
//!
//! ## Quick Start
//!
//! ```rust
//! use hookscope::{analyze_fn_hook_presence, ModuleRange};
//!
//! // A function prologue patched with `jmp 0x500000`, inspected as if it
//! // lived at 0x401000 inside a module spanning [0x400000, 0x410000).
//! let code = [0xe9, 0xfb, 0xef, 0x0f, 0x00, 0xc3];
//! let module = ModuleRange::new(0x40_0000, 0x1_0000);
//!
//! let hook = analyze_fn_hook_presence(&code, 32, 0x40_1000, code.len(), &module);
//! assert!(hook.is_some());
//! ```
//!
//! Absence of a hook is reported as `None`; a found hook is returned as an
//! owned [`HookDescriptor`] carrying the address, length, and raw bytes of
//! the redirecting instruction span.
//!
//! ## Architecture
//!
//! - [`analysis`] - instruction model, decoder wrapper, hook detector, and
//!   function boundary analyzer
//! - [`Error`] and [`Result`] - error handling for the decoding seam
//!
//! The crate performs no I/O and keeps no state between calls; every
//! operation runs to completion on the caller's thread.

mod error;

pub mod analysis;

pub use analysis::{
    analyze_fn_hook_presence, analyze_fn_length, HookDescriptor, HookKind, ModuleRange,
};
pub use error::{Error, Result};
