use thiserror::Error;

/// The generic Error type, which provides coverage for all errors this library
/// can potentially return.
///
/// Errors only surface at the decoding seam ([`crate::analysis::decode_function`]
/// and [`crate::analysis::decode_single`]). The detection entry points are
/// deliberately silent: a failed or empty decode means "nothing to analyze"
/// and is reported as the absence of a hook, never as an error.
#[derive(Error, Debug)]
pub enum Error {
    /// Empty input provided.
    ///
    /// Decoding was requested for a zero-length byte slice.
    #[error("Empty input provided!")]
    Empty,

    /// An unsupported bitness was requested.
    ///
    /// Only 32-bit and 64-bit x86 decoding is supported.
    #[error("Invalid bitness {0}, must be 32 or 64!")]
    InvalidBitness(u32),

    /// The bytes at the given offset do not decode to a valid instruction.
    #[error("Invalid instruction at offset 0x{0:x}!")]
    InvalidInstruction(u64),

    /// An out of bound access was attempted while decoding.
    ///
    /// The requested offset lies at or beyond the end of the supplied code
    /// slice.
    #[error("Out of Bound read would have occurred!")]
    OutOfBounds,
}

/// `Result<T, Error>`
///
/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
