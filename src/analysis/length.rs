//! Function boundary analysis.
//!
//! Compilers pad the gap between functions with `int3` (`0xCC`) bytes. The
//! boundary analyzer walks forward from a function's entry, one instruction
//! at a time, until it reaches a back-to-back pair of trap bytes. The live
//! code length it returns is what bounds a subsequent hook scan.

use crate::analysis::decoder::decode_single;

/// The 2-byte padding marker ending a function's live code: two consecutive
/// `int3` breakpoint opcodes.
pub const TRAP_MARKER: [u8; 2] = [0xCC, 0xCC];

/// Hard cap on how many bytes a single boundary walk may cover.
///
/// A region with no reachable trap padding would otherwise be scanned until
/// the slice runs out; the cap turns that into a best-effort length.
pub const MAX_SCAN_BYTES: usize = 4096;

/// Determine how many bytes of live code precede the trap padding.
///
/// * `code` - bytes starting at the function entry, as many as the caller can
///   supply.
/// * `bitness` - 32 or 64.
/// * `address` - virtual address of `code[0]`.
///
/// Walks instruction by instruction, accumulating sizes, until the two bytes
/// at the cursor equal [`TRAP_MARKER`]. The marker is checked at instruction
/// boundaries only, so a lone `int3` inside live code decodes as a regular
/// 1-byte instruction and is stepped over; nothing short of a back-to-back
/// pair ends the scan.
///
/// The walk never fails. Undecodable bytes, the end of the slice, and the
/// [`MAX_SCAN_BYTES`] cap all stop it, returning the length accumulated so
/// far as a best-effort result. The result never exceeds the cap; an
/// instruction that would straddle it is not counted.
///
/// # Example
///
/// ```rust
/// use hookscope::analyze_fn_length;
///
/// let code = [
///     0xb8, 0x05, 0x00, 0x00, 0x00, // mov eax, 5
///     0xc3, // ret
///     0xcc, 0xcc, // padding
/// ];
/// assert_eq!(analyze_fn_length(&code, 32, 0x40_1000), 6);
/// ```
#[must_use]
pub fn analyze_fn_length(code: &[u8], bitness: u32, address: u64) -> usize {
    let mut total = 0usize;

    while total < code.len() && total < MAX_SCAN_BYTES {
        if code[total..].starts_with(&TRAP_MARKER) {
            break;
        }

        let Ok(instr) = decode_single(code, bitness, address, total) else {
            break;
        };
        // an instruction straddling the cap is not counted
        if total + instr.length > MAX_SCAN_BYTES {
            break;
        }
        total += instr.length;
    }

    total
}
