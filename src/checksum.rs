//! CRC-32 helpers for frame integrity checks.
//!
//! Every frame carries two CRC-32 values (standard IEEE polynomial): one
//! over the first eight prelude bytes and one over the whole frame body
//! preceding the trailing checksum field. These helpers are pure functions;
//! callers turn a mismatch into their own structured error.

/// Compute the CRC-32 of `bytes`.
///
/// # Examples
///
/// ```
/// use eventwire::checksum::crc32;
///
/// // Standard CRC-32 check value.
/// assert_eq!(crc32(b"123456789"), 0xCBF4_3926);
/// ```
#[must_use]
pub fn crc32(bytes: &[u8]) -> u32 { crc32fast::hash(bytes) }

/// Compare `expected` against the CRC-32 computed over `bytes`.
///
/// # Errors
///
/// Returns the computed value on mismatch so callers can report both sides.
pub fn verify(expected: u32, bytes: &[u8]) -> Result<(), u32> {
    let actual = crc32fast::hash(bytes);
    if actual == expected { Ok(()) } else { Err(actual) }
}
