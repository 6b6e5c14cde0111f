//! Error types for the frame decode layer.
//!
//! This module provides a structured taxonomy distinguishing framing errors
//! (frame geometry and checksum violations), header-block errors (malformed
//! typed headers inside an otherwise well-framed message), truncation (the
//! byte source ended mid-frame), and transport I/O errors.
//!
//! Every variant here is fatal to the stream: once a checksum or a declared
//! length has lied, the length framing of everything that follows can no
//! longer be trusted, so the decoder refuses to resynchronise. Non-fatal,
//! per-event failures live in [`crate::classify::ClassifyError`] instead.

use std::io;

use thiserror::Error;

/// Framing-level errors in a frame's fixed structure.
///
/// These cover the prelude, the declared lengths, and both CRC-32 checks.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FramingError {
    /// Input does not contain the declared number of frame bytes.
    #[error("frame size mismatch: expected {expected} bytes, got {actual}")]
    FrameSizeMismatch {
        /// Bytes the frame should span.
        expected: usize,
        /// Bytes actually supplied.
        actual: usize,
    },

    /// Declared total length exceeds the configured maximum.
    #[error("frame exceeds max length: {size} > {max}")]
    OversizedFrame {
        /// Total length declared by the prelude.
        size: usize,
        /// Maximum allowed frame length.
        max: usize,
    },

    /// Declared lengths cannot describe a well-formed frame.
    #[error("invalid frame length: total {total_length}, headers {headers_length}")]
    InvalidFrameLength {
        /// Declared total frame length.
        total_length: u32,
        /// Declared header block length.
        headers_length: u32,
    },

    /// CRC-32 over the two prelude length fields does not match.
    #[error("prelude checksum mismatch: expected {expected:#010x}, computed {actual:#010x}")]
    PreludeChecksumMismatch {
        /// Checksum carried by the prelude.
        expected: u32,
        /// Checksum recomputed from the length fields.
        actual: u32,
    },

    /// CRC-32 over the frame body does not match the trailing checksum.
    #[error("message checksum mismatch: expected {expected:#010x}, computed {actual:#010x}")]
    MessageChecksumMismatch {
        /// Checksum carried in the frame's last four bytes.
        expected: u32,
        /// Checksum recomputed over the preceding bytes.
        actual: u32,
    },
}

/// Errors decoding the typed header block of a frame.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum HeaderError {
    /// A header carried a value type tag outside the declared set.
    #[error("unknown header value type tag: {tag:#04x}")]
    UnknownType {
        /// Tag byte that was not recognised.
        tag: u8,
    },

    /// A header record's declared length reads past the end of the block.
    #[error("header record extends past the declared header block")]
    Truncated,

    /// A header name or string value was not valid UTF-8.
    #[error("header name or string value is not valid UTF-8")]
    InvalidUtf8,

    /// The declared header block does not fit inside the frame.
    #[error("header block length mismatch: declared {declared} bytes, {available} available")]
    BlockLengthMismatch {
        /// Header block length declared by the prelude.
        declared: usize,
        /// Bytes actually available between prelude and trailing checksum.
        available: usize,
    },
}

/// The byte source ended while a frame was still incomplete.
///
/// Partial data can never become a valid frame, so both variants are fatal;
/// they exist to report how far the final frame got.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum TruncationError {
    /// The source ended before the 4-byte total-length field completed.
    #[error("stream ended mid-prelude: {buffered} bytes buffered")]
    MidPrelude {
        /// Bytes buffered when the source ended.
        buffered: usize,
    },

    /// The source ended with a complete length field but an incomplete frame.
    #[error("stream ended mid-frame: {buffered} of {expected} bytes buffered")]
    MidFrame {
        /// Bytes buffered when the source ended.
        buffered: usize,
        /// Total frame length declared by the buffered prelude.
        expected: usize,
    },
}

/// Top-level decode error taxonomy.
///
/// # Examples
///
/// ```
/// use eventwire::codec::{DecodeError, FramingError};
///
/// let err = DecodeError::from(FramingError::OversizedFrame { size: 32, max: 16 });
/// assert_eq!(err.error_type(), "framing");
/// ```
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Frame geometry or checksum violation.
    #[error("framing error: {0}")]
    Framing(#[from] FramingError),

    /// Malformed typed header block.
    #[error("header error: {0}")]
    Header(#[from] HeaderError),

    /// Byte source exhausted mid-frame.
    #[error("truncated stream: {0}")]
    Truncated(#[from] TruncationError),

    /// Transport layer I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl DecodeError {
    /// Error category as a string for logging.
    ///
    /// One of: `"framing"`, `"header"`, `"truncated"`, or `"io"`.
    #[must_use]
    pub const fn error_type(&self) -> &'static str {
        match self {
            Self::Framing(_) => "framing",
            Self::Header(_) => "header",
            Self::Truncated(_) => "truncated",
            Self::Io(_) => "io",
        }
    }
}

impl From<DecodeError> for io::Error {
    fn from(err: DecodeError) -> Self {
        match err {
            DecodeError::Io(e) => e,
            DecodeError::Framing(e) => io::Error::new(io::ErrorKind::InvalidData, e),
            DecodeError::Header(e) => io::Error::new(io::ErrorKind::InvalidData, e),
            DecodeError::Truncated(e) => io::Error::new(io::ErrorKind::UnexpectedEof, e),
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
