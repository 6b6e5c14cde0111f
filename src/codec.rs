//! Event-stream frame decoding.
//!
//! The wire format is a self-describing binary framing: a fixed 12-byte
//! prelude (total length, header block length, and a CRC-32 over those two
//! fields), a variable-length block of typed key/value headers, the payload,
//! and a trailing CRC-32 over everything preceding it.
//!
//! ```text
//! Frame   := Prelude(12B) HeaderBlock(headers_length B) Payload MessageCrc(4B)
//! Prelude := TotalLength(u32 BE) HeadersLength(u32 BE) PreludeCrc(u32 BE)
//! Header  := NameLen(u8) Name(UTF-8) TypeTag(u8) Value(type-dependent)
//! ```
//!
//! [`decode_frame`] turns one contiguous frame image into a [`Frame`];
//! [`EventStreamDecoder`] extracts complete frames incrementally from a
//! growing buffer regardless of how the bytes were chunked in transit. Both
//! validate the prelude checksum, the frame geometry, and the trailing
//! message checksum before trusting any content.
//!
//! All errors here are fatal to the stream; see the [`error`] module.

use bytes::{Buf, Bytes, BytesMut};
use tokio_util::codec::Decoder;

use crate::byte_order::read_network_u32;
use crate::checksum;
use crate::frame::{Frame, Header, HeaderValue};

pub mod error;

#[doc(hidden)]
pub mod encode;

pub use error::{DecodeError, FramingError, HeaderError, TruncationError};

/// Fixed prelude size: two length fields plus their checksum.
pub const PRELUDE_LEN: usize = 12;

/// Size of the trailing message checksum.
pub const MESSAGE_CHECKSUM_LEN: usize = 4;

/// Fixed per-frame overhead: prelude plus trailing checksum.
pub const FRAME_OVERHEAD: usize = PRELUDE_LEN + MESSAGE_CHECKSUM_LEN;

/// Size of the leading total-length field peeked at by the incremental
/// decoder before a full prelude is buffered.
const TOTAL_LENGTH_FIELD: usize = 4;

/// Maximum frame length accepted by default (16 MiB).
///
/// Frame lengths passed to [`EventStreamDecoder::new`] are clamped to at
/// most this value to prevent unbounded buffering on a corrupt or hostile
/// length field.
pub const MAX_FRAME_LENGTH: usize = 16 * 1024 * 1024;

pub(crate) fn clamp_frame_length(value: usize) -> usize {
    value.clamp(FRAME_OVERHEAD, MAX_FRAME_LENGTH)
}

/// Read a big-endian `u32` at `offset`; caller guarantees the bounds.
fn read_u32_at(bytes: &[u8], offset: usize) -> u32 {
    let mut field = [0_u8; 4];
    field.copy_from_slice(&bytes[offset..offset + 4]);
    read_network_u32(field)
}

/// Validated lengths from a frame's fixed prelude.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Prelude {
    /// Total frame length in bytes, including prelude and trailing checksum.
    pub total_length: u32,
    /// Header block length in bytes.
    pub headers_length: u32,
}

impl Prelude {
    /// Parse and validate the 12-byte prelude at the start of `bytes`.
    ///
    /// The CRC-32 over the two length fields is checked before the lengths
    /// are trusted; only then is the declared geometry validated against
    /// `max_frame_length`.
    ///
    /// # Errors
    ///
    /// Returns [`FramingError::FrameSizeMismatch`] when fewer than 12 bytes
    /// are supplied, [`FramingError::PreludeChecksumMismatch`] when the
    /// prelude checksum fails, [`FramingError::OversizedFrame`] or
    /// [`FramingError::InvalidFrameLength`] for untrustworthy lengths, and
    /// [`HeaderError::BlockLengthMismatch`] when the declared header block
    /// cannot fit inside the declared frame.
    pub fn parse(bytes: &[u8], max_frame_length: usize) -> Result<Self, DecodeError> {
        let Some(prelude) = bytes.get(..PRELUDE_LEN) else {
            return Err(FramingError::FrameSizeMismatch {
                expected: PRELUDE_LEN,
                actual: bytes.len(),
            }
            .into());
        };

        let total_length = read_u32_at(prelude, 0);
        let headers_length = read_u32_at(prelude, 4);
        let expected_crc = read_u32_at(prelude, 8);
        checksum::verify(expected_crc, &prelude[..8]).map_err(|actual| {
            FramingError::PreludeChecksumMismatch {
                expected: expected_crc,
                actual,
            }
        })?;

        let total = total_length as usize;
        if total > max_frame_length {
            return Err(FramingError::OversizedFrame {
                size: total,
                max: max_frame_length,
            }
            .into());
        }
        if total < FRAME_OVERHEAD {
            return Err(FramingError::InvalidFrameLength {
                total_length,
                headers_length,
            }
            .into());
        }
        let available = total - FRAME_OVERHEAD;
        if headers_length as usize > available {
            return Err(HeaderError::BlockLengthMismatch {
                declared: headers_length as usize,
                available,
            }
            .into());
        }

        Ok(Self {
            total_length,
            headers_length,
        })
    }
}

fn ensure(buf: &Bytes, len: usize) -> Result<(), HeaderError> {
    if buf.remaining() < len {
        return Err(HeaderError::Truncated);
    }
    Ok(())
}

fn take_bytes(buf: &mut Bytes, len: usize) -> Result<Bytes, HeaderError> {
    ensure(buf, len)?;
    Ok(buf.split_to(len))
}

fn take_string(buf: &mut Bytes, len: usize) -> Result<String, HeaderError> {
    let raw = take_bytes(buf, len)?;
    let text = std::str::from_utf8(&raw).map_err(|_| HeaderError::InvalidUtf8)?;
    Ok(text.to_owned())
}

fn decode_header(buf: &mut Bytes) -> Result<Header, HeaderError> {
    ensure(buf, 1)?;
    let name_len = usize::from(buf.get_u8());
    let name = take_string(buf, name_len)?;

    ensure(buf, 1)?;
    let tag = buf.get_u8();
    let value = match tag {
        0 => HeaderValue::BoolTrue,
        1 => HeaderValue::BoolFalse,
        2 => {
            ensure(buf, 1)?;
            HeaderValue::Byte(buf.get_i8())
        }
        3 => {
            ensure(buf, 2)?;
            HeaderValue::Short(buf.get_i16())
        }
        4 => {
            ensure(buf, 4)?;
            HeaderValue::Int(buf.get_i32())
        }
        5 => {
            ensure(buf, 8)?;
            HeaderValue::Long(buf.get_i64())
        }
        6 => {
            ensure(buf, 2)?;
            let len = usize::from(buf.get_u16());
            HeaderValue::ByteArray(take_bytes(buf, len)?)
        }
        7 => {
            ensure(buf, 2)?;
            let len = usize::from(buf.get_u16());
            HeaderValue::String(take_string(buf, len)?)
        }
        8 => {
            ensure(buf, 8)?;
            HeaderValue::Timestamp(buf.get_i64())
        }
        9 => {
            ensure(buf, 16)?;
            let mut uuid = [0_u8; 16];
            buf.copy_to_slice(&mut uuid);
            HeaderValue::Uuid(uuid)
        }
        tag => return Err(HeaderError::UnknownType { tag }),
    };

    Ok(Header { name, value })
}

/// Decode the typed header block.
///
/// `block` must contain exactly the bytes declared by the prelude; records
/// are read until the block is exhausted.
///
/// # Errors
///
/// Returns a [`HeaderError`] when a record's declared length crosses the end
/// of the block, a type tag is unknown, or a name or string value is not
/// valid UTF-8.
pub fn decode_headers(mut block: Bytes) -> Result<Vec<Header>, HeaderError> {
    let mut headers = Vec::new();
    while block.has_remaining() {
        headers.push(decode_header(&mut block)?);
    }
    Ok(headers)
}

/// Decode one complete frame from `bytes`.
///
/// `bytes` must span exactly the frame's declared `total_length`. This is a
/// pure function: the same bytes always yield the same frame or the same
/// error, and nothing is read from or written to the outside world.
///
/// # Errors
///
/// Returns a [`DecodeError`] when the prelude checksum, frame geometry,
/// header block, or trailing message checksum is invalid, or when `bytes`
/// does not span the declared length.
pub fn decode_frame(bytes: &Bytes) -> Result<Frame, DecodeError> {
    let prelude = Prelude::parse(bytes, MAX_FRAME_LENGTH)?;
    let total = prelude.total_length as usize;
    if bytes.len() != total {
        return Err(FramingError::FrameSizeMismatch {
            expected: total,
            actual: bytes.len(),
        }
        .into());
    }

    let body_len = total - MESSAGE_CHECKSUM_LEN;
    let expected = read_u32_at(bytes, body_len);
    checksum::verify(expected, &bytes[..body_len]).map_err(|actual| {
        FramingError::MessageChecksumMismatch { expected, actual }
    })?;

    let headers_len = prelude.headers_length as usize;
    let header_block = bytes.slice(PRELUDE_LEN..PRELUDE_LEN + headers_len);
    let payload = bytes.slice(PRELUDE_LEN + headers_len..body_len);
    let headers = decode_headers(header_block)?;

    Ok(Frame::new(headers, payload))
}

/// Incremental decoder extracting complete frames from a growing buffer.
///
/// Implements [`tokio_util::codec::Decoder`]: with fewer than four buffered
/// bytes it asks for more input; otherwise it peeks the declared total
/// length, waits until that many bytes are buffered, then splits off exactly
/// one frame and validates it. Chunk boundaries carry no meaning: a frame
/// may span any number of reads and one read may carry several frames.
#[derive(Clone, Debug)]
pub struct EventStreamDecoder {
    max_frame_length: usize,
}

impl EventStreamDecoder {
    /// Construct a decoder with a maximum accepted frame length.
    #[must_use]
    pub fn new(max_frame_length: usize) -> Self {
        Self {
            max_frame_length: clamp_frame_length(max_frame_length),
        }
    }

    /// Maximum frame length this decoder will buffer.
    #[must_use]
    pub fn max_frame_length(&self) -> usize { self.max_frame_length }
}

impl Default for EventStreamDecoder {
    fn default() -> Self {
        Self {
            max_frame_length: MAX_FRAME_LENGTH,
        }
    }
}

impl Decoder for EventStreamDecoder {
    type Item = Frame;
    type Error = DecodeError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Frame>, DecodeError> {
        if src.len() < TOTAL_LENGTH_FIELD {
            return Ok(None);
        }
        let total = read_u32_at(src, 0) as usize;
        if total > self.max_frame_length {
            return Err(FramingError::OversizedFrame {
                size: total,
                max: self.max_frame_length,
            }
            .into());
        }
        if src.len() < total {
            return Ok(None);
        }

        let frame_bytes = src.split_to(total).freeze();
        let frame = decode_frame(&frame_bytes)?;
        tracing::trace!(
            total_length = total,
            headers = frame.headers().len(),
            payload_len = frame.payload().len(),
            "decoded frame"
        );
        Ok(Some(frame))
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Frame>, DecodeError> {
        match self.decode(src)? {
            Some(frame) => Ok(Some(frame)),
            None if src.is_empty() => Ok(None),
            None => {
                let err = build_truncation_error(src);
                tracing::debug!(error = %err, "byte source ended mid-frame");
                Err(err.into())
            }
        }
    }
}

/// Build the appropriate truncation error for a non-empty residue at
/// end-of-input.
///
/// With a complete length field the declared total is reported; otherwise
/// the source died before the framing of the final message was even known.
fn build_truncation_error(src: &BytesMut) -> TruncationError {
    let buffered = src.len();
    let expected = src
        .get(..TOTAL_LENGTH_FIELD)
        .and_then(|slice| <[u8; 4]>::try_from(slice).ok())
        .map(|bytes| read_network_u32(bytes) as usize);

    match expected {
        Some(expected) => TruncationError::MidFrame { buffered, expected },
        None => TruncationError::MidPrelude { buffered },
    }
}
