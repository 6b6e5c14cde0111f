//! Symmetric frame encoder for unit and integration tests.
//!
//! Encoding is not part of the crate's contract (only decoding is), but
//! round-trip and chunk-invariance tests need to build bit-exact frames.
//! This module is compiled unconditionally and hidden from documentation to
//! avoid duplicating the wire format across test suites.

use std::io;

use bytes::{BufMut, Bytes, BytesMut};
use tokio_util::codec::Encoder;

use crate::byte_order::{write_network_u16, write_network_u32};
use crate::checksum;
use crate::frame::{Frame, Header, HeaderValue};

use super::{DecodeError, FRAME_OVERHEAD, FramingError, clamp_frame_length};

fn put_length_prefixed(dst: &mut BytesMut, value: &[u8]) -> Result<(), io::Error> {
    let len = u16::try_from(value.len())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "header value too long"))?;
    dst.put_slice(&write_network_u16(len));
    dst.put_slice(value);
    Ok(())
}

/// Encode one typed header record.
///
/// # Errors
///
/// Returns `InvalidInput` when the name exceeds 255 bytes or a string or
/// byte-array value exceeds the 16-bit length prefix.
pub fn encode_header(header: &Header, dst: &mut BytesMut) -> Result<(), io::Error> {
    let name_len = u8::try_from(header.name.len())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "header name too long"))?;
    dst.put_u8(name_len);
    dst.put_slice(header.name.as_bytes());
    dst.put_u8(header.value.type_tag());

    match &header.value {
        HeaderValue::BoolTrue | HeaderValue::BoolFalse => {}
        HeaderValue::Byte(value) => dst.put_i8(*value),
        HeaderValue::Short(value) => dst.put_i16(*value),
        HeaderValue::Int(value) => dst.put_i32(*value),
        HeaderValue::Long(value) | HeaderValue::Timestamp(value) => dst.put_i64(*value),
        HeaderValue::ByteArray(value) => put_length_prefixed(dst, value)?,
        HeaderValue::String(value) => put_length_prefixed(dst, value.as_bytes())?,
        HeaderValue::Uuid(value) => dst.put_slice(value),
    }
    Ok(())
}

/// Encode a complete frame: prelude, header block, payload, and both
/// checksums.
///
/// # Errors
///
/// Returns `InvalidInput` when a header cannot be represented on the wire
/// or the frame would overflow the 32-bit length fields.
pub fn encode_frame(frame: &Frame) -> Result<Bytes, io::Error> {
    let mut header_block = BytesMut::new();
    for header in frame.headers() {
        encode_header(header, &mut header_block)?;
    }

    let total = FRAME_OVERHEAD + header_block.len() + frame.payload().len();
    let total_length = u32::try_from(total)
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "frame too large"))?;
    let headers_length = u32::try_from(header_block.len())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "header block too large"))?;

    let mut buf = BytesMut::with_capacity(total);
    buf.put_slice(&write_network_u32(total_length));
    buf.put_slice(&write_network_u32(headers_length));
    let prelude_crc = checksum::crc32(&buf[..8]);
    buf.put_slice(&write_network_u32(prelude_crc));
    buf.put_slice(&header_block);
    buf.put_slice(frame.payload());
    let message_crc = checksum::crc32(&buf);
    buf.put_slice(&write_network_u32(message_crc));

    Ok(buf.freeze())
}

/// Encoder half mirroring [`super::EventStreamDecoder`], used to drive
/// codec round-trips in tests.
#[derive(Clone, Debug)]
pub struct EventStreamEncoder {
    max_frame_length: usize,
}

impl EventStreamEncoder {
    /// Construct an encoder with a maximum frame length.
    #[must_use]
    pub fn new(max_frame_length: usize) -> Self {
        Self {
            max_frame_length: clamp_frame_length(max_frame_length),
        }
    }
}

impl Default for EventStreamEncoder {
    fn default() -> Self {
        Self {
            max_frame_length: super::MAX_FRAME_LENGTH,
        }
    }
}

impl Encoder<Frame> for EventStreamEncoder {
    type Error = DecodeError;

    fn encode(&mut self, item: Frame, dst: &mut BytesMut) -> Result<(), DecodeError> {
        let encoded = encode_frame(&item)?;
        if encoded.len() > self.max_frame_length {
            return Err(FramingError::OversizedFrame {
                size: encoded.len(),
                max: self.max_frame_length,
            }
            .into());
        }
        dst.extend_from_slice(&encoded);
        Ok(())
    }
}
