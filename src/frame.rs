//! Decoded event-stream frame model.
//!
//! A [`Frame`] is one complete, validated message unit: its ordered typed
//! headers and its payload bytes. Frames are constructed once by the codec,
//! never mutated, and handed to classification immediately. The reserved
//! header names consumed downstream are exposed as constants together with
//! lookup accessors.

use bytes::Bytes;

/// Reserved header naming the application event a frame carries.
pub const EVENT_TYPE: &str = ":event-type";
/// Reserved header distinguishing normal events from exception frames.
pub const MESSAGE_TYPE: &str = ":message-type";
/// Reserved header describing the payload encoding. Informational only.
pub const CONTENT_TYPE: &str = ":content-type";

/// Typed value carried by one frame header.
///
/// The wire encoding is a one-byte type tag followed by a fixed-width value
/// for the numeric, timestamp, and UUID tags, or a two-byte big-endian
/// length prefix for byte arrays and strings. Only string headers appear in
/// observed traffic; the remaining tags are still decoded so unknown peers
/// cannot fail the stream with a legal header.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HeaderValue {
    /// Boolean `true`, encoded as the bare tag.
    BoolTrue,
    /// Boolean `false`, encoded as the bare tag.
    BoolFalse,
    /// Signed 8-bit integer.
    Byte(i8),
    /// Signed 16-bit integer.
    Short(i16),
    /// Signed 32-bit integer.
    Int(i32),
    /// Signed 64-bit integer.
    Long(i64),
    /// Opaque bytes with a 16-bit length prefix.
    ByteArray(Bytes),
    /// UTF-8 string with a 16-bit length prefix.
    String(String),
    /// Milliseconds since the Unix epoch.
    Timestamp(i64),
    /// 16-byte UUID.
    Uuid([u8; 16]),
}

impl HeaderValue {
    /// Wire tag identifying this value's type.
    #[must_use]
    pub const fn type_tag(&self) -> u8 {
        match self {
            Self::BoolTrue => 0,
            Self::BoolFalse => 1,
            Self::Byte(_) => 2,
            Self::Short(_) => 3,
            Self::Int(_) => 4,
            Self::Long(_) => 5,
            Self::ByteArray(_) => 6,
            Self::String(_) => 7,
            Self::Timestamp(_) => 8,
            Self::Uuid(_) => 9,
        }
    }

    /// Borrow the value as a string, if it is one.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(value) => Some(value),
            _ => None,
        }
    }

    /// Borrow the value as raw bytes (byte arrays and strings).
    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::ByteArray(value) => Some(value),
            Self::String(value) => Some(value.as_bytes()),
            _ => None,
        }
    }

    /// Read the value as a boolean, if it is one.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::BoolTrue => Some(true),
            Self::BoolFalse => Some(false),
            _ => None,
        }
    }

    /// Widen any integer-like value (including timestamps) to `i64`.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Byte(value) => Some(i64::from(*value)),
            Self::Short(value) => Some(i64::from(*value)),
            Self::Int(value) => Some(i64::from(*value)),
            Self::Long(value) | Self::Timestamp(value) => Some(*value),
            _ => None,
        }
    }
}

/// One decoded key/value header.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Header {
    /// Header name; at most 255 bytes of UTF-8 on the wire.
    pub name: String,
    /// Typed header value.
    pub value: HeaderValue,
}

impl Header {
    /// Construct a header from a name and value.
    #[must_use]
    pub fn new(name: impl Into<String>, value: HeaderValue) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// One complete decoded message unit.
///
/// Header insertion order is preserved. Names are not guaranteed unique;
/// the reserved names are expected at most once each and lookup returns the
/// first match.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    headers: Vec<Header>,
    payload: Bytes,
}

impl Frame {
    /// Assemble a frame from decoded parts.
    #[must_use]
    pub fn new(headers: Vec<Header>, payload: Bytes) -> Self { Self { headers, payload } }

    /// Ordered header sequence.
    #[must_use]
    pub fn headers(&self) -> &[Header] { &self.headers }

    /// Payload bytes between the header block and the trailing checksum.
    #[must_use]
    pub fn payload(&self) -> &[u8] { &self.payload }

    /// Consume the frame, returning its payload without copying.
    #[must_use]
    pub fn into_payload(self) -> Bytes { self.payload }

    /// Look up the first header with `name` (case-sensitive).
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&HeaderValue> {
        self.headers
            .iter()
            .find(|header| header.name == name)
            .map(|header| &header.value)
    }

    /// String value of the reserved `:event-type` header.
    #[must_use]
    pub fn event_type(&self) -> Option<&str> { self.header(EVENT_TYPE).and_then(HeaderValue::as_str) }

    /// String value of the reserved `:message-type` header.
    #[must_use]
    pub fn message_type(&self) -> Option<&str> {
        self.header(MESSAGE_TYPE).and_then(HeaderValue::as_str)
    }

    /// String value of the reserved `:content-type` header.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.header(CONTENT_TYPE).and_then(HeaderValue::as_str)
    }
}
