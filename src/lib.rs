#![doc(html_root_url = "https://docs.rs/eventwire/latest")]
//! Public API for the `eventwire` library.
//!
//! This crate decodes the self-describing binary event-stream framing
//! carried by a long-lived streaming HTTP response body into typed domain
//! events for a conversational client. It owns exactly two concerns: the
//! incremental, chunk-boundary-agnostic frame decoder and the
//! classification of validated frames into [`DomainEvent`] values.
//! Establishing the upstream connection and re-emitting events to the
//! client are collaborators outside this crate.

pub mod byte_order;
pub mod checksum;
pub mod classify;
pub mod codec;
pub mod error;
pub mod frame;
pub mod stream;

pub use classify::{ClassifyError, DomainEvent, classify_frame};
pub use codec::{
    DecodeError,
    EventStreamDecoder,
    FramingError,
    HeaderError,
    TruncationError,
    decode_frame,
};
pub use error::EventStreamError;
pub use frame::{Frame, Header, HeaderValue};
pub use stream::{EventStream, FrameStream};
