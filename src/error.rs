//! Canonical error surface for the crate.
//!
//! Event streams yield two kinds of failure with very different policies:
//! structural decode errors, which poison the length framing and terminate
//! the stream, and per-event classification errors, which are reported and
//! skipped. [`EventStreamError`] carries that distinction so consumers can
//! tell "stream ended cleanly" apart from "stream ended due to corruption".

use thiserror::Error;

use crate::classify::ClassifyError;
use crate::codec::DecodeError;

/// Top-level error yielded by an event stream.
#[derive(Debug, Error)]
pub enum EventStreamError {
    /// Structural decode or transport failure; the stream cannot continue.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// Per-event classification failure; decoding continues past it.
    #[error(transparent)]
    Classify(#[from] ClassifyError),
}

impl EventStreamError {
    /// Whether this error terminates the event stream.
    ///
    /// # Examples
    ///
    /// ```
    /// use eventwire::codec::{DecodeError, TruncationError};
    /// use eventwire::error::EventStreamError;
    ///
    /// let err = EventStreamError::from(DecodeError::from(TruncationError::MidPrelude {
    ///     buffered: 2,
    /// }));
    /// assert!(err.is_fatal());
    /// ```
    #[must_use]
    pub const fn is_fatal(&self) -> bool { matches!(self, Self::Decode(_)) }

    /// Error category as a string for logging.
    #[must_use]
    pub const fn error_type(&self) -> &'static str {
        match self {
            Self::Decode(err) => err.error_type(),
            Self::Classify(_) => "classify",
        }
    }
}
