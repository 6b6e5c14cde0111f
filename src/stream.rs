//! Lazy stream adapters over an asynchronous byte-chunk source.
//!
//! [`FrameStream`] owns the one piece of long-lived mutable state in this
//! crate: the buffer of bytes received but not yet consumed into frames. It
//! is driven entirely by its consumer: it never blocks, holds no locks,
//! and suspends exactly when the buffer lacks a complete frame and the
//! source has nothing ready. [`EventStream`] layers classification on top,
//! yielding [`DomainEvent`] values.
//!
//! Both adapters are fused after a fatal error: the error is yielded once
//! and the stream then ends, so consumers can distinguish clean exhaustion
//! from corruption by whether the final item was an error.

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::{Bytes, BytesMut};
use futures::stream::Stream;
use tokio_util::codec::Decoder;

use crate::classify::{DomainEvent, classify_frame};
use crate::codec::{DecodeError, EventStreamDecoder};
use crate::error::EventStreamError;
use crate::frame::Frame;

/// Ordered frames decoded incrementally from a byte-chunk source.
///
/// Chunk boundaries carry no meaning: a frame may arrive split across any
/// number of chunks, several frames may arrive in one chunk, and
/// zero-length chunks are no-ops. A source that ends while bytes remain
/// buffered yields a truncation error rather than silently dropping them.
pub struct FrameStream<S> {
    source: S,
    decoder: EventStreamDecoder,
    buffer: BytesMut,
    source_done: bool,
    done: bool,
}

impl<S> FrameStream<S> {
    /// Wrap `source` with the default frame length limit.
    pub fn new(source: S) -> Self { Self::with_decoder(source, EventStreamDecoder::default()) }

    /// Wrap `source` with an explicitly configured decoder.
    pub fn with_decoder(source: S, decoder: EventStreamDecoder) -> Self {
        Self {
            source,
            decoder,
            buffer: BytesMut::new(),
            source_done: false,
            done: false,
        }
    }

    /// Bytes currently buffered awaiting a complete frame.
    #[must_use]
    pub fn buffered(&self) -> usize { self.buffer.len() }
}

impl<S> Stream for FrameStream<S>
where
    S: Stream<Item = io::Result<Bytes>> + Unpin,
{
    type Item = Result<Frame, DecodeError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.done {
            return Poll::Ready(None);
        }

        loop {
            if this.source_done {
                return match this.decoder.decode_eof(&mut this.buffer) {
                    Ok(Some(frame)) => Poll::Ready(Some(Ok(frame))),
                    Ok(None) => {
                        this.done = true;
                        Poll::Ready(None)
                    }
                    Err(err) => {
                        this.done = true;
                        Poll::Ready(Some(Err(err)))
                    }
                };
            }

            // Drain complete frames before asking the source for more.
            match this.decoder.decode(&mut this.buffer) {
                Ok(Some(frame)) => return Poll::Ready(Some(Ok(frame))),
                Ok(None) => {}
                Err(err) => {
                    this.done = true;
                    return Poll::Ready(Some(Err(err)));
                }
            }

            match Pin::new(&mut this.source).poll_next(cx) {
                Poll::Ready(Some(Ok(chunk))) => this.buffer.extend_from_slice(&chunk),
                Poll::Ready(Some(Err(err))) => {
                    this.done = true;
                    return Poll::Ready(Some(Err(err.into())));
                }
                Poll::Ready(None) => this.source_done = true,
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

/// Classified domain events decoded lazily from a byte-chunk source.
///
/// Fatal decode errors end the stream after being yielded once.
/// Classification errors are yielded inline and the stream continues with
/// the next frame.
pub struct EventStream<S> {
    frames: FrameStream<S>,
}

impl<S> EventStream<S> {
    /// Wrap `source` with the default frame length limit.
    pub fn new(source: S) -> Self {
        Self {
            frames: FrameStream::new(source),
        }
    }

    /// Wrap `source` with an explicitly configured decoder.
    pub fn with_decoder(source: S, decoder: EventStreamDecoder) -> Self {
        Self {
            frames: FrameStream::with_decoder(source, decoder),
        }
    }
}

impl<S> Stream for EventStream<S>
where
    S: Stream<Item = io::Result<Bytes>> + Unpin,
{
    type Item = Result<DomainEvent, EventStreamError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        match Pin::new(&mut this.frames).poll_next(cx) {
            Poll::Ready(Some(Ok(frame))) => {
                Poll::Ready(Some(classify_frame(frame).map_err(EventStreamError::from)))
            }
            Poll::Ready(Some(Err(err))) => Poll::Ready(Some(Err(err.into()))),
            Poll::Ready(None) => Poll::Ready(None),
            Poll::Pending => Poll::Pending,
        }
    }
}
