//! End-to-end decoding scenarios over asynchronous byte-chunk sources.
//!
//! These drive [`FrameStream`] and [`EventStream`] the way the response
//! re-emitter does: feed chunks of an upstream HTTP body, pull a lazy
//! sequence of classified events, and rely on the final item to tell a
//! clean end from corruption.

use std::io;

use async_stream::stream;
use bytes::Bytes;
use eventwire::codec::encode::encode_frame;
use eventwire::{
    DecodeError,
    DomainEvent,
    EventStream,
    EventStreamError,
    Frame,
    FrameStream,
    Header,
    HeaderValue,
    TruncationError,
};
use futures::StreamExt;
use rstest::rstest;

fn string_header(name: &str, value: &str) -> Header {
    Header::new(name, HeaderValue::String(value.to_owned()))
}

fn event_frame(event_type: &str, payload: &str) -> Frame {
    Frame::new(
        vec![
            string_header(":message-type", "event"),
            string_header(":event-type", event_type),
            string_header(":content-type", "application/json"),
        ],
        Bytes::copy_from_slice(payload.as_bytes()),
    )
}

fn assistant_frame(text: &str) -> Frame {
    event_frame(
        "assistantResponseEvent",
        &format!(r#"{{"content":"{text}"}}"#),
    )
}

fn encoded(frame: &Frame) -> Bytes { encode_frame(frame).expect("encode should succeed") }

fn chunk_source(chunks: Vec<Bytes>) -> impl futures::Stream<Item = io::Result<Bytes>> + Unpin {
    futures::stream::iter(chunks.into_iter().map(Ok))
}

#[rstest]
#[tokio::test]
async fn four_frames_in_four_chunks_classify_in_order() {
    let chunks = vec![
        encoded(&event_frame(
            "initial-response",
            r#"{"conversationId":"test-123"}"#,
        )),
        encoded(&assistant_frame("Hi")),
        encoded(&assistant_frame("! I'm")),
        encoded(&assistant_frame(" Amazon Q")),
    ];

    let events: Vec<_> = EventStream::new(chunk_source(chunks))
        .map(|item| item.expect("all events should classify"))
        .collect()
        .await;

    assert_eq!(
        events,
        vec![
            DomainEvent::ConversationStarted {
                conversation_id: "test-123".to_owned(),
            },
            DomainEvent::AssistantTextDelta { text: "Hi".to_owned() },
            DomainEvent::AssistantTextDelta { text: "! I'm".to_owned() },
            DomainEvent::AssistantTextDelta { text: " Amazon Q".to_owned() },
        ]
    );
}

#[rstest]
#[tokio::test]
async fn one_frame_split_into_byte_sized_chunks_decodes_once() {
    let image = encoded(&assistant_frame("Hello, world!"));
    let chunks: Vec<Bytes> = image.iter().map(|&byte| Bytes::copy_from_slice(&[byte])).collect();

    let frames: Vec<_> = FrameStream::new(chunk_source(chunks))
        .map(|item| item.expect("decode should succeed"))
        .collect()
        .await;

    assert_eq!(frames, vec![assistant_frame("Hello, world!")]);
}

#[rstest]
#[tokio::test]
async fn multiple_frames_in_one_chunk_decode_in_order() {
    let mut image = Vec::new();
    image.extend_from_slice(&encoded(&assistant_frame("one")));
    image.extend_from_slice(&encoded(&assistant_frame("two")));
    image.extend_from_slice(&encoded(&assistant_frame("three")));

    let frames: Vec<_> = FrameStream::new(chunk_source(vec![Bytes::from(image)]))
        .map(|item| item.expect("decode should succeed"))
        .collect()
        .await;

    assert_eq!(
        frames,
        vec![
            assistant_frame("one"),
            assistant_frame("two"),
            assistant_frame("three"),
        ]
    );
}

#[rstest]
#[tokio::test]
async fn zero_length_chunks_are_no_ops() {
    let image = encoded(&assistant_frame("Hi"));
    let (head, tail) = image.split_at(7);
    let chunks = vec![
        Bytes::new(),
        Bytes::copy_from_slice(head),
        Bytes::new(),
        Bytes::copy_from_slice(tail),
        Bytes::new(),
    ];

    let frames: Vec<_> = FrameStream::new(chunk_source(chunks))
        .map(|item| item.expect("decode should succeed"))
        .collect()
        .await;

    assert_eq!(frames, vec![assistant_frame("Hi")]);
}

#[rstest]
#[tokio::test]
async fn chunks_arriving_asynchronously_decode_lazily() {
    let first = encoded(&assistant_frame("early"));
    let second = encoded(&assistant_frame("late"));

    // Split the second frame across two yields to cross a suspend point.
    let boundary = second.len() / 2;
    let source: std::pin::Pin<Box<dyn futures::Stream<Item = io::Result<Bytes>> + Send>> =
        Box::pin(stream! {
            yield Ok(first);
            tokio::task::yield_now().await;
            yield Ok(second.slice(..boundary));
            tokio::task::yield_now().await;
            yield Ok(second.slice(boundary..));
        });

    let frames: Vec<_> = FrameStream::new(source)
        .map(|item| item.expect("decode should succeed"))
        .collect()
        .await;

    assert_eq!(frames, vec![assistant_frame("early"), assistant_frame("late")]);
}

#[rstest]
#[tokio::test]
async fn empty_source_ends_cleanly() {
    let mut events = EventStream::new(chunk_source(Vec::new()));
    assert!(events.next().await.is_none());
}

#[rstest]
#[tokio::test]
async fn truncated_source_reports_fatal_error_then_ends() {
    // 5 bytes of a frame declaring 40 in its length field.
    let mut partial = 40_u32.to_be_bytes().to_vec();
    partial.push(0x01);

    let mut frames = FrameStream::new(chunk_source(vec![Bytes::from(partial)]));

    let err = frames
        .next()
        .await
        .expect("expected an item")
        .expect_err("expected truncation");
    assert!(matches!(
        err,
        DecodeError::Truncated(TruncationError::MidFrame {
            buffered: 5,
            expected: 40,
        })
    ));
    assert!(frames.next().await.is_none(), "stream should be fused after a fatal error");
}

#[rstest]
#[tokio::test]
async fn unknown_event_type_does_not_abort_the_stream() {
    let chunks = vec![
        encoded(&event_frame("futureEvent", r#"{"novel":"shape"}"#)),
        encoded(&assistant_frame("still here")),
    ];

    let events: Vec<_> = EventStream::new(chunk_source(chunks))
        .map(|item| item.expect("all items should classify"))
        .collect()
        .await;

    assert_eq!(events.len(), 2);
    assert!(matches!(events[0], DomainEvent::Unrecognized { .. }));
    assert_eq!(
        events[1],
        DomainEvent::AssistantTextDelta {
            text: "still here".to_owned(),
        }
    );
}

#[rstest]
#[tokio::test]
async fn malformed_payload_is_scoped_to_one_event() {
    let chunks = vec![
        encoded(&event_frame("assistantResponseEvent", "not json")),
        encoded(&assistant_frame("recovered")),
    ];

    let mut events = EventStream::new(chunk_source(chunks));

    let err = events
        .next()
        .await
        .expect("expected an item")
        .expect_err("expected a classification error");
    assert!(!err.is_fatal());
    assert_eq!(err.error_type(), "classify");

    let event = events
        .next()
        .await
        .expect("stream should continue past the bad payload")
        .expect("second frame should classify");
    assert_eq!(
        event,
        DomainEvent::AssistantTextDelta {
            text: "recovered".to_owned(),
        }
    );
    assert!(events.next().await.is_none());
}

#[rstest]
#[tokio::test]
async fn upstream_exception_frame_becomes_upstream_error() {
    let frame = Frame::new(
        vec![
            string_header(":message-type", "exception"),
            string_header(":content-type", "application/json"),
        ],
        Bytes::from_static(br#"{"message":"rate limited"}"#),
    );

    let events: Vec<_> = EventStream::new(chunk_source(vec![encoded(&frame)]))
        .map(|item| item.expect("exception frames should classify"))
        .collect()
        .await;

    assert_eq!(
        events,
        vec![DomainEvent::UpstreamError {
            message: "rate limited".to_owned(),
        }]
    );
}

#[rstest]
#[tokio::test]
async fn corruption_mid_stream_yields_prior_events_then_fatal_error() {
    let good = encoded(&assistant_frame("good"));
    let mut bad = encoded(&assistant_frame("bad")).to_vec();
    let payload_offset = bad.len() - 6;
    bad[payload_offset] ^= 0x40;

    let mut image = good.to_vec();
    image.extend_from_slice(&bad);

    let mut events = EventStream::new(chunk_source(vec![Bytes::from(image)]));

    let first = events
        .next()
        .await
        .expect("expected the intact frame")
        .expect("intact frame should classify");
    assert_eq!(
        first,
        DomainEvent::AssistantTextDelta {
            text: "good".to_owned(),
        }
    );

    let err = events
        .next()
        .await
        .expect("expected a fatal item")
        .expect_err("corrupted frame should fail");
    assert!(err.is_fatal());
    assert!(matches!(err, EventStreamError::Decode(_)));

    assert!(events.next().await.is_none(), "stream should end after corruption");
}
