//! Generated properties for the incremental decoder.
//!
//! Two invariants hold for every valid frame sequence: how the bytes are
//! partitioned into chunks never changes the decoded output, and flipping
//! any single bit of a frame's header or payload region is caught by the
//! message checksum before any content is trusted.

use bytes::{Bytes, BytesMut};
use eventwire::codec::encode::encode_frame;
use eventwire::{
    DecodeError,
    EventStreamDecoder,
    Frame,
    FramingError,
    Header,
    HeaderValue,
    decode_frame,
};
use proptest::prelude::*;
use tokio_util::codec::Decoder;

fn arb_header_value() -> impl Strategy<Value = HeaderValue> {
    prop_oneof![
        Just(HeaderValue::BoolTrue),
        Just(HeaderValue::BoolFalse),
        any::<i8>().prop_map(HeaderValue::Byte),
        any::<i16>().prop_map(HeaderValue::Short),
        any::<i32>().prop_map(HeaderValue::Int),
        any::<i64>().prop_map(HeaderValue::Long),
        prop::collection::vec(any::<u8>(), 0..16)
            .prop_map(|bytes| HeaderValue::ByteArray(Bytes::from(bytes))),
        "[ -~]{0,16}".prop_map(HeaderValue::String),
        any::<i64>().prop_map(HeaderValue::Timestamp),
        any::<[u8; 16]>().prop_map(HeaderValue::Uuid),
    ]
}

fn arb_frame() -> impl Strategy<Value = Frame> {
    let header = ("[a-z:][a-z-]{0,11}", arb_header_value())
        .prop_map(|(name, value)| Header::new(name, value));
    (
        prop::collection::vec(header, 0..4),
        prop::collection::vec(any::<u8>(), 0..48),
    )
        .prop_map(|(headers, payload)| Frame::new(headers, Bytes::from(payload)))
}

/// Feed `chunks` through the incremental decoder, draining every complete
/// frame after each chunk, and assert the source ends at a frame boundary.
fn decode_chunked(chunks: &[Vec<u8>]) -> Vec<Frame> {
    let mut decoder = EventStreamDecoder::default();
    let mut buf = BytesMut::new();
    let mut frames = Vec::new();

    for chunk in chunks {
        buf.extend_from_slice(chunk);
        while let Some(frame) = decoder.decode(&mut buf).expect("decode should succeed") {
            frames.push(frame);
        }
    }
    assert!(
        matches!(decoder.decode_eof(&mut buf), Ok(None)),
        "a valid sequence must end at a frame boundary"
    );
    frames
}

proptest! {
    #[test]
    fn chunk_boundaries_never_affect_output(
        frames in prop::collection::vec(arb_frame(), 1..4),
        splits in prop::collection::vec(any::<prop::sample::Index>(), 0..8),
    ) {
        let mut image = Vec::new();
        for frame in &frames {
            let encoded = encode_frame(frame).expect("generated frames should encode");
            image.extend_from_slice(&encoded);
        }

        let mut points: Vec<usize> = splits
            .iter()
            .map(|index| index.index(image.len() + 1))
            .collect();
        points.sort_unstable();
        points.dedup();

        let mut chunks = Vec::new();
        let mut previous = 0;
        for point in points {
            chunks.push(image[previous..point].to_vec());
            previous = point;
        }
        chunks.push(image[previous..].to_vec());

        let chunked = decode_chunked(&chunks);
        let whole = decode_chunked(&[image]);
        prop_assert_eq!(&chunked, &frames);
        prop_assert_eq!(&whole, &frames);
    }

    #[test]
    fn single_bit_corruption_in_the_body_is_always_detected(
        frame in arb_frame(),
        position in any::<prop::sample::Index>(),
        bit in 0_u32..8,
    ) {
        let mut image = encode_frame(&frame)
            .expect("generated frames should encode")
            .to_vec();
        // Body region: everything between prelude and trailing checksum.
        let body_len = image.len() - 16;
        prop_assume!(body_len > 0);
        let offset = 12 + position.index(body_len);
        image[offset] ^= 1_u8 << bit;

        let err = decode_frame(&Bytes::from(image))
            .expect_err("corrupted body must be rejected");
        prop_assert!(
            matches!(
                err,
                DecodeError::Framing(FramingError::MessageChecksumMismatch { .. })
            ),
            "corrupted body must produce a MessageChecksumMismatch"
        );
    }
}
