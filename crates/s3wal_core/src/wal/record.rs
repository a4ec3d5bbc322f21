//! Records and their frame encoding.

use crate::error::{WalError, WalResult};
use sha2::{Digest, Sha256};

/// Size of the big-endian offset at the start of a frame.
pub const OFFSET_SIZE: usize = 8;

/// Size of the SHA-256 digest at the end of a frame.
pub const CHECKSUM_SIZE: usize = 32;

/// Smallest valid frame: an offset, an empty payload and a digest.
pub const MIN_FRAME_SIZE: usize = OFFSET_SIZE + CHECKSUM_SIZE;

/// A committed log record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    offset: u64,
    payload: Vec<u8>,
}

impl Record {
    /// Creates a record.
    #[must_use]
    pub fn new(offset: u64, payload: Vec<u8>) -> Self {
        Self { offset, payload }
    }

    /// Returns the offset of the record.
    #[must_use]
    pub const fn offset(&self) -> u64 {
        self.offset
    }

    /// Returns the payload bytes.
    #[must_use]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Consumes the record, returning its payload.
    #[must_use]
    pub fn into_payload(self) -> Vec<u8> {
        self.payload
    }

    /// Encodes the record as a frame.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        encode_frame(self.offset, &self.payload)
    }
}

/// Encodes `payload` at `offset` as a frame.
#[must_use]
pub fn encode_frame(offset: u64, payload: &[u8]) -> Vec<u8> {
    let mut frame = Vec::with_capacity(OFFSET_SIZE + payload.len() + CHECKSUM_SIZE);
    frame.extend_from_slice(&offset.to_be_bytes());
    frame.extend_from_slice(payload);
    let digest = Sha256::digest(&frame);
    frame.extend_from_slice(&digest);
    frame
}

/// Decodes and checksums a frame.
///
/// The returned record carries the offset stored in the frame. Whether that
/// is the offset the frame was fetched for is for the caller to check.
///
/// # Errors
///
/// - [`WalError::FrameTooShort`] if the frame is under [`MIN_FRAME_SIZE`] bytes
/// - [`WalError::ChecksumMismatch`] if the digest does not cover the contents
pub fn decode_frame(frame: &[u8]) -> WalResult<Record> {
    if frame.len() < MIN_FRAME_SIZE {
        return Err(WalError::FrameTooShort { len: frame.len() });
    }

    let (body, stored) = frame.split_at(frame.len() - CHECKSUM_SIZE);
    let computed = Sha256::digest(body);
    if computed.as_slice() != stored {
        return Err(WalError::ChecksumMismatch {
            expected: to_hex(stored),
            actual: to_hex(&computed),
        });
    }

    let (offset_bytes, payload) = body.split_at(OFFSET_SIZE);
    let offset = u64::from_be_bytes(
        offset_bytes
            .try_into()
            .map_err(|_| WalError::FrameTooShort { len: frame.len() })?,
    );

    Ok(Record {
        offset,
        payload: payload.to_vec(),
    })
}

fn to_hex(bytes: &[u8]) -> String {
    use std::fmt::Write;
    bytes.iter().fold(String::with_capacity(bytes.len() * 2), |mut out, b| {
        let _ = write!(out, "{b:02x}");
        out
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn frame_layout() {
        let frame = encode_frame(7, b"hello");
        assert_eq!(frame.len(), OFFSET_SIZE + 5 + CHECKSUM_SIZE);
        assert_eq!(&frame[..8], &[0, 0, 0, 0, 0, 0, 0, 7]);
        assert_eq!(&frame[8..13], b"hello");
        assert_eq!(&frame[13..], Sha256::digest(&frame[..13]).as_slice());
    }

    #[test]
    fn empty_payload_is_minimum_frame() {
        let frame = encode_frame(1, b"");
        assert_eq!(frame.len(), MIN_FRAME_SIZE);

        let record = decode_frame(&frame).unwrap();
        assert_eq!(record.offset(), 1);
        assert!(record.payload().is_empty());
    }

    #[test]
    fn known_digest() {
        // SHA-256 of 00 00 00 00 00 00 00 01
        let frame = encode_frame(1, b"");
        assert_eq!(
            to_hex(&frame[8..]),
            "cd2662154e6d76b2b2b92e70c0cac3ccf534f9b74eb5b89819ec509083d00a50"
        );
    }

    #[test]
    fn too_short_rejected() {
        for len in [0, 1, 8, MIN_FRAME_SIZE - 1] {
            let result = decode_frame(&vec![0u8; len]);
            assert!(matches!(result, Err(WalError::FrameTooShort { len: l }) if l == len));
        }
    }

    #[test]
    fn tampered_offset_detected() {
        let mut frame = encode_frame(3, b"payload");
        frame[7] ^= 0x01;
        assert!(matches!(
            decode_frame(&frame),
            Err(WalError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn truncated_frame_detected() {
        let frame = encode_frame(3, b"payload");
        assert!(matches!(
            decode_frame(&frame[..frame.len() - 1]),
            Err(WalError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn record_encode_matches_free_function() {
        let record = Record::new(9, b"abc".to_vec());
        assert_eq!(record.encode(), encode_frame(9, b"abc"));
        assert_eq!(record.clone().into_payload(), b"abc");
    }

    proptest! {
        #[test]
        fn roundtrip(offset in 1u64.., payload in prop::collection::vec(any::<u8>(), 0..512)) {
            let record = decode_frame(&encode_frame(offset, &payload)).unwrap();
            prop_assert_eq!(record.offset(), offset);
            prop_assert_eq!(record.payload(), payload.as_slice());
        }

        #[test]
        fn any_bit_flip_detected(
            payload in prop::collection::vec(any::<u8>(), 0..128),
            position in any::<prop::sample::Index>(),
            bit in 0u8..8,
        ) {
            let mut frame = encode_frame(5, &payload);
            let i = position.index(frame.len());
            frame[i] ^= 1 << bit;
            let is_checksum_mismatch =
                matches!(decode_frame(&frame), Err(WalError::ChecksumMismatch { .. }));
            prop_assert!(is_checksum_mismatch);
        }
    }
}
