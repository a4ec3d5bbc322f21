//! Cross-implementation test vectors for the wire format.
//!
//! Any implementation reading or writing the same namespace must produce and
//! accept exactly these keys and frames.

use serde::{Deserialize, Serialize};

/// A frame test vector that can be shared across implementations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameVector {
    /// Unique identifier for this vector.
    pub id: String,
    /// Human-readable description.
    pub description: String,
    /// Prefix of the log.
    pub prefix: String,
    /// Offset of the record.
    pub offset: u64,
    /// Payload (hex-encoded).
    pub payload_hex: String,
    /// Expected object key.
    pub expected_key: String,
    /// Expected frame (hex-encoded).
    pub expected_frame_hex: String,
}

/// Frame and key encoding vectors.
pub fn frame_vectors() -> Vec<FrameVector> {
    vec![
        FrameVector {
            id: "frame_empty_payload".into(),
            description: "Smallest frame: offset 1, no payload".into(),
            prefix: "wal".into(),
            offset: 1,
            payload_hex: String::new(),
            expected_key: "wal/00000000000000000001".into(),
            expected_frame_hex: "0000000000000001\
                cd2662154e6d76b2b2b92e70c0cac3ccf534f9b74eb5b89819ec509083d00a50"
                .into(),
        },
        FrameVector {
            id: "frame_hello".into(),
            description: "ASCII payload at offset 2".into(),
            prefix: "wal".into(),
            offset: 2,
            payload_hex: "68656c6c6f".into(),
            expected_key: "wal/00000000000000000002".into(),
            expected_frame_hex: "000000000000000268656c6c6f\
                bcdef734051ae34f92a5a726d501c4628f5f048f0b1940bf0f4674429fda2f7a"
                .into(),
        },
        FrameVector {
            id: "frame_world".into(),
            description: "ASCII payload at offset 7".into(),
            prefix: "wal".into(),
            offset: 7,
            payload_hex: "776f726c64".into(),
            expected_key: "wal/00000000000000000007".into(),
            expected_frame_hex: "0000000000000007776f726c64\
                2fc1d581530ae7d2eb3f7409f26929d2562b9d4f3c7163d09f01b14c44022f3d"
                .into(),
        },
        FrameVector {
            id: "frame_nested_prefix".into(),
            description: "Offset past 2^16 under a nested prefix".into(),
            prefix: "tenant/logs".into(),
            offset: 1_000_000,
            payload_hex: "733377616c".into(),
            expected_key: "tenant/logs/00000000000001000000".into(),
            expected_frame_hex: "00000000000f4240733377616c\
                2f5ee8562fea9e004e0cc00d27e9c23725a64e040cee345fe64b90ba61573f45"
                .into(),
        },
        FrameVector {
            id: "frame_max_offset".into(),
            description: "Largest offset with binary payload".into(),
            prefix: "wal".into(),
            offset: u64::MAX,
            payload_hex: "00ff".into(),
            expected_key: "wal/18446744073709551615".into(),
            expected_frame_hex: "ffffffffffffffff00ff\
                b698771e6523f3d16ae3869011199683906ac2452a80334d59029257797d5921"
                .into(),
        },
    ]
}

/// Exports the frame vectors as JSON for other implementations.
pub fn export_vectors_json() -> String {
    serde_json::to_string_pretty(&frame_vectors()).expect("vectors serialize")
}

/// Decodes a lowercase hex string.
pub fn hex_decode(hex: &str) -> Option<Vec<u8>> {
    if hex.len() % 2 != 0 {
        return None;
    }
    (0..hex.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok())
        .collect()
}
