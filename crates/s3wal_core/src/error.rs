//! Error types for the log engine.

use thiserror::Error;

/// Result type for log operations.
pub type WalResult<T> = Result<T, WalError>;

/// Errors that can occur in log operations.
#[derive(Debug, Error)]
pub enum WalError {
    /// Object store error (transport, auth, throttling, local I/O).
    #[error("storage error: {0}")]
    Storage(#[from] s3wal_storage::StoreError),

    /// An object key under the log prefix does not follow the key scheme.
    #[error("invalid key {key:?}: {reason}")]
    InvalidKey {
        /// The offending key.
        key: String,
        /// Why it could not be decoded.
        reason: String,
    },

    /// A frame is shorter than the fixed offset and checksum fields.
    #[error("frame too short: {len} bytes, need at least {min}", min = crate::MIN_FRAME_SIZE)]
    FrameTooShort {
        /// Actual frame length.
        len: usize,
    },

    /// The stored SHA-256 does not match the frame contents.
    #[error("checksum mismatch: stored {expected}, computed {actual}")]
    ChecksumMismatch {
        /// Hex digest stored in the frame.
        expected: String,
        /// Hex digest computed over the frame.
        actual: String,
    },

    /// The frame under a key encodes a different offset than the key.
    #[error("offset mismatch: expected {expected}, frame holds {actual}")]
    OffsetMismatch {
        /// Offset implied by the key.
        expected: u64,
        /// Offset stored in the frame.
        actual: u64,
    },

    /// No record exists at the requested offset.
    #[error("no record at offset {offset}")]
    NotFound {
        /// The requested offset.
        offset: u64,
    },

    /// Every append attempt lost its create-if-absent race.
    #[error("append lost {attempts} races for offsets, last tried {last_offset}")]
    Contention {
        /// Number of conditional writes attempted.
        attempts: u32,
        /// The last candidate offset that was already taken.
        last_offset: u64,
    },

    /// The log holds no records.
    #[error("log is empty")]
    EmptyLog,

    /// The log length is already at the largest representable offset.
    #[error("offset space exhausted")]
    OffsetOverflow,
}

impl WalError {
    /// Creates an invalid key error.
    pub fn invalid_key(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidKey {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Returns `true` if the error means stored data cannot be trusted.
    ///
    /// Corruption errors are never retryable.
    #[must_use]
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            Self::InvalidKey { .. }
                | Self::FrameTooShort { .. }
                | Self::ChecksumMismatch { .. }
                | Self::OffsetMismatch { .. }
        )
    }

    /// Returns `true` if retrying the operation may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Storage(_) | Self::Contention { .. })
    }

    /// Returns `true` for outcomes callers routinely expect.
    #[must_use]
    pub(crate) fn is_expected(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::EmptyLog)
    }
}
