//! Mapping between log offsets and object keys.
//!
//! Keys are `<prefix>/<offset>` with the offset rendered as a zero-padded
//! decimal of [`OFFSET_WIDTH`] digits. Every `u64` fits in that width, so the
//! lexicographic order a store lists keys in is the numeric order of offsets.

use crate::error::{WalError, WalResult};

/// Number of decimal digits in the offset part of a key.
pub const OFFSET_WIDTH: usize = 20;

/// Encodes and decodes the object keys of one log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyScheme {
    prefix: String,
    /// `prefix` followed by the separator; every key of the log starts with it.
    key_prefix: String,
}

impl KeyScheme {
    /// Creates a key scheme for the log living under `prefix`.
    ///
    /// # Panics
    ///
    /// Panics if `prefix` is empty or only whitespace. A log without a
    /// namespace would claim every object in the bucket.
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        assert!(!prefix.trim().is_empty(), "log prefix must not be blank");
        let key_prefix = format!("{prefix}/");
        Self { prefix, key_prefix }
    }

    /// Returns the log prefix.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Returns the prefix to list the log's objects with (`<prefix>/`).
    #[must_use]
    pub fn list_prefix(&self) -> &str {
        &self.key_prefix
    }

    /// Returns the key of the object holding `offset`.
    #[must_use]
    pub fn encode(&self, offset: u64) -> String {
        format!("{}{offset:0width$}", self.key_prefix, width = OFFSET_WIDTH)
    }

    /// Recovers the offset from a key produced by [`Self::encode`].
    ///
    /// # Errors
    ///
    /// Returns [`WalError::InvalidKey`] if the key lives outside the prefix,
    /// the remainder is not exactly [`OFFSET_WIDTH`] decimal digits, the value
    /// overflows `u64`, or it is the never-written offset 0.
    pub fn decode(&self, key: &str) -> WalResult<u64> {
        let digits = key
            .strip_prefix(self.key_prefix.as_str())
            .ok_or_else(|| WalError::invalid_key(key, "not under the log prefix"))?;

        if digits.len() != OFFSET_WIDTH || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(WalError::invalid_key(
                key,
                format!("expected {OFFSET_WIDTH} decimal digits"),
            ));
        }

        let offset: u64 = digits
            .parse()
            .map_err(|_| WalError::invalid_key(key, "offset exceeds the u64 range"))?;
        if offset == 0 {
            return Err(WalError::invalid_key(key, "offsets start at 1"));
        }
        Ok(offset)
    }
}
