//! Log handle configuration.

/// Configuration for a log handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalConfig {
    /// How many times an append retries after losing the race for an offset.
    ///
    /// An append makes at most `max_append_retries + 1` conditional writes
    /// before giving up with [`crate::WalError::Contention`].
    pub max_append_retries: u32,
}

impl Default for WalConfig {
    fn default() -> Self {
        Self {
            max_append_retries: 16,
        }
    }
}

impl WalConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the retry bound for lost append races.
    #[must_use]
    pub const fn max_append_retries(mut self, retries: u32) -> Self {
        self.max_append_retries = retries;
        self
    }

    /// Returns the maximum number of conditional writes one append may issue.
    #[must_use]
    pub const fn max_append_attempts(&self) -> u32 {
        self.max_append_retries.saturating_add(1)
    }
}
