//! Log statistics and observability hooks.
//!
//! The engine never prints. It reports what happens through a
//! [`WalObserver`] that the embedding application owns.
//!
//! # Usage
//!
//! ```rust
//! use s3wal_core::{InMemoryObjectStore, Wal, WalConfig, WalStats};
//! use std::sync::Arc;
//!
//! let stats = Arc::new(WalStats::new());
//! let wal = Wal::new(Arc::new(InMemoryObjectStore::new()), "b", "wal", WalConfig::default())
//!     .with_observer(stats.clone());
//!
//! wal.append(b"hello").unwrap();
//! assert_eq!(stats.appends(), 1);
//! ```

use crate::error::WalError;
use std::sync::atomic::{AtomicU64, Ordering};

/// Receives events from a log handle.
///
/// Every method has an empty default, so implementors only override what
/// they care about. Callbacks run on the caller's thread, outside the
/// handle's lock, and must not block for long.
pub trait WalObserver: Send + Sync {
    /// A frame of `bytes` bytes was committed at `offset`.
    fn on_append_committed(&self, offset: u64, bytes: usize) {
        let _ = (offset, bytes);
    }

    /// Another writer already held `offset`; the append will retry.
    fn on_append_conflict(&self, offset: u64) {
        let _ = offset;
    }

    /// A frame of `bytes` bytes was read and validated at `offset`.
    fn on_read(&self, offset: u64, bytes: usize) {
        let _ = (offset, bytes);
    }

    /// Tail discovery found `offset` as the tail after scanning `keys` keys.
    fn on_tail_recovered(&self, offset: u64, keys: u64) {
        let _ = (offset, keys);
    }

    /// An operation failed. Not called for `NotFound` or `EmptyLog`.
    fn on_error(&self, error: &WalError) {
        let _ = error;
    }
}

/// Observer that ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl WalObserver for NoopObserver {}

/// Log statistics.
///
/// All counters are atomic and can be read while operations are in progress.
#[derive(Debug, Default)]
pub struct WalStats {
    appends: AtomicU64,
    append_conflicts: AtomicU64,
    bytes_written: AtomicU64,
    reads: AtomicU64,
    bytes_read: AtomicU64,
    tail_recoveries: AtomicU64,
    corruptions: AtomicU64,
    errors: AtomicU64,
}

impl WalStats {
    /// Creates a new stats instance.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of committed appends.
    pub fn appends(&self) -> u64 {
        self.appends.load(Ordering::Relaxed)
    }

    /// Returns the number of lost create-if-absent races.
    ///
    /// A steadily rising count means several writers share the namespace.
    pub fn append_conflicts(&self) -> u64 {
        self.append_conflicts.load(Ordering::Relaxed)
    }

    /// Returns the total frame bytes written.
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written.load(Ordering::Relaxed)
    }

    /// Returns the number of validated reads.
    pub fn reads(&self) -> u64 {
        self.reads.load(Ordering::Relaxed)
    }

    /// Returns the total frame bytes read.
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read.load(Ordering::Relaxed)
    }

    /// Returns the number of successful tail recoveries.
    pub fn tail_recoveries(&self) -> u64 {
        self.tail_recoveries.load(Ordering::Relaxed)
    }

    /// Returns the number of corruption errors seen.
    pub fn corruptions(&self) -> u64 {
        self.corruptions.load(Ordering::Relaxed)
    }

    /// Returns the total number of errors.
    pub fn errors(&self) -> u64 {
        self.errors.load(Ordering::Relaxed)
    }

    /// Returns a snapshot of all stats.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            appends: self.appends(),
            append_conflicts: self.append_conflicts(),
            bytes_written: self.bytes_written(),
            reads: self.reads(),
            bytes_read: self.bytes_read(),
            tail_recoveries: self.tail_recoveries(),
            corruptions: self.corruptions(),
            errors: self.errors(),
        }
    }
}

impl WalObserver for WalStats {
    fn on_append_committed(&self, _offset: u64, bytes: usize) {
        self.appends.fetch_add(1, Ordering::Relaxed);
        self.bytes_written.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    fn on_append_conflict(&self, _offset: u64) {
        self.append_conflicts.fetch_add(1, Ordering::Relaxed);
    }

    fn on_read(&self, _offset: u64, bytes: usize) {
        self.reads.fetch_add(1, Ordering::Relaxed);
        self.bytes_read.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    fn on_tail_recovered(&self, _offset: u64, _keys: u64) {
        self.tail_recoveries.fetch_add(1, Ordering::Relaxed);
    }

    fn on_error(&self, error: &WalError) {
        if error.is_corruption() {
            self.corruptions.fetch_add(1, Ordering::Relaxed);
        }
        self.errors.fetch_add(1, Ordering::Relaxed);
    }
}

/// A point-in-time snapshot of log statistics.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StatsSnapshot {
    /// Committed appends.
    pub appends: u64,
    /// Lost create-if-absent races.
    pub append_conflicts: u64,
    /// Frame bytes written.
    pub bytes_written: u64,
    /// Validated reads.
    pub reads: u64,
    /// Frame bytes read.
    pub bytes_read: u64,
    /// Successful tail recoveries.
    pub tail_recoveries: u64,
    /// Corruption errors.
    pub corruptions: u64,
    /// All errors.
    pub errors: u64,
}
