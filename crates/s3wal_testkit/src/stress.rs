//! Stress helpers for concurrent writers.
//!
//! These helpers drive many handles against one namespace and check that
//! no offset is ever handed out twice.

use s3wal_core::{ObjectStore, Wal, WalConfig, WalStats};
use std::collections::BTreeMap;
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::{Duration, Instant};

/// Configuration for a stress run.
#[derive(Debug, Clone)]
pub struct StressConfig {
    /// Number of independent handles appending concurrently.
    pub writers: usize,
    /// Appends issued by each handle.
    pub appends_per_writer: usize,
    /// Size of each payload in bytes.
    pub payload_size: usize,
    /// Retry bound for each handle.
    pub max_append_retries: u32,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            writers: 4,
            appends_per_writer: 100,
            payload_size: 64,
            max_append_retries: 10_000,
        }
    }
}

/// Result of a stress run.
#[derive(Debug, Clone)]
pub struct StressResult {
    /// Offset claimed by each successful append, with the writer that claimed it.
    pub claimed: BTreeMap<u64, usize>,
    /// Appends that returned an error.
    pub failed: usize,
    /// Lost races across all writers.
    pub conflicts: u64,
    /// Wall time of the run.
    pub duration: Duration,
}

impl StressResult {
    /// Returns `true` if the claimed offsets are exactly `1..=n`.
    pub fn is_dense(&self) -> bool {
        self.claimed.keys().copied().eq(1..=self.claimed.len() as u64)
    }
}

/// Runs `config.writers` handles against `prefix` in `bucket` at once.
///
/// # Panics
///
/// Panics if two appends are handed the same offset or a writer thread panics.
pub fn run_concurrent_appends(
    store: Arc<dyn ObjectStore>,
    bucket: &str,
    prefix: &str,
    config: &StressConfig,
) -> StressResult {
    let barrier = Arc::new(Barrier::new(config.writers));
    let stats = Arc::new(WalStats::new());
    let wal_config = WalConfig::new().max_append_retries(config.max_append_retries);
    let start = Instant::now();

    let handles: Vec<_> = (0..config.writers)
        .map(|writer| {
            let wal = Wal::new(store.clone(), bucket, prefix, wal_config.clone())
                .with_observer(stats.clone());
            let barrier = Arc::clone(&barrier);
            let appends = config.appends_per_writer;
            let payload = vec![writer as u8; config.payload_size];
            thread::spawn(move || {
                barrier.wait();
                (0..appends)
                    .map(|_| wal.append(&payload).ok())
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut claimed = BTreeMap::new();
    let mut failed = 0;
    for (writer, handle) in handles.into_iter().enumerate() {
        for result in handle.join().expect("writer thread panicked") {
            match result {
                Some(offset) => {
                    let previous = claimed.insert(offset, writer);
                    assert!(previous.is_none(), "offset {offset} handed out twice");
                }
                None => failed += 1,
            }
        }
    }

    StressResult {
        claimed,
        failed,
        conflicts: stats.append_conflicts(),
        duration: start.elapsed(),
    }
}
