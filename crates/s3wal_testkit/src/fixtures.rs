//! Test fixtures and log helpers.
//!
//! Provides convenience constructors for logs over throwaway stores.

use s3wal_core::{FileObjectStore, InMemoryObjectStore, ObjectStore, Wal, WalConfig};
use std::sync::Arc;
use tempfile::TempDir;

/// Bucket used by every fixture.
pub const TEST_BUCKET: &str = "test-bucket";

/// Prefix used by every fixture.
pub const TEST_PREFIX: &str = "wal";

/// A test log with automatic cleanup.
pub struct TestLog {
    /// The log handle.
    pub wal: Wal,
    /// The store behind the handle.
    pub store: Arc<dyn ObjectStore>,
    /// The temporary directory (kept alive to prevent cleanup).
    _temp_dir: Option<TempDir>,
}

impl TestLog {
    /// Creates a log over a fresh in-memory store.
    pub fn memory() -> Self {
        Self::over(Arc::new(InMemoryObjectStore::new()))
    }

    /// Creates a log over a fresh file store in a temporary directory.
    pub fn file() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = FileObjectStore::open(temp_dir.path()).expect("Failed to open file store");
        let mut log = Self::over(Arc::new(store));
        log._temp_dir = Some(temp_dir);
        log
    }

    /// Creates a log over an existing store.
    pub fn over(store: Arc<dyn ObjectStore>) -> Self {
        Self {
            wal: Wal::new(store.clone(), TEST_BUCKET, TEST_PREFIX, WalConfig::default()),
            store,
            _temp_dir: None,
        }
    }

    /// Opens another handle on the same namespace, as a second process would.
    pub fn second_handle(&self) -> Wal {
        Wal::new(
            self.store.clone(),
            TEST_BUCKET,
            TEST_PREFIX,
            self.wal.config().clone(),
        )
    }

    /// Appends every payload and returns the offsets.
    pub fn append_all<'a, I>(&self, payloads: I) -> Vec<u64>
    where
        I: IntoIterator<Item = &'a [u8]>,
    {
        payloads
            .into_iter()
            .map(|p| self.wal.append(p).expect("append failed"))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_fixture() {
        let log = TestLog::memory();
        let offsets = log.append_all([b"a".as_slice(), b"b".as_slice()]);
        assert_eq!(offsets, vec![1, 2]);
    }

    #[test]
    fn file_fixture_shares_namespace() {
        let log = TestLog::file();
        log.wal.append(b"first").unwrap();

        let other = log.second_handle();
        assert_eq!(other.recover_tail().unwrap().payload(), b"first");
        assert_eq!(other.append(b"second").unwrap(), 2);
    }
}
