//! Fault injection for object stores.
//!
//! [`FaultyStore`] wraps any [`ObjectStore`] and misbehaves on request. It is
//! used to test the log's handling of lost races, store outages, writes
//! whose outcome the caller never learns, and bit rot.
//!
//! ## Usage
//!
//! ```rust
//! use s3wal_core::{InMemoryObjectStore, Wal, WalConfig, WalError};
//! use s3wal_testkit::FaultyStore;
//! use std::sync::Arc;
//!
//! let store = Arc::new(FaultyStore::new(InMemoryObjectStore::new()));
//! let wal = Wal::new(store.clone(), "b", "wal", WalConfig::default());
//!
//! store.fail_next_puts(1);
//! assert!(matches!(wal.append(b"x"), Err(WalError::Storage(_))));
//! assert_eq!(wal.append(b"x").unwrap(), 1);
//! ```

use parking_lot::Mutex;
use s3wal_core::{encode_frame, ListPage, ObjectStore, PutOutcome, StoreError, OFFSET_SIZE};
use s3wal_storage::StoreResult;
use std::sync::atomic::{AtomicU64, Ordering};

/// Payload written by the simulated rival writer.
pub const RIVAL_PAYLOAD: &[u8] = b"rival";

/// Pending faults, each a countdown of calls to affect.
#[derive(Debug, Default)]
struct Faults {
    fail_puts: u32,
    fail_after_put: u32,
    rival_claims: u32,
    fail_gets: u32,
    fail_lists: u32,
    lists_before_failure: u32,
    corrupt_gets: u32,
}

fn take(counter: &mut u32) -> bool {
    if *counter > 0 {
        *counter -= 1;
        true
    } else {
        false
    }
}

/// An object store wrapper that injects faults.
#[derive(Debug)]
pub struct FaultyStore<S> {
    inner: S,
    faults: Mutex<Faults>,
    puts: AtomicU64,
    gets: AtomicU64,
    lists: AtomicU64,
}

impl<S: ObjectStore> FaultyStore<S> {
    /// Wraps `inner` with no faults scheduled.
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            faults: Mutex::new(Faults::default()),
            puts: AtomicU64::new(0),
            gets: AtomicU64::new(0),
            lists: AtomicU64::new(0),
        }
    }

    /// Returns the wrapped store.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// The next `n` puts fail without writing anything.
    pub fn fail_next_puts(&self, n: u32) {
        self.faults.lock().fail_puts = n;
    }

    /// The next `n` puts write their object, then report a failure.
    ///
    /// Models a timeout or cancellation after the store already committed.
    pub fn fail_after_next_puts(&self, n: u32) {
        self.faults.lock().fail_after_put = n;
    }

    /// Before each of the next `n` puts, a rival writer claims the key first.
    ///
    /// The rival's frame carries [`RIVAL_PAYLOAD`] at the same offset.
    pub fn rival_claims_next_puts(&self, n: u32) {
        self.faults.lock().rival_claims = n;
    }

    /// The next `n` gets fail.
    pub fn fail_next_gets(&self, n: u32) {
        self.faults.lock().fail_gets = n;
    }

    /// The next `n` gets return the object with one bit flipped in its last byte.
    pub fn corrupt_next_gets(&self, n: u32) {
        self.faults.lock().corrupt_gets = n;
    }

    /// The next `n` list calls fail.
    pub fn fail_next_lists(&self, n: u32) {
        self.fail_lists_after(0, n);
    }

    /// After `ok_calls` more successful list calls, the following `n` fail.
    ///
    /// Lets a listing break down partway through its pages.
    pub fn fail_lists_after(&self, ok_calls: u32, n: u32) {
        let mut faults = self.faults.lock();
        faults.lists_before_failure = ok_calls;
        faults.fail_lists = n;
    }

    /// Returns the number of put calls seen.
    pub fn puts(&self) -> u64 {
        self.puts.load(Ordering::Relaxed)
    }

    /// Returns the number of get calls seen.
    pub fn gets(&self) -> u64 {
        self.gets.load(Ordering::Relaxed)
    }

    /// Returns the number of list calls seen.
    pub fn lists(&self) -> u64 {
        self.lists.load(Ordering::Relaxed)
    }
}

impl<S: ObjectStore> ObjectStore for FaultyStore<S> {
    fn get(&self, bucket: &str, key: &str) -> StoreResult<Option<Vec<u8>>> {
        self.gets.fetch_add(1, Ordering::Relaxed);
        let (fail, corrupt) = {
            let mut faults = self.faults.lock();
            (take(&mut faults.fail_gets), take(&mut faults.corrupt_gets))
        };
        if fail {
            return Err(StoreError::unavailable("injected get failure"));
        }

        let mut object = self.inner.get(bucket, key)?;
        if corrupt {
            if let Some(last) = object.as_mut().and_then(|data| data.last_mut()) {
                *last ^= 0x01;
            }
        }
        Ok(object)
    }

    fn put_if_absent(&self, bucket: &str, key: &str, data: &[u8]) -> StoreResult<PutOutcome> {
        self.puts.fetch_add(1, Ordering::Relaxed);
        let (fail, rival, fail_after) = {
            let mut faults = self.faults.lock();
            (
                take(&mut faults.fail_puts),
                take(&mut faults.rival_claims),
                take(&mut faults.fail_after_put),
            )
        };
        if fail {
            return Err(StoreError::unavailable("injected put failure"));
        }

        if rival {
            if let Some(offset_bytes) = data.get(..OFFSET_SIZE) {
                let mut raw = [0u8; OFFSET_SIZE];
                raw.copy_from_slice(offset_bytes);
                let offset = u64::from_be_bytes(raw);
                self.inner
                    .put_if_absent(bucket, key, &encode_frame(offset, RIVAL_PAYLOAD))?;
            }
        }

        let outcome = self.inner.put_if_absent(bucket, key, data)?;
        if fail_after {
            return Err(StoreError::unavailable("injected failure after put"));
        }
        Ok(outcome)
    }

    fn list(
        &self,
        bucket: &str,
        prefix: &str,
        continuation: Option<&str>,
    ) -> StoreResult<ListPage> {
        self.lists.fetch_add(1, Ordering::Relaxed);
        let fail = {
            let mut faults = self.faults.lock();
            faults.fail_lists > 0
                && !take(&mut faults.lists_before_failure)
                && take(&mut faults.fail_lists)
        };
        if fail {
            return Err(StoreError::unavailable("injected list failure"));
        }
        self.inner.list(bucket, prefix, continuation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use s3wal_core::{InMemoryObjectStore, Wal, WalConfig, WalError, WalStats};
    use std::sync::Arc;

    fn setup(page_size: usize) -> (Arc<FaultyStore<InMemoryObjectStore>>, Wal) {
        let store = Arc::new(FaultyStore::new(InMemoryObjectStore::with_page_size(
            page_size,
        )));
        let wal = Wal::new(store.clone(), "b", "wal", WalConfig::new().max_append_retries(3));
        (store, wal)
    }

    #[test]
    fn put_failure_leaves_no_trace() {
        let (store, wal) = setup(10);
        store.fail_next_puts(1);

        assert!(matches!(wal.append(b"x"), Err(WalError::Storage(_))));
        assert_eq!(wal.length(), 0);
        assert_eq!(store.inner().object_count("b"), 0);
        assert_eq!(wal.append(b"x").unwrap(), 1);
    }

    #[test]
    fn uncertain_put_is_found_by_recovery() {
        let (store, wal) = setup(10);
        store.fail_after_next_puts(1);

        assert!(matches!(wal.append(b"landed"), Err(WalError::Storage(_))));
        // The handle cannot know, the store does.
        assert_eq!(wal.length(), 0);
        assert_eq!(wal.recover_tail().unwrap().payload(), b"landed");
        assert_eq!(wal.append(b"after").unwrap(), 2);
    }

    #[test]
    fn uncertain_put_without_recovery_never_overwrites() {
        let (store, wal) = setup(10);
        store.fail_after_next_puts(1);
        let _ = wal.append(b"landed");

        // The retry lands on the next offset instead of clobbering.
        assert_eq!(wal.append(b"retry").unwrap(), 2);
        assert_eq!(wal.read(1).unwrap().payload(), b"landed");
    }

    #[test]
    fn rival_wins_then_append_moves_on() {
        let (store, wal) = setup(10);
        let stats = Arc::new(WalStats::new());
        let wal = wal.with_observer(stats.clone());
        store.rival_claims_next_puts(2);

        assert_eq!(wal.append(b"mine").unwrap(), 3);
        assert_eq!(wal.read(1).unwrap().payload(), RIVAL_PAYLOAD);
        assert_eq!(wal.read(2).unwrap().payload(), RIVAL_PAYLOAD);
        assert_eq!(wal.read(3).unwrap().payload(), b"mine");
        assert_eq!(stats.append_conflicts(), 2);
    }

    #[test]
    fn rival_exhausts_retries() {
        let (store, wal) = setup(10);
        store.rival_claims_next_puts(4);

        assert!(matches!(
            wal.append(b"mine"),
            Err(WalError::Contention {
                attempts: 4,
                last_offset: 4
            })
        ));
        assert_eq!(store.puts(), 4);
        assert_eq!(wal.length(), 4);
    }

    #[test]
    fn corrupt_read_detected() {
        let (store, wal) = setup(10);
        wal.append(b"x").unwrap();
        store.corrupt_next_gets(1);
        let before = store.gets();

        assert!(matches!(
            wal.read(1),
            Err(WalError::ChecksumMismatch { .. })
        ));
        assert!(wal.read(1).is_ok());
        assert_eq!(store.gets() - before, 2);
    }

    #[test]
    fn get_failure_is_storage_error() {
        let (store, wal) = setup(10);
        wal.append(b"x").unwrap();
        store.fail_next_gets(1);
        let err = wal.read(1).unwrap_err();
        assert!(err.is_retryable());
    }

    #[test]
    fn list_failure_mid_listing_aborts_recovery() {
        let (store, wal) = setup(2);
        for i in 0..6u8 {
            wal.append(&[i]).unwrap();
        }
        let other = Wal::new(store.clone(), "b", "wal", WalConfig::default());

        let before = store.lists();
        assert!(other.verify().unwrap().is_ok());
        assert_eq!(store.lists() - before, 3);

        // The first page is served, the second fails.
        store.fail_lists_after(1, 1);
        assert!(matches!(other.recover_tail(), Err(WalError::Storage(_))));
        assert_eq!(other.length(), 0);

        assert_eq!(other.recover_tail().unwrap().offset(), 6);
    }
}
