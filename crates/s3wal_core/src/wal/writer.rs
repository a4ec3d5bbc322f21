//! The log handle and its append path.

use crate::config::WalConfig;
use crate::error::{WalError, WalResult};
use crate::key::KeyScheme;
use crate::stats::{NoopObserver, WalObserver};
use crate::wal::record::encode_frame;
use parking_lot::Mutex;
use s3wal_storage::{ObjectStore, PutOutcome};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, warn};

/// A handle on one log in an object store.
///
/// The handle tracks `length`, the highest offset it believes is committed.
/// That value is local and advisory: other handles, in this process or
/// elsewhere, may append to the same namespace and push the true tail past
/// it. [`Wal::recover_tail`] resets it from the store.
///
/// Handles are `Send + Sync`; share one behind an `Arc` to append from
/// several threads.
pub struct Wal {
    pub(crate) store: Arc<dyn ObjectStore>,
    pub(crate) bucket: String,
    pub(crate) keys: KeyScheme,
    /// Never held across a store call.
    state: Mutex<AppendState>,
    config: WalConfig,
    pub(crate) observer: Arc<dyn WalObserver>,
}

impl Wal {
    /// Creates a handle on the log under `prefix` in `bucket`, with length 0.
    ///
    /// No store call is made. Use [`Wal::open`] to pick up an existing log.
    ///
    /// # Panics
    ///
    /// Panics if `bucket` or `prefix` is blank.
    pub fn new(
        store: Arc<dyn ObjectStore>,
        bucket: impl Into<String>,
        prefix: impl Into<String>,
        config: WalConfig,
    ) -> Self {
        let bucket = bucket.into();
        assert!(!bucket.trim().is_empty(), "bucket must not be blank");
        Self {
            store,
            bucket,
            keys: KeyScheme::new(prefix),
            state: Mutex::new(AppendState::default()),
            config,
            observer: Arc::new(NoopObserver),
        }
    }

    /// Creates a handle and primes its length from the store.
    ///
    /// An empty namespace opens with length 0.
    ///
    /// # Errors
    ///
    /// Returns any error of [`Wal::recover_tail`] other than
    /// [`WalError::EmptyLog`].
    pub fn open(
        store: Arc<dyn ObjectStore>,
        bucket: impl Into<String>,
        prefix: impl Into<String>,
        config: WalConfig,
    ) -> WalResult<Self> {
        let wal = Self::new(store, bucket, prefix, config);
        match wal.recover_tail() {
            Ok(_) | Err(WalError::EmptyLog) => Ok(wal),
            Err(e) => Err(e),
        }
    }

    /// Replaces the observer notified of appends, reads and errors.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn WalObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Returns the bucket the log lives in.
    #[must_use]
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Returns the log prefix.
    #[must_use]
    pub fn prefix(&self) -> &str {
        self.keys.prefix()
    }

    /// Returns the key scheme of the log.
    #[must_use]
    pub fn keys(&self) -> &KeyScheme {
        &self.keys
    }

    /// Returns the handle's configuration.
    #[must_use]
    pub fn config(&self) -> &WalConfig {
        &self.config
    }

    /// Returns the highest offset this handle knows to be committed.
    #[must_use]
    pub fn length(&self) -> u64 {
        self.state.lock().length
    }

    /// Appends `payload` and returns the offset it was committed at.
    ///
    /// The offset is claimed with a create-if-absent write. If another
    /// writer already holds the candidate offset, the append moves past it
    /// and tries again, up to `max_append_retries` times.
    ///
    /// The call returns only once a write has definitively landed, every
    /// attempt has lost, or the store has failed.
    ///
    /// # Errors
    ///
    /// - [`WalError::Contention`] if every attempt lost its race
    /// - [`WalError::Storage`] on a store fault; the write may still have
    ///   landed, so run [`Wal::recover_tail`] before trusting `length`
    /// - [`WalError::OffsetOverflow`] if the offset space is exhausted
    pub fn append(&self, payload: &[u8]) -> WalResult<u64> {
        self.append_inner(payload).map_err(|e| self.report(e))
    }

    fn append_inner(&self, payload: &[u8]) -> WalResult<u64> {
        let attempts = self.config.max_append_attempts();
        let mut last_offset = 0;

        for attempt in 1..=attempts {
            let candidate = self.state.lock().reserve()?;

            let frame = encode_frame(candidate, payload);
            let key = self.keys.encode(candidate);
            let outcome = match self.store.put_if_absent(&self.bucket, &key, &frame) {
                Ok(outcome) => outcome,
                Err(e) => {
                    self.state.lock().release(candidate);
                    return Err(e.into());
                }
            };

            // Either way the offset is now known to be occupied.
            self.state.lock().settle(candidate);

            match outcome {
                PutOutcome::Created => {
                    debug!(offset = candidate, bytes = frame.len(), "committed record");
                    self.observer.on_append_committed(candidate, frame.len());
                    return Ok(candidate);
                }
                PutOutcome::AlreadyExists => {
                    debug!(offset = candidate, attempt, "offset already taken, retrying");
                    self.observer.on_append_conflict(candidate);
                    last_offset = candidate;
                }
            }
        }

        warn!(
            attempts,
            last_offset,
            prefix = self.keys.prefix(),
            "append gave up after losing every race"
        );
        Err(WalError::Contention {
            attempts,
            last_offset,
        })
    }

    /// Resets the length to an authoritative value from the store.
    pub(crate) fn reset_length(&self, offset: u64) {
        self.state.lock().length = offset;
    }

    /// Passes an error to the observer on its way to the caller.
    pub(crate) fn report(&self, error: WalError) -> WalError {
        if !error.is_expected() {
            self.observer.on_error(&error);
        }
        error
    }
}

/// Local bookkeeping of a handle's appends.
#[derive(Debug, Default)]
struct AppendState {
    /// Highest offset known to be occupied.
    length: u64,
    /// Offsets handed to local callers whose write has not returned yet.
    in_flight: BTreeSet<u64>,
}

impl AppendState {
    /// Claims the next offset no local caller is working on.
    fn reserve(&mut self) -> WalResult<u64> {
        let highest = self
            .in_flight
            .last()
            .map_or(self.length, |&last| last.max(self.length));
        let candidate = highest.checked_add(1).ok_or(WalError::OffsetOverflow)?;
        self.in_flight.insert(candidate);
        Ok(candidate)
    }

    /// The write at `offset` returned and the offset is now occupied.
    fn settle(&mut self, offset: u64) {
        self.in_flight.remove(&offset);
        self.length = self.length.max(offset);
    }

    /// The write at `offset` failed; its outcome is unknown to this handle.
    fn release(&mut self, offset: u64) {
        self.in_flight.remove(&offset);
    }
}

impl std::fmt::Debug for Wal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Wal")
            .field("bucket", &self.bucket)
            .field("prefix", &self.keys.prefix())
            .field("length", &self.length())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::WalStats;
    use crate::wal::record::decode_frame;
    use s3wal_storage::{InMemoryObjectStore, StoreError};

    fn create_wal() -> (Arc<InMemoryObjectStore>, Wal) {
        let store = Arc::new(InMemoryObjectStore::new());
        let wal = Wal::new(store.clone(), "bucket", "wal", WalConfig::default());
        (store, wal)
    }

    #[test]
    fn sequential_appends_are_dense() {
        let (_, wal) = create_wal();
        for expected in 1..=10 {
            assert_eq!(wal.append(format!("r{expected}").as_bytes()).unwrap(), expected);
        }
        assert_eq!(wal.length(), 10);
    }

    #[test]
    fn append_writes_frame_at_key() {
        let (store, wal) = create_wal();
        wal.append(b"hello").unwrap();

        let frame = store
            .get("bucket", "wal/00000000000000000001")
            .unwrap()
            .unwrap();
        let record = decode_frame(&frame).unwrap();
        assert_eq!(record.offset(), 1);
        assert_eq!(record.payload(), b"hello");
    }

    #[test]
    fn empty_payload_appends() {
        let (_, wal) = create_wal();
        assert_eq!(wal.append(b"").unwrap(), 1);
        assert!(wal.read(1).unwrap().payload().is_empty());
    }

    #[test]
    fn lost_race_moves_past_taken_offset() {
        let (store, wal) = create_wal();
        // Another writer got there first.
        store
            .put_if_absent("bucket", &wal.keys().encode(1), &encode_frame(1, b"theirs"))
            .unwrap();

        assert_eq!(wal.append(b"mine").unwrap(), 2);
        assert_eq!(wal.read(1).unwrap().payload(), b"theirs");
        assert_eq!(wal.read(2).unwrap().payload(), b"mine");
    }

    #[test]
    fn contention_after_bounded_retries() {
        let store = Arc::new(InMemoryObjectStore::new());
        let keys = KeyScheme::new("wal");
        for offset in 1..=3 {
            store
                .put_if_absent("bucket", &keys.encode(offset), &encode_frame(offset, b"x"))
                .unwrap();
        }
        let wal = Wal::new(
            store.clone(),
            "bucket",
            "wal",
            WalConfig::new().max_append_retries(2),
        );

        let err = wal.append(b"late").unwrap_err();
        assert!(matches!(
            err,
            WalError::Contention {
                attempts: 3,
                last_offset: 3
            }
        ));
        // The existing objects are untouched and nothing new was written.
        assert_eq!(store.object_count("bucket"), 3);
        assert_eq!(wal.length(), 3);

        // The next call starts past the occupied range.
        assert_eq!(wal.append(b"late").unwrap(), 4);
    }

    #[test]
    fn overflow_is_an_error() {
        let (store, wal) = create_wal();
        wal.reset_length(u64::MAX);
        assert!(matches!(wal.append(b"x"), Err(WalError::OffsetOverflow)));
        assert_eq!(store.object_count("bucket"), 0);
    }

    #[derive(Debug)]
    struct BrokenStore;

    impl ObjectStore for BrokenStore {
        fn get(&self, _: &str, _: &str) -> s3wal_storage::StoreResult<Option<Vec<u8>>> {
            Err(StoreError::unavailable("down"))
        }

        fn put_if_absent(
            &self,
            _: &str,
            _: &str,
            _: &[u8],
        ) -> s3wal_storage::StoreResult<PutOutcome> {
            Err(StoreError::unavailable("down"))
        }

        fn list(
            &self,
            _: &str,
            _: &str,
            _: Option<&str>,
        ) -> s3wal_storage::StoreResult<s3wal_storage::ListPage> {
            Err(StoreError::unavailable("down"))
        }
    }

    #[test]
    fn storage_fault_leaves_length_alone() {
        let stats = Arc::new(WalStats::new());
        let wal = Wal::new(Arc::new(BrokenStore), "bucket", "wal", WalConfig::default())
            .with_observer(stats.clone());

        assert!(matches!(wal.append(b"x"), Err(WalError::Storage(_))));
        assert_eq!(wal.length(), 0);
        assert_eq!(stats.errors(), 1);
        assert_eq!(stats.appends(), 0);
    }

    #[test]
    fn observer_sees_commits_and_conflicts() {
        let (store, wal) = create_wal();
        let stats = Arc::new(WalStats::new());
        let wal = wal.with_observer(stats.clone());
        store
            .put_if_absent("bucket", &wal.keys().encode(1), &encode_frame(1, b"x"))
            .unwrap();

        wal.append(b"hello").unwrap();

        assert_eq!(stats.appends(), 1);
        assert_eq!(stats.append_conflicts(), 1);
        assert_eq!(stats.bytes_written(), (5 + crate::MIN_FRAME_SIZE) as u64);
    }

    #[test]
    fn handles_do_not_share_length() {
        let store = Arc::new(InMemoryObjectStore::new());
        let a = Wal::new(store.clone(), "bucket", "a", WalConfig::default());
        let b = Wal::new(store.clone(), "bucket", "b", WalConfig::default());

        a.append(b"1").unwrap();
        a.append(b"2").unwrap();
        assert_eq!(b.append(b"1").unwrap(), 1);
        assert_eq!(a.length(), 2);
        assert_eq!(b.length(), 1);
    }

    #[test]
    fn reservations_keep_local_callers_apart() {
        let mut state = AppendState::default();
        assert_eq!(state.reserve().unwrap(), 1);
        assert_eq!(state.reserve().unwrap(), 2);

        state.settle(2);
        state.release(1);
        assert_eq!(state.length, 2);
        assert!(state.in_flight.is_empty());
        assert_eq!(state.reserve().unwrap(), 3);
    }

    #[test]
    fn failed_write_gives_its_reservation_back() {
        let mut state = AppendState::default();
        let offset = state.reserve().unwrap();
        state.release(offset);

        assert_eq!(state.length, 0);
        assert_eq!(state.reserve().unwrap(), offset);
    }

    #[test]
    fn reserve_at_the_end_of_offset_space() {
        let mut state = AppendState {
            length: u64::MAX - 1,
            ..AppendState::default()
        };
        assert_eq!(state.reserve().unwrap(), u64::MAX);
        assert!(matches!(state.reserve(), Err(WalError::OffsetOverflow)));
    }

    #[test]
    #[should_panic(expected = "bucket")]
    fn blank_bucket_panics() {
        let _ = Wal::new(
            Arc::new(InMemoryObjectStore::new()),
            "",
            "wal",
            WalConfig::default(),
        );
    }

    #[test]
    fn debug_shows_namespace() {
        let (_, wal) = create_wal();
        let rendered = format!("{wal:?}");
        assert!(rendered.contains("bucket"));
        assert!(rendered.contains("wal"));
    }
}
