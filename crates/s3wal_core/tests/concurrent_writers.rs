//! Exclusivity of offsets under concurrent writers.

use s3wal_core::{
    InMemoryObjectStore, ListPage, ObjectStore, PutOutcome, Wal, WalConfig, WalError, WalStats,
};
use s3wal_storage::StoreResult;
use std::collections::BTreeMap;
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

const WRITERS: usize = 4;
const APPENDS_PER_WRITER: usize = 50;

fn run(share_handle: bool) -> (Arc<InMemoryObjectStore>, BTreeMap<u64, Vec<u8>>) {
    let store = Arc::new(InMemoryObjectStore::new());
    // Independent handles really do race each other for offsets.
    let config = if share_handle {
        WalConfig::default()
    } else {
        WalConfig::new().max_append_retries(10_000)
    };
    let shared = Arc::new(Wal::new(store.clone(), "bucket", "wal", config.clone()));
    let barrier = Arc::new(Barrier::new(WRITERS));

    let handles: Vec<_> = (0..WRITERS)
        .map(|writer| {
            let wal = if share_handle {
                Arc::clone(&shared)
            } else {
                Arc::new(Wal::new(store.clone(), "bucket", "wal", config.clone()))
            };
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                (0..APPENDS_PER_WRITER)
                    .map(|i| {
                        let payload = format!("w{writer}-{i}").into_bytes();
                        let offset = wal.append(&payload).unwrap();
                        (offset, payload)
                    })
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut claimed = BTreeMap::new();
    for handle in handles {
        for (offset, payload) in handle.join().unwrap() {
            let previous = claimed.insert(offset, payload);
            assert!(previous.is_none(), "offset {offset} claimed twice");
        }
    }
    (store, claimed)
}

fn assert_log_matches(store: &Arc<InMemoryObjectStore>, claimed: &BTreeMap<u64, Vec<u8>>) {
    let total = (WRITERS * APPENDS_PER_WRITER) as u64;
    assert_eq!(claimed.keys().copied().collect::<Vec<_>>(), (1..=total).collect::<Vec<_>>());
    assert_eq!(store.object_count("bucket"), claimed.len());

    let reader = Wal::new(store.clone(), "bucket", "wal", WalConfig::default());
    for (offset, payload) in claimed {
        assert_eq!(reader.read(*offset).unwrap().payload(), payload.as_slice());
    }
    assert_eq!(reader.recover_tail().unwrap().offset(), total);
}

#[test]
fn independent_handles_never_share_an_offset() {
    let (store, claimed) = run(false);
    assert_log_matches(&store, &claimed);
}

#[test]
fn shared_handle_never_shares_an_offset() {
    let (store, claimed) = run(true);
    assert_log_matches(&store, &claimed);
}

#[test]
fn committed_object_survives_later_writers() {
    let store = Arc::new(InMemoryObjectStore::new());
    let first = Wal::new(store.clone(), "bucket", "wal", WalConfig::default());
    first.append(b"original").unwrap();
    let key = first.keys().encode(1);
    let before = store.get("bucket", &key).unwrap();

    let stats = Arc::new(WalStats::new());
    let late = Wal::new(store.clone(), "bucket", "wal", WalConfig::default())
        .with_observer(stats.clone());
    assert_eq!(late.append(b"intruder").unwrap(), 2);

    assert_eq!(store.get("bucket", &key).unwrap(), before);
    assert_eq!(stats.append_conflicts(), 1);
}

/// An in-memory store whose conditional writes take a while to answer.
#[derive(Debug, Default)]
struct SlowStore {
    inner: InMemoryObjectStore,
}

impl ObjectStore for SlowStore {
    fn get(&self, bucket: &str, key: &str) -> StoreResult<Option<Vec<u8>>> {
        self.inner.get(bucket, key)
    }

    fn put_if_absent(&self, bucket: &str, key: &str, data: &[u8]) -> StoreResult<PutOutcome> {
        thread::sleep(Duration::from_millis(1));
        self.inner.put_if_absent(bucket, key, data)
    }

    fn list(
        &self,
        bucket: &str,
        prefix: &str,
        continuation: Option<&str>,
    ) -> StoreResult<ListPage> {
        self.inner.list(bucket, prefix, continuation)
    }
}

#[test]
fn shared_handle_callers_do_not_race_each_other() {
    const THREADS: usize = 32;
    const APPENDS: usize = 10;

    let store = Arc::new(SlowStore::default());
    let stats = Arc::new(WalStats::new());
    let wal = Arc::new(
        Wal::new(store.clone(), "bucket", "wal", WalConfig::default()).with_observer(stats.clone()),
    );
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let wal = Arc::clone(&wal);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                (0..APPENDS).map(|_| wal.append(b"x")).collect::<Vec<_>>()
            })
        })
        .collect();

    let mut offsets = Vec::new();
    for handle in handles {
        for result in handle.join().unwrap() {
            match result {
                Ok(offset) => offsets.push(offset),
                Err(WalError::Contention { .. }) => panic!("lost a race with no other writer"),
                Err(e) => panic!("append failed: {e}"),
            }
        }
    }

    let total = (THREADS * APPENDS) as u64;
    offsets.sort_unstable();
    assert_eq!(offsets, (1..=total).collect::<Vec<_>>());
    assert_eq!(stats.append_conflicts(), 0);
    assert_eq!(stats.appends(), total);
    assert_eq!(wal.length(), total);
}
