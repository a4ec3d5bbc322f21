//! In-memory object store for testing.

use crate::error::{StoreError, StoreResult};
use crate::file::DEFAULT_PAGE_SIZE;
use crate::store::{ListPage, ObjectStore, PutOutcome};
use parking_lot::RwLock;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::ops::Bound;

/// An in-memory object store.
///
/// This store keeps every object in memory and is suitable for:
/// - Unit tests
/// - Integration tests
/// - Ephemeral logs that don't need persistence
///
/// Listings are paginated with a configurable page size so callers that
/// must drain every page can be exercised with tiny pages.
///
/// # Thread Safety
///
/// This store is thread-safe and can be shared across threads. A single
/// write lock makes `put_if_absent` atomic.
///
/// # Example
///
/// ```rust
/// use s3wal_storage::{InMemoryObjectStore, ObjectStore};
///
/// let store = InMemoryObjectStore::with_page_size(2);
/// for key in ["log/a", "log/b", "log/c"] {
///     store.put_if_absent("b", key, b"x").unwrap();
/// }
/// let page = store.list("b", "log/", None).unwrap();
/// assert_eq!(page.keys, vec!["log/a", "log/b"]);
/// assert!(page.next.is_some());
/// ```
#[derive(Debug)]
pub struct InMemoryObjectStore {
    buckets: RwLock<BTreeMap<String, BTreeMap<String, Vec<u8>>>>,
    page_size: usize,
}

impl Default for InMemoryObjectStore {
    fn default() -> Self {
        Self {
            buckets: RwLock::new(BTreeMap::new()),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl InMemoryObjectStore {
    /// Creates a new empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new empty store whose listings return at most `page_size` keys.
    ///
    /// # Panics
    ///
    /// Panics if `page_size` is zero.
    #[must_use]
    pub fn with_page_size(page_size: usize) -> Self {
        assert!(page_size > 0, "page size must be at least 1");
        Self {
            page_size,
            ..Self::default()
        }
    }

    /// Returns the number of objects stored in `bucket`.
    #[must_use]
    pub fn object_count(&self, bucket: &str) -> usize {
        self.buckets.read().get(bucket).map_or(0, BTreeMap::len)
    }

    /// Unconditionally replaces the object at `key`.
    ///
    /// Bypasses the create-if-absent contract. Useful for simulating
    /// corruption or foreign objects in tests.
    pub fn put_raw(&self, bucket: &str, key: &str, data: Vec<u8>) {
        self.buckets
            .write()
            .entry(bucket.to_string())
            .or_default()
            .insert(key.to_string(), data);
    }

    /// Removes the object at `key`, returning it if it existed.
    ///
    /// Stands in for retention policies that live outside the log.
    pub fn remove(&self, bucket: &str, key: &str) -> Option<Vec<u8>> {
        self.buckets.write().get_mut(bucket)?.remove(key)
    }

    /// Clears every bucket.
    pub fn clear(&self) {
        self.buckets.write().clear();
    }
}

impl ObjectStore for InMemoryObjectStore {
    fn get(&self, bucket: &str, key: &str) -> StoreResult<Option<Vec<u8>>> {
        Ok(self
            .buckets
            .read()
            .get(bucket)
            .and_then(|objects| objects.get(key))
            .cloned())
    }

    fn put_if_absent(&self, bucket: &str, key: &str, data: &[u8]) -> StoreResult<PutOutcome> {
        if key.is_empty() {
            return Err(StoreError::invalid_key(key, "key must not be empty"));
        }

        let mut buckets = self.buckets.write();
        match buckets.entry(bucket.to_string()).or_default().entry(key.to_string()) {
            Entry::Occupied(_) => Ok(PutOutcome::AlreadyExists),
            Entry::Vacant(slot) => {
                slot.insert(data.to_vec());
                Ok(PutOutcome::Created)
            }
        }
    }

    fn list(
        &self,
        bucket: &str,
        prefix: &str,
        continuation: Option<&str>,
    ) -> StoreResult<ListPage> {
        let buckets = self.buckets.read();
        let Some(objects) = buckets.get(bucket) else {
            return Ok(ListPage::default());
        };

        let start = match continuation {
            Some(token) => Bound::Excluded(token),
            None => Bound::Included(prefix),
        };

        // Keys sharing a prefix are contiguous in lexicographic order.
        let mut keys: Vec<String> = objects
            .range::<str, _>((start, Bound::Unbounded))
            .map(|(key, _)| key)
            .skip_while(|key| key.as_str() < prefix)
            .take_while(|key| key.starts_with(prefix))
            .take(self.page_size + 1)
            .cloned()
            .collect();

        let next = if keys.len() > self.page_size {
            keys.truncate(self.page_size);
            keys.last().cloned()
        } else {
            None
        };

        Ok(ListPage { keys, next })
    }
}
