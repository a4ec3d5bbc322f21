//! Object store trait definition.

use crate::error::StoreResult;

/// Result of a create-if-absent write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutOutcome {
    /// The object did not exist and now holds the written bytes.
    Created,
    /// An object already existed at the key; nothing was written.
    AlreadyExists,
}

impl PutOutcome {
    /// Returns `true` if the write created the object.
    #[must_use]
    pub const fn is_created(self) -> bool {
        matches!(self, Self::Created)
    }
}

/// One page of a listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListPage {
    /// Keys on this page, in lexicographic order.
    pub keys: Vec<String>,
    /// Continuation token for the next page, `None` once the listing is exhausted.
    pub next: Option<String>,
}

/// A remote object store holding immutable objects under string keys.
///
/// Object stores are **opaque byte stores**. The log owns the key scheme and
/// the frame format; stores only move bytes.
///
/// # Invariants
///
/// - `put_if_absent` is atomic: of any number of concurrent writers to the
///   same key, at most one observes [`PutOutcome::Created`]
/// - An object, once created, is never replaced by `put_if_absent`
/// - `list` returns keys in lexicographic order and signals the end of the
///   listing only with `next == None`
/// - Stores must be `Send + Sync` for concurrent access
///
/// # Implementors
///
/// - [`super::InMemoryObjectStore`] - For testing
/// - [`super::FileObjectStore`] - For local persistent storage
pub trait ObjectStore: Send + Sync {
    /// Fetches the object stored at `key`.
    ///
    /// Returns `Ok(None)` if no object exists at the key.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be reached or the read fails.
    fn get(&self, bucket: &str, key: &str) -> StoreResult<Option<Vec<u8>>>;

    /// Writes `data` at `key` only if no object currently exists there.
    ///
    /// # Errors
    ///
    /// Returns an error on a transport or storage fault. In that case the
    /// write may or may not have landed.
    fn put_if_absent(&self, bucket: &str, key: &str, data: &[u8]) -> StoreResult<PutOutcome>;

    /// Lists one page of keys starting with `prefix`.
    ///
    /// Pass `None` for the first page, then the `next` token of the previous
    /// page until it comes back `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if the listing request fails.
    fn list(&self, bucket: &str, prefix: &str, continuation: Option<&str>)
        -> StoreResult<ListPage>;
}

impl<S: ObjectStore + ?Sized> ObjectStore for std::sync::Arc<S> {
    fn get(&self, bucket: &str, key: &str) -> StoreResult<Option<Vec<u8>>> {
        (**self).get(bucket, key)
    }

    fn put_if_absent(&self, bucket: &str, key: &str, data: &[u8]) -> StoreResult<PutOutcome> {
        (**self).put_if_absent(bucket, key, data)
    }

    fn list(
        &self,
        bucket: &str,
        prefix: &str,
        continuation: Option<&str>,
    ) -> StoreResult<ListPage> {
        (**self).list(bucket, prefix, continuation)
    }
}
