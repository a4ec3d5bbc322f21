//! File-based object store for local persistent storage.

use crate::error::{StoreError, StoreResult};
use crate::store::{ListPage, ObjectStore, PutOutcome};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Default number of keys returned per listing page.
///
/// Matches the largest page S3's `ListObjectsV2` hands out.
pub const DEFAULT_PAGE_SIZE: usize = 1000;

/// Directory under the root where objects are staged before publication.
const STAGING_DIR: &str = ".staging";

/// An object store backed by a local directory.
///
/// Each bucket is a directory under the root and each key is a relative
/// path inside it (`/` separated segments become subdirectories). Objects
/// survive process restarts.
///
/// # Durability
///
/// - Objects are written to a staging file and `fsync`ed before publication
/// - Publication uses a no-clobber link, so a reader never sees a partially
///   written object and an existing object is never replaced
///
/// # Example
///
/// ```no_run
/// use s3wal_storage::{FileObjectStore, ObjectStore};
/// use std::path::Path;
///
/// let store = FileObjectStore::open(Path::new("/var/lib/s3wal")).unwrap();
/// store.put_if_absent("logs", "wal/00000000000000000001", b"frame").unwrap();
/// ```
#[derive(Debug)]
pub struct FileObjectStore {
    root: PathBuf,
    page_size: usize,
}

impl FileObjectStore {
    /// Opens a store rooted at `root`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the root or staging directory cannot be created.
    pub fn open(root: &Path) -> StoreResult<Self> {
        fs::create_dir_all(root.join(STAGING_DIR))?;
        Ok(Self {
            root: root.to_path_buf(),
            page_size: DEFAULT_PAGE_SIZE,
        })
    }

    /// Sets the maximum number of keys returned per listing page.
    ///
    /// # Panics
    ///
    /// Panics if `page_size` is zero.
    #[must_use]
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        assert!(page_size > 0, "page size must be at least 1");
        self.page_size = page_size;
        self
    }

    /// Returns the root directory of the store.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn bucket_dir(&self, bucket: &str) -> StoreResult<PathBuf> {
        if bucket.is_empty() || bucket.starts_with('.') || bucket.contains(['/', '\\']) {
            return Err(StoreError::invalid_key(
                bucket,
                "bucket must be a non-empty name without separators or a leading dot",
            ));
        }
        Ok(self.root.join(bucket))
    }

    fn object_path(&self, bucket: &str, key: &str) -> StoreResult<PathBuf> {
        let mut path = self.bucket_dir(bucket)?;
        if key.is_empty() {
            return Err(StoreError::invalid_key(key, "key must not be empty"));
        }
        for segment in key.split('/') {
            if segment.is_empty() || segment == "." || segment == ".." || segment.contains('\\')
            {
                return Err(StoreError::invalid_key(
                    key,
                    format!("unsupported path segment {segment:?}"),
                ));
            }
            path.push(segment);
        }
        Ok(path)
    }
}

/// Recursively collects every object key below `dir`, prefixing each with `rel`.
fn collect_keys(dir: &Path, rel: &str, out: &mut Vec<String>) -> io::Result<()> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e),
    };

    for entry in entries {
        let entry = entry?;
        let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
            // Objects are always written under UTF-8 keys.
            continue;
        };
        let key = format!("{rel}{name}");
        if entry.file_type()?.is_dir() {
            collect_keys(&entry.path(), &format!("{key}/"), out)?;
        } else {
            out.push(key);
        }
    }
    Ok(())
}

impl ObjectStore for FileObjectStore {
    fn get(&self, bucket: &str, key: &str) -> StoreResult<Option<Vec<u8>>> {
        let path = self.object_path(bucket, key)?;
        match fs::read(&path) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn put_if_absent(&self, bucket: &str, key: &str, data: &[u8]) -> StoreResult<PutOutcome> {
        let path = self.object_path(bucket, key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut staged = NamedTempFile::new_in(self.root.join(STAGING_DIR))?;
        staged.write_all(data)?;
        staged.as_file().sync_all()?;

        match staged.persist_noclobber(&path) {
            Ok(_) => Ok(PutOutcome::Created),
            Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists => {
                Ok(PutOutcome::AlreadyExists)
            }
            Err(e) => Err(e.error.into()),
        }
    }

    fn list(
        &self,
        bucket: &str,
        prefix: &str,
        continuation: Option<&str>,
    ) -> StoreResult<ListPage> {
        let bucket_dir = self.bucket_dir(bucket)?;

        // Only walk the directory the prefix can possibly live in.
        let dir_part = match prefix.rfind('/') {
            Some(idx) => &prefix[..=idx],
            None => "",
        };
        let mut start = bucket_dir.clone();
        for segment in dir_part.split('/').filter(|s| !s.is_empty()) {
            start.push(segment);
        }

        let mut keys = Vec::new();
        collect_keys(&start, dir_part, &mut keys)?;
        keys.retain(|key| {
            key.starts_with(prefix) && continuation.map_or(true, |token| key.as_str() > token)
        });
        keys.sort_unstable();

        let next = if keys.len() > self.page_size {
            keys.truncate(self.page_size);
            keys.last().cloned()
        } else {
            None
        };

        Ok(ListPage { keys, next })
    }
}
