//! # s3wal Storage
//!
//! Object store trait and implementations for s3wal.
//!
//! This crate provides the lowest-level storage abstraction for the log.
//! Object stores are **opaque key/value byte stores** - they do not interpret
//! the objects they hold.
//!
//! ## Design Principles
//!
//! - Stores expose only GET, create-if-absent PUT and paginated LIST
//! - No knowledge of frames, offsets or the key scheme
//! - Must be `Send + Sync` so many log handles can share one client
//! - Losing a create-if-absent race is an outcome, not an error
//!
//! ## Available Stores
//!
//! - [`InMemoryObjectStore`] - For testing and ephemeral logs
//! - [`FileObjectStore`] - Objects as files under a local directory
//!
//! ## Example
//!
//! ```rust
//! use s3wal_storage::{InMemoryObjectStore, ObjectStore, PutOutcome};
//!
//! let store = InMemoryObjectStore::new();
//! let outcome = store.put_if_absent("bucket", "wal/1", b"hello").unwrap();
//! assert_eq!(outcome, PutOutcome::Created);
//! let again = store.put_if_absent("bucket", "wal/1", b"other").unwrap();
//! assert_eq!(again, PutOutcome::AlreadyExists);
//! assert_eq!(store.get("bucket", "wal/1").unwrap().unwrap(), b"hello");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod file;
mod memory;
mod store;

pub use error::{StoreError, StoreResult};
pub use file::{FileObjectStore, DEFAULT_PAGE_SIZE};
pub use memory::InMemoryObjectStore;
pub use store::{ListPage, ObjectStore, PutOutcome};
