//! # s3wal Core
//!
//! A durable, append-only write-ahead log stored in an object store.
//!
//! This crate provides:
//! - A key scheme mapping offsets to order-preserving object keys
//! - A checksummed frame format for records
//! - An append engine that claims each offset with a create-if-absent write
//! - A validating reader
//! - Tail discovery to rebuild the log length after a cold start or crash
//!
//! ## Example
//!
//! ```rust
//! use s3wal_core::{InMemoryObjectStore, Wal, WalConfig};
//! use std::sync::Arc;
//!
//! let store = Arc::new(InMemoryObjectStore::new());
//! let wal = Wal::new(store, "bucket", "wal", WalConfig::default());
//!
//! assert_eq!(wal.append(b"hello").unwrap(), 1);
//! assert_eq!(wal.append(b"world").unwrap(), 2);
//! assert_eq!(wal.read(1).unwrap().payload(), b"hello");
//!
//! let tail = wal.recover_tail().unwrap();
//! assert_eq!(tail.offset(), 2);
//! assert_eq!(tail.payload(), b"world");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod key;
mod stats;
mod wal;

pub use config::WalConfig;
pub use error::{WalError, WalResult};
pub use key::{KeyScheme, OFFSET_WIDTH};
pub use stats::{NoopObserver, StatsSnapshot, WalObserver, WalStats};
pub use wal::{
    decode_frame, encode_frame, CorruptObject, Record, VerifyReport, Wal, WalIterator,
    CHECKSUM_SIZE, MIN_FRAME_SIZE, OFFSET_SIZE,
};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use s3wal_storage::{
    FileObjectStore, InMemoryObjectStore, ListPage, ObjectStore, PutOutcome, StoreError,
};
