//! # s3wal Testkit
//!
//! Test utilities for s3wal.
//!
//! This crate provides:
//! - Log fixtures over in-memory and file-backed stores
//! - Property-based test generators using proptest
//! - A fault-injecting object store wrapper
//! - Multi-writer stress helpers
//! - Cross-implementation wire format vectors
//!
//! ## Usage
//!
//! ```rust
//! use s3wal_testkit::prelude::*;
//!
//! let log = TestLog::memory();
//! assert_eq!(log.wal.append(b"x").unwrap(), 1);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod faulty;
pub mod fixtures;
pub mod generators;
pub mod stress;
pub mod vectors;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::faulty::*;
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::stress::*;
    pub use crate::vectors::*;
}

pub use faulty::*;
pub use fixtures::*;
pub use generators::*;
pub use stress::*;
pub use vectors::*;
