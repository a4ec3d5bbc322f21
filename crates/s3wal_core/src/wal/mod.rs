//! The log engine.
//!
//! Every record lives in its own object. The object key carries the offset
//! and the object body is a checksummed frame.
//!
//! ## Frame Format
//!
//! ```text
//! | offset (8, big-endian) | payload (N) | sha256 (32) |
//! ```
//!
//! The digest covers the offset and the payload. The smallest valid frame,
//! holding an empty payload, is 40 bytes.
//!
//! ## Writers
//!
//! Offsets are claimed with the store's create-if-absent write. That write is
//! the only thing keeping two writers off the same offset; the handle's lock
//! just stops callers sharing one handle from racing each other for nothing.
//! A lost race is retried at a fresh offset a bounded number of times.
//!
//! ## Recovery Policy
//!
//! Tail discovery lists every page of the namespace before deciding on a
//! tail and is **fail-closed**:
//!
//! - **Malformed key** under the prefix: abort with `InvalidKey`
//! - **Corrupt tail frame**: abort with `ChecksumMismatch`, `FrameTooShort`
//!   or `OffsetMismatch`
//! - **No objects**: `EmptyLog`, the normal state of a fresh namespace
//!
//! Gaps below the tail (offsets never written, or removed by retention) are
//! not an error.
//!
//! ## Invariants
//!
//! - Records are **immutable** once committed
//! - Offsets start at 1 and only ever grow
//! - At most one frame is ever committed per offset
//! - The handle's lock is never held across a store call

mod iterator;
mod reader;
mod record;
mod recovery;
mod writer;

pub use iterator::WalIterator;
pub use record::{decode_frame, encode_frame, Record, CHECKSUM_SIZE, MIN_FRAME_SIZE, OFFSET_SIZE};
pub use recovery::{CorruptObject, VerifyReport};
pub use writer::Wal;
