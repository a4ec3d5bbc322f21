//! Validated reads by offset.

use crate::error::{WalError, WalResult};
use crate::wal::record::{decode_frame, Record};
use crate::wal::writer::Wal;
use crate::wal::WalIterator;

impl Wal {
    /// Reads the record committed at `offset`.
    ///
    /// The frame is checksummed and its stored offset must match `offset`.
    /// Reading never changes the handle's length.
    ///
    /// # Errors
    ///
    /// - [`WalError::NotFound`] if no object exists at the offset
    /// - [`WalError::FrameTooShort`] or [`WalError::ChecksumMismatch`] if the
    ///   frame is damaged
    /// - [`WalError::OffsetMismatch`] if the frame belongs to another offset
    /// - [`WalError::Storage`] on a store fault
    pub fn read(&self, offset: u64) -> WalResult<Record> {
        self.read_inner(offset).map_err(|e| self.report(e))
    }

    pub(crate) fn read_inner(&self, offset: u64) -> WalResult<Record> {
        if offset == 0 {
            return Err(WalError::NotFound { offset });
        }

        let key = self.keys.encode(offset);
        let frame = self
            .store
            .get(&self.bucket, &key)?
            .ok_or(WalError::NotFound { offset })?;

        let record = decode_frame(&frame)?;
        if record.offset() != offset {
            return Err(WalError::OffsetMismatch {
                expected: offset,
                actual: record.offset(),
            });
        }

        self.observer.on_read(offset, frame.len());
        Ok(record)
    }

    /// Returns an iterator over consecutive records starting at `start`.
    ///
    /// Iteration ends at the first offset with no object. Records are
    /// fetched one at a time, so memory use does not grow with the log.
    #[must_use]
    pub fn iter_from(&self, start: u64) -> WalIterator<'_> {
        WalIterator::new(self, start)
    }
}
