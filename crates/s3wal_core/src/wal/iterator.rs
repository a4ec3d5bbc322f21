//! Streaming iteration over consecutive records.

use crate::error::{WalError, WalResult};
use crate::wal::record::Record;
use crate::wal::writer::Wal;

/// Iterator over consecutive records of a log.
///
/// Created by [`Wal::iter_from`]. Yields records at `start`, `start + 1`, …
/// and stops at the first offset with no object. After yielding an error
/// the iterator is exhausted.
#[derive(Debug)]
pub struct WalIterator<'a> {
    wal: &'a Wal,
    next: Option<u64>,
}

impl<'a> WalIterator<'a> {
    pub(crate) fn new(wal: &'a Wal, start: u64) -> Self {
        Self {
            wal,
            next: Some(start.max(1)),
        }
    }
}

impl Iterator for WalIterator<'_> {
    type Item = WalResult<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        let offset = self.next.take()?;
        match self.wal.read(offset) {
            Ok(record) => {
                self.next = offset.checked_add(1);
                Some(Ok(record))
            }
            Err(WalError::NotFound { .. }) => None,
            Err(e) => Some(Err(e)),
        }
    }
}
