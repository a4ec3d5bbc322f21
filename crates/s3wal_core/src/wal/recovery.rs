//! Tail discovery and namespace verification.

use crate::error::{WalError, WalResult};
use crate::wal::record::Record;
use crate::wal::writer::Wal;
use tracing::{info, warn};

/// An object that failed verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorruptObject {
    /// Key of the object.
    pub key: String,
    /// Why the object was rejected.
    pub reason: String,
}

/// Result of [`Wal::verify`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerifyReport {
    /// Number of keys found under the prefix.
    pub records_checked: u64,
    /// Number of objects that decoded and validated cleanly.
    pub valid_records: u64,
    /// Objects with malformed keys or damaged frames.
    pub corrupt: Vec<CorruptObject>,
    /// Highest offset among well-formed keys.
    pub max_offset: Option<u64>,
    /// Offsets between 1 and `max_offset` with no object.
    pub missing_offsets: u64,
}

impl VerifyReport {
    /// Returns `true` if no corrupt object was found.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.corrupt.is_empty()
    }
}

impl Wal {
    /// Finds the last record of the log and resets the length to its offset.
    ///
    /// Every page of the listing is drained before the tail is decided, and
    /// only offsets are held in memory while doing so. The tail record is
    /// then read and validated.
    ///
    /// This is the reconciliation step after a restart or after any call
    /// whose outcome is unknown.
    ///
    /// # Errors
    ///
    /// - [`WalError::EmptyLog`] if the namespace holds no objects
    /// - [`WalError::InvalidKey`] if any key under the prefix is malformed
    /// - Any error of [`Wal::read`] for the tail record
    pub fn recover_tail(&self) -> WalResult<Record> {
        self.recover_tail_inner().map_err(|e| self.report(e))
    }

    fn recover_tail_inner(&self) -> WalResult<Record> {
        let mut max_offset = 0u64;
        let mut scanned = 0u64;

        self.for_each_key(|key| {
            let offset = self.keys.decode(key).inspect_err(|e| {
                warn!(key, error = %e, "foreign or malformed object under log prefix");
            })?;
            max_offset = max_offset.max(offset);
            scanned += 1;
            Ok(())
        })?;

        if scanned == 0 {
            return Err(WalError::EmptyLog);
        }

        self.reset_length(max_offset);
        let record = self.read_inner(max_offset)?;

        info!(
            offset = max_offset,
            keys = scanned,
            prefix = self.keys.prefix(),
            "recovered log tail"
        );
        self.observer.on_tail_recovered(max_offset, scanned);
        Ok(record)
    }

    /// Checks every object under the prefix.
    ///
    /// Unlike [`Wal::recover_tail`] this does not stop at the first bad
    /// object: malformed keys and damaged frames are collected in the report.
    /// The length is left unchanged.
    ///
    /// # Errors
    ///
    /// Returns an error only if the store fails.
    pub fn verify(&self) -> WalResult<VerifyReport> {
        let mut report = VerifyReport::default();
        let mut previous = 0u64;

        self.for_each_key(|key| {
            report.records_checked += 1;

            let offset = match self.keys.decode(key) {
                Ok(offset) => offset,
                Err(e) => {
                    report.corrupt.push(CorruptObject {
                        key: key.to_string(),
                        reason: e.to_string(),
                    });
                    return Ok(());
                }
            };

            if offset <= previous {
                report.corrupt.push(CorruptObject {
                    key: key.to_string(),
                    reason: format!("listed out of order after offset {previous}"),
                });
                return Ok(());
            }
            report.missing_offsets += offset - previous - 1;
            previous = offset;
            report.max_offset = Some(offset);

            match self.read(offset) {
                Ok(_) => report.valid_records += 1,
                Err(WalError::Storage(e)) => return Err(WalError::Storage(e)),
                Err(e) => report.corrupt.push(CorruptObject {
                    key: key.to_string(),
                    reason: e.to_string(),
                }),
            }
            Ok(())
        })?;

        if !report.is_ok() {
            warn!(
                corrupt = report.corrupt.len(),
                prefix = self.keys.prefix(),
                "verification found damaged objects"
            );
        }
        Ok(report)
    }

    /// Calls `f` with every key under the prefix, draining all listing pages.
    fn for_each_key<F>(&self, mut f: F) -> WalResult<()>
    where
        F: FnMut(&str) -> WalResult<()>,
    {
        let prefix = self.keys.list_prefix();
        let mut continuation: Option<String> = None;

        loop {
            let page = self
                .store
                .list(&self.bucket, prefix, continuation.as_deref())?;
            for key in &page.keys {
                f(key)?;
            }
            match page.next {
                Some(next) => continuation = Some(next),
                None => return Ok(()),
            }
        }
    }
}
