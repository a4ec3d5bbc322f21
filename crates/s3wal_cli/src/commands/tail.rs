//! Tail command implementation.

use super::{RecordInfo, Target};
use crate::Format;

/// Runs the tail command.
///
/// Recovers the length of the log from a full listing and prints the
/// record at the end.
pub fn run(target: &Target, format: Format) -> Result<(), Box<dyn std::error::Error>> {
    let wal = target.handle()?;
    let record = wal.recover_tail()?;
    RecordInfo::new(&wal, &record).print(format)
}
