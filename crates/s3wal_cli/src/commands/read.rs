//! Read and dump command implementations.

use super::{RecordInfo, Target};
use crate::Format;

/// Runs the read command.
pub fn run(target: &Target, offset: u64, format: Format) -> Result<(), Box<dyn std::error::Error>> {
    let wal = target.handle()?;
    let record = wal.read(offset)?;
    RecordInfo::new(&wal, &record).print(format)
}

/// Runs the dump command.
///
/// Prints consecutive records from `from` until the first missing offset
/// or `limit` records.
pub fn dump(
    target: &Target,
    from: u64,
    limit: Option<usize>,
    format: Format,
) -> Result<(), Box<dyn std::error::Error>> {
    let wal = target.handle()?;
    let limit = limit.unwrap_or(usize::MAX);

    let mut records = Vec::new();
    for record in wal.iter_from(from).take(limit) {
        records.push(RecordInfo::new(&wal, &record?));
    }

    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&records)?),
        Format::Text => {
            println!("Log {}/{}", wal.bucket(), wal.prefix());
            println!("{}", "=".repeat(60));
            for info in &records {
                println!("{}", info.line());
            }
            println!("{}", "=".repeat(60));
            println!("{} records", records.len());
        }
    }
    Ok(())
}
