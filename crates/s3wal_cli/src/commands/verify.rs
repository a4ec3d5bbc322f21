//! Verify command implementation.

use super::Target;
use crate::Format;
use s3wal_core::VerifyReport;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct VerifyInfo<'a> {
    bucket: &'a str,
    prefix: &'a str,
    ok: bool,
    records_checked: u64,
    valid_records: u64,
    max_offset: Option<u64>,
    missing_offsets: u64,
    corrupt: Vec<CorruptInfo<'a>>,
}

#[derive(Debug, Serialize)]
struct CorruptInfo<'a> {
    key: &'a str,
    reason: &'a str,
}

/// Runs the verify command.
///
/// Fails if any object is corrupt. Missing offsets below the tail are
/// reported but are not a failure.
pub fn run(target: &Target, format: Format) -> Result<(), Box<dyn std::error::Error>> {
    let wal = target.handle()?;
    let report = wal.verify()?;

    match format {
        Format::Json => {
            let info = VerifyInfo {
                bucket: wal.bucket(),
                prefix: wal.prefix(),
                ok: report.is_ok(),
                records_checked: report.records_checked,
                valid_records: report.valid_records,
                max_offset: report.max_offset,
                missing_offsets: report.missing_offsets,
                corrupt: report
                    .corrupt
                    .iter()
                    .map(|c| CorruptInfo {
                        key: &c.key,
                        reason: &c.reason,
                    })
                    .collect(),
            };
            println!("{}", serde_json::to_string_pretty(&info)?);
        }
        Format::Text => print_report(wal.bucket(), wal.prefix(), &report),
    }

    if report.is_ok() {
        Ok(())
    } else {
        Err("Verification failed".into())
    }
}

fn print_report(bucket: &str, prefix: &str, report: &VerifyReport) {
    println!("Verifying log {bucket}/{prefix}");
    println!();
    println!("  Records checked: {}", report.records_checked);
    println!("  Valid records:   {}", report.valid_records);
    println!("  Corrupt records: {}", report.corrupt.len());
    println!("  Missing offsets: {}", report.missing_offsets);
    if let Some(max) = report.max_offset {
        println!("  Tail offset:     {max}");
    }

    if !report.corrupt.is_empty() {
        println!("  Errors:");
        for c in report.corrupt.iter().take(10) {
            println!("    - {}: {}", c.key, c.reason);
        }
        if report.corrupt.len() > 10 {
            println!("    ... and {} more", report.corrupt.len() - 10);
        }
    }

    println!();
    if report.is_ok() {
        println!("✓ Log verification passed");
    } else {
        println!("✗ Log verification failed");
    }
}
