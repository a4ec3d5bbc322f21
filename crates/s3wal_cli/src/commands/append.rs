//! Append command implementation.

use super::Target;
use crate::Format;
use serde::Serialize;
use std::io::Read;
use std::path::Path;

#[derive(Debug, Serialize)]
struct AppendInfo {
    offset: u64,
    key: String,
    size: usize,
}

/// Runs the append command.
///
/// The payload comes from the argument, from `file`, or from stdin when
/// neither is given.
pub fn run(
    target: &Target,
    payload: Option<String>,
    file: Option<&Path>,
    format: Format,
) -> Result<(), Box<dyn std::error::Error>> {
    let data = match (payload, file) {
        (Some(text), _) => text.into_bytes(),
        (None, Some(path)) => std::fs::read(path)?,
        (None, None) => {
            let mut buf = Vec::new();
            std::io::stdin().read_to_end(&mut buf)?;
            buf
        }
    };

    let wal = target.open()?;
    let offset = wal.append(&data)?;
    let info = AppendInfo {
        offset,
        key: wal.keys().encode(offset),
        size: data.len(),
    };

    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&info)?),
        Format::Text => println!("Appended {} bytes at offset {} ({})", info.size, info.offset, info.key),
    }
    Ok(())
}
