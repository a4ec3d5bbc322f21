//! CLI command implementations.

pub mod append;
pub mod read;
pub mod tail;
pub mod verify;

use crate::Format;
use s3wal_core::{FileObjectStore, Record, Wal, WalConfig};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

/// The log a command operates on.
#[derive(Debug, Clone)]
pub struct Target {
    /// Root directory of the object store.
    pub root: PathBuf,
    /// Bucket holding the log.
    pub bucket: String,
    /// Prefix of the log.
    pub prefix: String,
    /// Retry bound for appends.
    pub max_retries: u32,
}

impl Target {
    fn store(&self) -> Result<Arc<FileObjectStore>, Box<dyn std::error::Error>> {
        if !self.root.is_dir() {
            return Err(format!("Store root not found: {:?}", self.root).into());
        }
        Ok(Arc::new(FileObjectStore::open(&self.root)?))
    }

    fn config(&self) -> WalConfig {
        WalConfig::new().max_append_retries(self.max_retries)
    }

    fn check_names(&self) -> Result<(), Box<dyn std::error::Error>> {
        if self.bucket.trim().is_empty() || self.prefix.trim().is_empty() {
            return Err("Bucket and prefix must not be blank".into());
        }
        Ok(())
    }

    /// Creates a handle without touching the store.
    pub fn handle(&self) -> Result<Wal, Box<dyn std::error::Error>> {
        self.check_names()?;
        Ok(Wal::new(
            self.store()?,
            self.bucket.as_str(),
            self.prefix.as_str(),
            self.config(),
        ))
    }

    /// Creates a handle whose length is recovered from the store.
    pub fn open(&self) -> Result<Wal, Box<dyn std::error::Error>> {
        self.check_names()?;
        Ok(Wal::open(
            self.store()?,
            self.bucket.as_str(),
            self.prefix.as_str(),
            self.config(),
        )?)
    }
}

/// Printable form of a record.
#[derive(Debug, Serialize)]
pub struct RecordInfo {
    /// Offset of the record.
    pub offset: u64,
    /// Object key holding the record.
    pub key: String,
    /// Payload size in bytes.
    pub size: usize,
    /// Payload as text, when it is valid UTF-8.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Payload as lowercase hex.
    pub hex: String,
}

impl RecordInfo {
    /// Describes `record` as stored by `wal`.
    pub fn new(wal: &Wal, record: &Record) -> Self {
        let payload = record.payload();
        Self {
            offset: record.offset(),
            key: wal.keys().encode(record.offset()),
            size: payload.len(),
            text: std::str::from_utf8(payload).ok().map(str::to_owned),
            hex: payload.iter().map(|b| format!("{b:02x}")).collect(),
        }
    }

    /// Prints the record in `format`.
    pub fn print(&self, format: Format) -> Result<(), Box<dyn std::error::Error>> {
        match format {
            Format::Json => println!("{}", serde_json::to_string_pretty(self)?),
            Format::Text => println!("{}", self.line()),
        }
        Ok(())
    }

    /// One-line text rendering.
    pub fn line(&self) -> String {
        match &self.text {
            Some(text) => format!("{:>8}  {:>6} bytes  {}", self.offset, self.size, text),
            None => format!("{:>8}  {:>6} bytes  0x{}", self.offset, self.size, self.hex),
        }
    }
}
