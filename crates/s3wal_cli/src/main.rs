//! s3wal CLI
//!
//! Command-line tools for logs kept in a local object store directory.
//!
//! # Commands
//!
//! - `append` - Append a record
//! - `read` - Read the record at an offset
//! - `tail` - Recover and print the last record
//! - `verify` - Check every object of the log
//! - `dump` - Print consecutive records

mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// s3wal command-line log tools.
#[derive(Parser)]
#[command(name = "s3wal")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Root directory of the object store
    #[arg(global = true, short, long)]
    root: Option<PathBuf>,

    /// Bucket holding the log
    #[arg(global = true, short, long, default_value = "default")]
    bucket: String,

    /// Prefix of the log inside the bucket
    #[arg(global = true, short, long, default_value = "wal")]
    prefix: String,

    /// Retries after losing the race for an offset
    #[arg(global = true, long, default_value_t = 16)]
    max_retries: u32,

    /// Output format
    #[arg(global = true, short, long, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Output format of a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    /// Human-readable text
    Text,
    /// JSON
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Append a record
    Append {
        /// Payload to append
        #[arg(conflicts_with = "file")]
        payload: Option<String>,

        /// Read the payload from a file
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Read the record at an offset
    Read {
        /// Offset of the record
        offset: u64,
    },

    /// Recover the log tail and print the last record
    Tail,

    /// Verify every object of the log
    Verify,

    /// Print consecutive records
    Dump {
        /// Start from this offset
        #[arg(long, default_value = "1")]
        from: u64,

        /// Maximum number of records to print
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let target = || -> Result<commands::Target, Box<dyn std::error::Error>> {
        Ok(commands::Target {
            root: cli.root.clone().ok_or("Store root required (--root)")?,
            bucket: cli.bucket.clone(),
            prefix: cli.prefix.clone(),
            max_retries: cli.max_retries,
        })
    };

    match &cli.command {
        Commands::Append { payload, file } => {
            commands::append::run(&target()?, payload.clone(), file.as_deref(), cli.format)?;
        }
        Commands::Read { offset } => {
            commands::read::run(&target()?, *offset, cli.format)?;
        }
        Commands::Tail => {
            commands::tail::run(&target()?, cli.format)?;
        }
        Commands::Verify => {
            commands::verify::run(&target()?, cli.format)?;
        }
        Commands::Dump { from, limit } => {
            commands::read::dump(&target()?, *from, *limit, cli.format)?;
        }
        Commands::Version => {
            println!("s3wal CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("s3wal core v{}", s3wal_core::VERSION);
        }
    }

    Ok(())
}
