//! # File Transformer CLI
//!
//! This is the binary entry point for the `file-transformer` command-line tool.
//!
//! Its primary responsibilities are:
//! - Parsing command-line arguments using `clap`.
//! - Executing the appropriate command based on the parsed arguments.
//! - Reporting a failed transform as a single error message and exit code.
//!
//! The merge logic lives in the `file_transformer` library crate; the binary
//! is a thin wrapper around it.

mod cli;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    cli.execute()
}
