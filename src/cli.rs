//! CLI argument parsing and command dispatch

use std::io::Read;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgGroup, Args, Parser, Subcommand};
use log::LevelFilter;

use file_transformer::codec::CodecRegistry;
use file_transformer::transform::{TransformJob, Transformer};

/// File Transformer - Merge JSON, YAML and .env payloads into files
#[derive(Parser, Debug)]
#[command(name = "file-transformer")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Set log level (off, error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL", default_value = "warn")]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Merge items into a file, creating it when it does not exist
    Transform(TransformArgs),
}

/// Arguments for the transform command
#[derive(Args, Debug)]
#[command(group(
    ArgGroup::new("payload")
        .required(true)
        .args(["items", "items_file"])
))]
pub struct TransformArgs {
    /// File to merge into (.json, .yaml, .yml or .env)
    #[arg(short, long, value_name = "PATH", env = "FILE_TRANSFORMER_FILE")]
    pub file: PathBuf,

    /// Items to merge: JSON text (KEY=VALUE lines for .env files), or - for stdin
    #[arg(short, long, value_name = "ITEMS")]
    pub items: Option<String>,

    /// Read the items from a file instead of the command line
    #[arg(long, value_name = "PATH")]
    pub items_file: Option<PathBuf>,

    /// Write the merged result here instead of back into FILE
    #[arg(short, long, value_name = "PATH", env = "FILE_TRANSFORMER_OUTPUT")]
    pub output: Option<PathBuf>,

    /// Replace arrays instead of appending to them
    #[arg(long, env = "FILE_TRANSFORMER_OVERRIDE_ARRAYS")]
    pub override_array_items: bool,
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        init_logging(&self.log_level)?;

        match self.command {
            Commands::Transform(args) => transform(args),
        }
    }
}

/// `RUST_LOG` wins over `--log-level` when set.
fn init_logging(level: &str) -> Result<()> {
    let level: LevelFilter = level
        .parse()
        .map_err(|_| anyhow::anyhow!("Invalid log level: {}", level))?;
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .init();
    Ok(())
}

fn transform(args: TransformArgs) -> Result<()> {
    let items = read_items(&args)?;

    let mut job =
        TransformJob::new(args.file, items).with_override_arrays(args.override_array_items);
    if let Some(output) = args.output {
        job = job.with_output(output);
    }

    let registry = CodecRegistry::new();
    Transformer::new(&registry)
        .transform(&job)
        .with_context(|| format!("Failed to transform {}", job.input.display()))
}

fn read_items(args: &TransformArgs) -> Result<String> {
    if let Some(path) = &args.items_file {
        return std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read items file {}", path.display()));
    }

    match args.items.as_deref() {
        Some("-") => {
            let mut items = String::new();
            std::io::stdin()
                .read_to_string(&mut items)
                .context("Failed to read items from stdin")?;
            Ok(items)
        }
        Some(items) => Ok(items.to_string()),
        None => anyhow::bail!("Either --items or --items-file is required"),
    }
}
