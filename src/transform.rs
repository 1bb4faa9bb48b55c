//! File transform pipeline
//!
//! Ties the codec registry, the deep merge and the filesystem together. A
//! [`TransformJob`] names an input file, a JSON items payload and an optional
//! output file; [`Transformer::transform`] runs it:
//!
//! 1.  **Validate**: reject unsupported extensions before touching the disk.
//! 2.  **Prepare**: create the input file's parent directories and open (or
//!     create) the input file without truncating it.
//! 3.  **Read**: load the current content into memory.
//! 4.  **Merge**: for `.env` files, merge the flat maps and rewrite the input
//!     file. For JSON/YAML, decode the current content (empty means an empty
//!     mapping), decode the items payload as JSON, deep-merge, and encode with
//!     the codec selected by the output path.
//! 5.  **Write**: only once encoding succeeded, open/create/truncate the output
//!     file and write the merged bytes.
//!
//! Only the input file's directory is created. A missing output directory is
//! reported as an I/O error.
//!
//! There is no locking: two concurrent transforms of the same file race and
//! the last writer wins.

use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use crate::codec::{extension_of, CodecRegistry};
use crate::document::Document;
use crate::error::{Error, Result};
use crate::merge::dotenv;
use crate::merge::{merge_documents, MergeOptions};

/// Extension of the flat `KEY=VALUE` format.
pub const ENV_EXTENSION: &str = ".env";

/// One invocation of the pipeline.
#[derive(Clone, Debug, PartialEq)]
pub struct TransformJob {
    /// File to read and merge into. Created when missing.
    pub input: PathBuf,
    /// Payload to merge: JSON text, or `KEY=VALUE` lines for `.env` input.
    pub items: String,
    /// Where to write the merged result. `None` means `input`.
    pub output: Option<PathBuf>,
    pub options: MergeOptions,
}

impl TransformJob {
    pub fn new(input: impl Into<PathBuf>, items: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            items: items.into(),
            output: None,
            options: MergeOptions::default(),
        }
    }

    pub fn with_output(mut self, output: impl Into<PathBuf>) -> Self {
        self.output = Some(output.into());
        self
    }

    pub fn with_override_arrays(mut self, override_arrays: bool) -> Self {
        self.options = self.options.with_override_arrays(override_arrays);
        self
    }

    /// The output path, defaulting to the input path.
    pub fn output_path(&self) -> &Path {
        self.output.as_deref().unwrap_or(&self.input)
    }

    /// True when the input file uses the flat `.env` format.
    pub fn is_env(&self) -> bool {
        extension_of(&self.input).as_deref() == Some(ENV_EXTENSION)
    }

    /// Check both paths against the registry. Performs no I/O.
    ///
    /// The input may be any registered extension or `.env`; the output must
    /// be a registered extension.
    ///
    /// # Errors
    ///
    /// Returns `Error::UnsupportedExtension` for the first offending path.
    pub fn validate(&self, registry: &CodecRegistry) -> Result<()> {
        if !self.is_env() && registry.for_path(&self.input).is_err() {
            let mut supported = registry.extensions();
            supported.push(ENV_EXTENSION);
            return Err(Error::UnsupportedExtension {
                path: self.input.clone(),
                supported: supported.join(" "),
            });
        }
        if let Some(output) = &self.output {
            registry.for_path(output)?;
        }
        Ok(())
    }
}

/// Runs [`TransformJob`]s against a codec registry.
#[derive(Clone, Copy, Debug)]
pub struct Transformer<'a> {
    registry: &'a CodecRegistry,
}

impl<'a> Transformer<'a> {
    pub fn new(registry: &'a CodecRegistry) -> Self {
        Self { registry }
    }

    /// Merge the job's items into its input file and write the result.
    ///
    /// # Errors
    ///
    /// Returns the first validation, I/O, decode, merge or encode failure.
    /// For JSON and YAML the output file is untouched unless merge and
    /// encode both succeeded.
    pub fn transform(&self, job: &TransformJob) -> Result<()> {
        job.validate(self.registry)?;

        let mut file = open_input(&job.input)?;
        let content = read_all(&mut file, &job.input)?;

        if job.is_env() {
            if job.output_path() != job.input {
                warn!(
                    "Output path '{}' ignored for .env input '{}'",
                    job.output_path().display(),
                    job.input.display()
                );
            }
            return self.transform_env(file, &content, job);
        }
        drop(file);

        self.transform_structured(&content, job)
    }

    fn transform_env(&self, mut file: File, content: &[u8], job: &TransformJob) -> Result<()> {
        let existing = std::str::from_utf8(content)
            .map_err(|err| Error::decode_file("env", &job.input, err))?;
        let merged = dotenv::merge_env_content(existing, &job.items, &job.input)?;

        file.seek(SeekFrom::Start(0))
            .and_then(|_| file.set_len(0))
            .and_then(|_| file.write_all(merged.as_bytes()))
            .and_then(|_| file.sync_all())
            .map_err(|err| Error::io("write", &job.input, err))?;

        info!("Merged items into {}", job.input.display());
        Ok(())
    }

    fn transform_structured(&self, content: &[u8], job: &TransformJob) -> Result<()> {
        let decoder = self.registry.for_path(&job.input)?;
        let output = job.output_path();
        let encoder = self.registry.for_path(output)?;

        let mut destination = if content.is_empty() {
            debug!("{} is empty, starting from an empty mapping", job.input.display());
            Document::empty_mapping()
        } else {
            let decoded = decoder.decode_file(&job.input, content)?;
            root_mapping(decoded, decoder.format, || {
                format!("file {}", job.input.display())
            })?
        };

        let items: Document = serde_json::from_str(&job.items)
            .map_err(|err| Error::decode_items("json", err))?;
        let items = root_mapping(items, "json", || "items payload".to_string())?;

        merge_documents(&mut destination, items, job.options)?;
        let bytes = encoder.encode(&destination)?;

        write_output(output, &bytes)?;
        info!(
            "Merged items from {} into {} ({})",
            job.input.display(),
            output.display(),
            encoder.format
        );
        Ok(())
    }
}

/// A structured root must be a mapping; `null` (e.g. a comment-only YAML
/// file) counts as an empty one.
fn root_mapping(
    document: Document,
    format: &'static str,
    origin: impl FnOnce() -> String,
) -> Result<Document> {
    match document {
        Document::Mapping(_) => Ok(document),
        Document::Null => Ok(Document::empty_mapping()),
        other => Err(Error::Decode {
            format,
            origin: origin(),
            message: format!("expected a mapping at the top level, found {}", other.kind()),
        }),
    }
}

/// Create missing parent directories, then open or create `path` for
/// reading and writing without truncating it.
fn open_input(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if !parent.exists() {
            debug!("Creating directory {}", parent.display());
            fs::create_dir_all(parent).map_err(|err| Error::io("create directory", parent, err))?;
        }
    }

    OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)
        .map_err(|err| Error::io("open", path, err))
}

fn read_all(file: &mut File, path: &Path) -> Result<Vec<u8>> {
    let mut content = Vec::new();
    file.read_to_end(&mut content)
        .map_err(|err| Error::io("read", path, err))?;
    Ok(content)
}

/// Replace the whole content of `path` with `bytes`.
fn write_output(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
        .map_err(|err| Error::io("open", path, err))?;
    file.write_all(bytes)
        .and_then(|_| file.sync_all())
        .map_err(|err| Error::io("write", path, err))
}
