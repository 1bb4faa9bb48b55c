//! # Error Handling
//!
//! This module defines the single error type returned by every fallible
//! operation in `file-transformer`. It uses `thiserror` to derive descriptive
//! messages so that a caller receives one self-explanatory error value per
//! failed transform.
//!
//! ## Taxonomy
//!
//! - **`UnsupportedExtension`**: the path extension has no codec. Raised by
//!   validation, before any I/O takes place.
//! - **`Io`**: an open, read, write or directory-creation failure. The
//!   offending path and the original OS error are both kept.
//! - **`Decode`**: malformed JSON, YAML or `.env` content. The `origin`
//!   names the file that failed, or the items payload.
//! - **`Encode`**: the merged document could not be serialized.
//! - **`TypeMismatch`**: the merge met two containers whose element types
//!   cannot be combined.
//!
//! None of these are retried; every failure aborts the current transform.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Main error type for file-transformer operations
#[derive(Error, Debug)]
pub enum Error {
    /// The path extension is not handled by any registered codec.
    #[error("The file extension of '{path}' is not supported. The supported extensions are the following: {supported}")]
    UnsupportedExtension { path: PathBuf, supported: String },

    /// An I/O error against a specific path.
    #[error("Failed to {operation} '{path}': {source}")]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Existing content or the items payload could not be decoded.
    #[error("Content of {origin} is malformed ({format}): {message}")]
    Decode {
        format: &'static str,
        origin: String,
        message: String,
    },

    /// The merged document could not be encoded.
    #[error("Failed to encode {format}: {message}")]
    Encode {
        format: &'static str,
        message: String,
    },

    /// Two containers with incompatible element types met during a merge.
    #[error("{}Cannot append two {container}s with different type ({source_type}, {destination_type})", key_prefix(path))]
    TypeMismatch {
        path: String,
        container: &'static str,
        source_type: String,
        destination_type: String,
    },
}

fn key_prefix(path: &str) -> String {
    if path.is_empty() {
        String::new()
    } else {
        format!("at '{}': ", path)
    }
}

impl Error {
    /// Wrap an `std::io::Error` with the path and the operation that failed.
    pub fn io(operation: &'static str, path: &Path, source: std::io::Error) -> Self {
        Error::Io {
            operation,
            path: path.to_path_buf(),
            source,
        }
    }

    /// Decode failure for the content of a file on disk.
    pub fn decode_file(format: &'static str, path: &Path, message: impl ToString) -> Self {
        Error::Decode {
            format,
            origin: format!("file {}", path.display()),
            message: message.to_string(),
        }
    }

    /// Decode failure for the incoming items payload.
    pub fn decode_items(format: &'static str, message: impl ToString) -> Self {
        Error::Decode {
            format,
            origin: "items payload".to_string(),
            message: message.to_string(),
        }
    }

    /// True when the error came from the merge type checks.
    pub fn is_type_mismatch(&self) -> bool {
        matches!(self, Error::TypeMismatch { .. })
    }
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
