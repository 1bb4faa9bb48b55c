//! # File Transformer Library
//!
//! This library merges a JSON "items" payload into a JSON, YAML or `.env`
//! file on disk. It backs the `file-transformer` command-line tool and can be
//! embedded in any program that needs to patch configuration files in place.
//!
//! ## Quick Example
//!
//! ```
//! use file_transformer::codec::CodecRegistry;
//! use file_transformer::transform::{TransformJob, Transformer};
//!
//! let dir = tempfile::tempdir().unwrap();
//! let path = dir.path().join("conf").join("app.json");
//!
//! let registry = CodecRegistry::new();
//! let transformer = Transformer::new(&registry);
//!
//! transformer
//!     .transform(&TransformJob::new(&path, r#"{"clubs": ["Roma"]}"#))
//!     .unwrap();
//! transformer
//!     .transform(&TransformJob::new(&path, r#"{"clubs": ["Porto"]}"#))
//!     .unwrap();
//!
//! let merged: serde_json::Value =
//!     serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
//! assert_eq!(merged["clubs"], serde_json::json!(["Roma", "Porto"]));
//! ```
//!
//! ## Core Concepts
//!
//! - **Documents (`document`)**: the mapping / sequence / scalar tree every
//!   structured file is decoded into.
//! - **Codecs (`codec`)**: an explicit registry from file extension to a
//!   decode and an encode function (JSON, YAML).
//! - **Merge (`merge`)**: the right-biased deep merge with sequence append or
//!   override, plus the flat `.env` merge in `merge::dotenv`.
//! - **Transform (`transform`)**: the pipeline that reads a file, merges the
//!   payload into it and writes the result back.
//! - **Errors (`error`)**: one error type for the whole library.

pub mod codec;
pub mod document;
pub mod error;
pub mod merge;
pub mod transform;

#[cfg(test)]
mod merge_proptest;
