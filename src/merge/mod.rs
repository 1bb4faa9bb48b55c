//! Merge operations
//!
//! This module merges a source [`Document`] into a destination [`Document`].
//! The merge is right-biased and depth-first: source values win at every
//! leaf, nested mappings are merged recursively, and sequences are either
//! concatenated or replaced depending on [`MergeOptions::override_arrays`].
//!
//! Mixing container shapes is an error rather than a silent coercion:
//!
//! - A source mapping can only merge into a destination mapping whose values
//!   have a compatible [`Kind`] (`{"mars": "7777.9"}` does not merge into
//!   `{"venus": 34782.7}`).
//! - When sequences are concatenated, both sides must have a compatible
//!   element [`Kind`] (`[1, 2]` cannot be appended to `["a", "b"]`).
//!
//! A container whose values are of more than one kind accepts any values,
//! and an empty container is compatible with everything.
//!
//! Scalars are overwritten unconditionally and may change type.
//!
//! The flat `.env` format has its own degenerate merge in [`dotenv`].

pub mod dotenv;

use log::{debug, warn};

use crate::document::{Document, ElementType, Kind, Mapping};
use crate::error::{Error, Result};

/// Knobs for [`merge_documents`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MergeOptions {
    /// Replace destination sequences with source sequences instead of
    /// appending source elements after the destination elements.
    pub override_arrays: bool,
}

impl MergeOptions {
    pub fn with_override_arrays(mut self, override_arrays: bool) -> Self {
        self.override_arrays = override_arrays;
        self
    }
}

/// Merge `source` into `destination` in place.
///
/// When either document is not a mapping at the top level there is nothing
/// to merge and `destination` is left as it is.
///
/// The merge runs against a staged copy of the destination mapping, so on
/// error `destination` is untouched.
///
/// # Errors
///
/// Returns `Error::TypeMismatch` when a source mapping or sequence meets an
/// incompatible destination container.
///
/// # Examples
///
/// ```
/// use file_transformer::document::Document;
/// use file_transformer::merge::{merge_documents, MergeOptions};
///
/// let mut destination: Document = serde_json::from_str(r#"{"clubs": ["Roma"]}"#).unwrap();
/// let source: Document = serde_json::from_str(r#"{"clubs": ["Porto"]}"#).unwrap();
///
/// merge_documents(&mut destination, source, MergeOptions::default()).unwrap();
/// assert_eq!(
///     destination,
///     serde_json::from_str::<Document>(r#"{"clubs": ["Roma", "Porto"]}"#).unwrap()
/// );
/// ```
pub fn merge_documents(
    destination: &mut Document,
    source: Document,
    options: MergeOptions,
) -> Result<()> {
    let (Document::Mapping(source_map), Some(destination_map)) =
        (source, destination.as_mapping_mut())
    else {
        debug!("Top-level documents are not both mappings; nothing to merge");
        return Ok(());
    };

    let mut staged = destination_map.clone();
    merge_mappings(&mut staged, source_map, options, "")?;
    *destination_map = staged;
    Ok(())
}

/// Merge every key of `source` into `target`.
fn merge_mappings(
    target: &mut Mapping,
    source: Mapping,
    options: MergeOptions,
    path: &str,
) -> Result<()> {
    for (key, value) in source {
        let key_path = join_path(path, &key);

        let Some(existing) = target.get_mut(&key) else {
            target.insert(key, value);
            continue;
        };

        match value {
            Document::Mapping(source_map) if !existing.is_null() => {
                let Document::Mapping(existing_map) = existing else {
                    return Err(type_mismatch(
                        &key_path,
                        "mapping",
                        Document::Mapping(source_map).type_name(),
                        existing.type_name(),
                    ));
                };
                check_mapping_kinds(existing_map, &source_map, &key_path)?;
                merge_mappings(existing_map, source_map, options, &key_path)?;
            }
            Document::Sequence(source_items) if existing.as_sequence().is_some() => {
                merge_sequences(existing, source_items, options, &key_path)?;
            }
            value => {
                if existing.is_container() && existing.kind() != value.kind() {
                    warn!(
                        "Overwriting value at path '{}': {} -> {}",
                        key_path,
                        existing.type_name(),
                        value.type_name()
                    );
                }
                *existing = value;
            }
        }
    }

    Ok(())
}

/// Concatenate or replace a destination sequence.
fn merge_sequences(
    existing: &mut Document,
    source_items: Vec<Document>,
    options: MergeOptions,
    path: &str,
) -> Result<()> {
    if options.override_arrays {
        debug!(
            "Replacing array at path '{}' (new size: {})",
            path,
            source_items.len()
        );
        *existing = Document::Sequence(source_items);
        return Ok(());
    }

    let Document::Sequence(target_items) = existing else {
        return Ok(());
    };

    let target_type = ElementType::of(target_items.iter(), Document::kind);
    let source_type = ElementType::of(source_items.iter(), Document::kind);
    if !source_type.is_compatible_with(&target_type) {
        return Err(type_mismatch(
            path,
            "sequence",
            sequence_type_name(source_type),
            sequence_type_name(target_type),
        ));
    }

    debug!(
        "Appending {} item(s) to array at path '{}'",
        source_items.len(),
        path
    );
    target_items.extend(source_items);
    Ok(())
}

/// A source mapping may only merge into a destination mapping whose values
/// have a compatible kind.
fn check_mapping_kinds(target: &Mapping, source: &Mapping, path: &str) -> Result<()> {
    let target_type = ElementType::of(target.values(), Document::kind);
    let source_type = ElementType::of(source.values(), Document::kind);
    if source_type.is_compatible_with(&target_type) {
        Ok(())
    } else {
        Err(type_mismatch(
            path,
            "mapping",
            format!("mapping<{}>", source_type),
            format!("mapping<{}>", target_type),
        ))
    }
}

fn sequence_type_name(element: ElementType<Kind>) -> String {
    format!("sequence<{}>", element)
}

fn type_mismatch(
    path: &str,
    container: &'static str,
    source_type: String,
    destination_type: String,
) -> Error {
    Error::TypeMismatch {
        path: path.to_string(),
        container,
        source_type,
        destination_type,
    }
}

fn join_path(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", parent, key)
    }
}
