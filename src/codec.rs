//! Format codec registry
//!
//! Maps a file extension to the functions that decode bytes into a
//! [`Document`] and encode a [`Document`] back into bytes. Two structured
//! formats are registered by [`CodecRegistry::new`]:
//!
//! - JSON (`.json`), pretty-printed on output. JSON has no NaN or infinity,
//!   so a non-finite float is an encode error instead of becoming `null`.
//! - YAML (`.yaml`, `.yml`)
//!
//! Extension matching is exact and case-sensitive. The flat `.env` format is
//! deliberately absent: it never goes through the [`Document`] model and is
//! handled by [`crate::merge::dotenv`].
//!
//! The registry is an ordinary value, built once by the caller and passed to
//! the [`crate::transform::Transformer`].

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use crate::document::Document;
use crate::error::{Error, Result};

/// Decode raw bytes into a document. The error is the decoder's message.
pub type DecodeFn = fn(&[u8]) -> std::result::Result<Document, String>;

/// Encode a document into raw bytes. The error is the encoder's message.
pub type EncodeFn = fn(&Document) -> std::result::Result<Vec<u8>, String>;

/// A decode/encode pair for one structured format.
#[derive(Clone, Copy)]
pub struct Codec {
    /// Short format name used in error messages.
    pub format: &'static str,
    decode: DecodeFn,
    encode: EncodeFn,
}

impl Codec {
    pub fn new(format: &'static str, decode: DecodeFn, encode: EncodeFn) -> Self {
        Self {
            format,
            decode,
            encode,
        }
    }

    /// Decode the content of the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns `Error::Decode` naming `path` when the content is malformed.
    pub fn decode_file(&self, path: &Path, bytes: &[u8]) -> Result<Document> {
        (self.decode)(bytes).map_err(|message| Error::decode_file(self.format, path, message))
    }

    /// Encode a document, ensuring the output ends with a newline.
    ///
    /// # Errors
    ///
    /// Returns `Error::Encode` when the encoder rejects the document.
    pub fn encode(&self, document: &Document) -> Result<Vec<u8>> {
        let mut bytes = (self.encode)(document).map_err(|message| Error::Encode {
            format: self.format,
            message,
        })?;
        if bytes.last() != Some(&b'\n') {
            bytes.push(b'\n');
        }
        Ok(bytes)
    }
}

impl fmt::Debug for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Codec").field("format", &self.format).finish()
    }
}

/// Extension to codec lookup table.
#[derive(Clone, Debug)]
pub struct CodecRegistry {
    codecs: HashMap<String, Codec>,
}

impl Default for CodecRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl CodecRegistry {
    /// Registry with the built-in JSON and YAML codecs.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        let json = Codec::new("json", decode_json, encode_json);
        let yaml = Codec::new("yaml", decode_yaml, encode_yaml);
        registry.register(".json", json);
        registry.register(".yaml", yaml);
        registry.register(".yml", yaml);
        registry
    }

    /// Registry with no codecs at all.
    pub fn empty() -> Self {
        Self {
            codecs: HashMap::new(),
        }
    }

    /// Register `codec` for `extension` (including the leading dot),
    /// replacing any previous registration.
    pub fn register(&mut self, extension: &str, codec: Codec) {
        self.codecs.insert(extension.to_string(), codec);
    }

    /// Look up the codec for an extension such as `".json"`.
    pub fn get(&self, extension: &str) -> Option<&Codec> {
        self.codecs.get(extension)
    }

    /// Look up the codec for a path by its extension.
    ///
    /// # Errors
    ///
    /// Returns `Error::UnsupportedExtension` when no codec is registered.
    pub fn for_path(&self, path: &Path) -> Result<&Codec> {
        extension_of(path)
            .and_then(|ext| self.get(&ext))
            .ok_or_else(|| Error::UnsupportedExtension {
                path: path.to_path_buf(),
                supported: self.extensions().join(" "),
            })
    }

    /// Registered extensions, sorted.
    pub fn extensions(&self) -> Vec<&str> {
        let mut extensions: Vec<&str> = self.codecs.keys().map(String::as_str).collect();
        extensions.sort_unstable();
        extensions
    }
}

/// Extension of `path` with its leading dot, e.g. `".yml"`.
///
/// Everything from the last dot of the file name counts, so a dotfile such
/// as `.env` has the extension `".env"`.
pub fn extension_of(path: &Path) -> Option<String> {
    let name = path.file_name()?.to_str()?;
    name.rfind('.').map(|pos| name[pos..].to_string())
}

fn decode_json(bytes: &[u8]) -> std::result::Result<Document, String> {
    serde_json::from_slice(bytes).map_err(|err| err.to_string())
}

fn encode_json(document: &Document) -> std::result::Result<Vec<u8>, String> {
    check_finite(document, "")?;
    serde_json::to_vec_pretty(document).map_err(|err| err.to_string())
}

fn check_finite(document: &Document, path: &str) -> std::result::Result<(), String> {
    match document {
        Document::Float(n) if !n.is_finite() => Err(format!(
            "cannot represent float {} at '{}' in JSON",
            n,
            if path.is_empty() { "<root>" } else { path }
        )),
        Document::Sequence(items) => items
            .iter()
            .enumerate()
            .try_for_each(|(index, item)| check_finite(item, &format!("{}[{}]", path, index))),
        Document::Mapping(map) => map.iter().try_for_each(|(key, value)| {
            let key_path = if path.is_empty() {
                key.clone()
            } else {
                format!("{}.{}", path, key)
            };
            check_finite(value, &key_path)
        }),
        _ => Ok(()),
    }
}

fn decode_yaml(bytes: &[u8]) -> std::result::Result<Document, String> {
    serde_yaml::from_slice(bytes).map_err(|err| err.to_string())
}

fn encode_yaml(document: &Document) -> std::result::Result<Vec<u8>, String> {
    serde_yaml::to_string(document)
        .map(String::into_bytes)
        .map_err(|err| err.to_string())
}
