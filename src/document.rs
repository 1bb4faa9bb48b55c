//! # Document Value Model
//!
//! Every structured file handled by `file-transformer` is decoded into a
//! [`Document`]: a closed tree of mappings, sequences and scalars. The serde
//! implementations are hand-written so that any self-describing format (JSON
//! and YAML here) decodes straight into this tree and back out again.
//!
//! Numbers keep the representation the decoder produced. `1` decodes to
//! [`Document::Integer`] and `1.0` to [`Document::Float`]; they are different
//! element types when the merge checks container compatibility. Integers
//! above `i64::MAX` are kept exactly as [`Document::Unsigned`].
//!
//! Scalar mapping keys are stored by their textual form. Two keys that only
//! differ before that conversion (`1:` and `1.0:`) are a decode error rather
//! than a silent overwrite.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::{self, Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

/// Key to value collection with unique string keys.
pub type Mapping = BTreeMap<String, Document>;

/// A decoded structured document.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Document {
    #[default]
    Null,
    Bool(bool),
    Integer(i64),
    /// Integer too large for `i64`.
    Unsigned(u64),
    Float(f64),
    String(String),
    Sequence(Vec<Document>),
    Mapping(Mapping),
}

/// The concrete type of a single value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Kind {
    Null,
    Bool,
    Integer,
    Float,
    String,
    Sequence,
    Mapping,
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Kind::Null => "null",
            Kind::Bool => "bool",
            Kind::Integer => "integer",
            Kind::Float => "float",
            Kind::String => "string",
            Kind::Sequence => "sequence",
            Kind::Mapping => "mapping",
        };
        f.write_str(name)
    }
}

impl Document {
    /// Empty mapping, the document used for an empty or missing file.
    pub fn empty_mapping() -> Self {
        Document::Mapping(Mapping::new())
    }

    /// Concrete type of this value. Both integer representations share
    /// [`Kind::Integer`].
    pub fn kind(&self) -> Kind {
        match self {
            Document::Null => Kind::Null,
            Document::Bool(_) => Kind::Bool,
            Document::Integer(_) | Document::Unsigned(_) => Kind::Integer,
            Document::Float(_) => Kind::Float,
            Document::String(_) => Kind::String,
            Document::Sequence(_) => Kind::Sequence,
            Document::Mapping(_) => Kind::Mapping,
        }
    }

    pub fn is_container(&self) -> bool {
        matches!(self, Document::Sequence(_) | Document::Mapping(_))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Document::Null)
    }

    pub fn as_mapping(&self) -> Option<&Mapping> {
        match self {
            Document::Mapping(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_mapping_mut(&mut self) -> Option<&mut Mapping> {
        match self {
            Document::Mapping(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[Document]> {
        match self {
            Document::Sequence(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Document::String(s) => Some(s),
            _ => None,
        }
    }

    /// Look up a key when this document is a mapping.
    pub fn get(&self, key: &str) -> Option<&Document> {
        self.as_mapping().and_then(|map| map.get(key))
    }

    /// Human-readable type name including the element type of containers,
    /// e.g. `sequence<string>` or `mapping<float>`.
    pub fn type_name(&self) -> String {
        match self {
            Document::Sequence(items) => {
                format!("sequence<{}>", ElementType::of(items.iter(), Document::kind))
            }
            Document::Mapping(map) => {
                format!("mapping<{}>", ElementType::of(map.values(), Document::kind))
            }
            other => other.kind().to_string(),
        }
    }
}

/// Element type of a container, computed by classifying every element.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ElementType<T> {
    /// No elements, compatible with any other element type.
    Empty,
    /// Every element classifies the same way.
    Uniform(T),
    /// Elements of more than one class; accepts any element.
    Mixed,
}

impl<T: Copy + PartialEq> ElementType<T> {
    pub fn of<'a, I, F>(items: I, classify: F) -> Self
    where
        I: IntoIterator<Item = &'a Document>,
        F: Fn(&Document) -> T,
    {
        let mut element = ElementType::Empty;
        for item in items {
            let class = classify(item);
            element = match element {
                ElementType::Empty => ElementType::Uniform(class),
                ElementType::Uniform(seen) if seen == class => ElementType::Uniform(seen),
                _ => return ElementType::Mixed,
            };
        }
        element
    }

    /// Two uniform element types conflict only when they differ.
    pub fn is_compatible_with(&self, other: &Self) -> bool {
        match (self, other) {
            (ElementType::Uniform(a), ElementType::Uniform(b)) => a == b,
            _ => true,
        }
    }
}

impl<T: fmt::Display> fmt::Display for ElementType<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementType::Empty => f.write_str("empty"),
            ElementType::Uniform(class) => class.fmt(f),
            ElementType::Mixed => f.write_str("mixed"),
        }
    }
}

impl From<Mapping> for Document {
    fn from(map: Mapping) -> Self {
        Document::Mapping(map)
    }
}

impl From<Vec<Document>> for Document {
    fn from(items: Vec<Document>) -> Self {
        Document::Sequence(items)
    }
}

impl From<&str> for Document {
    fn from(s: &str) -> Self {
        Document::String(s.to_string())
    }
}

impl From<String> for Document {
    fn from(s: String) -> Self {
        Document::String(s)
    }
}

impl From<i64> for Document {
    fn from(n: i64) -> Self {
        Document::Integer(n)
    }
}

impl From<u64> for Document {
    fn from(n: u64) -> Self {
        match i64::try_from(n) {
            Ok(n) => Document::Integer(n),
            Err(_) => Document::Unsigned(n),
        }
    }
}

impl From<f64> for Document {
    fn from(n: f64) -> Self {
        Document::Float(n)
    }
}

impl From<bool> for Document {
    fn from(b: bool) -> Self {
        Document::Bool(b)
    }
}

impl Serialize for Document {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Document::Null => serializer.serialize_unit(),
            Document::Bool(b) => serializer.serialize_bool(*b),
            Document::Integer(n) => serializer.serialize_i64(*n),
            Document::Unsigned(n) => serializer.serialize_u64(*n),
            Document::Float(n) => serializer.serialize_f64(*n),
            Document::String(s) => serializer.serialize_str(s),
            Document::Sequence(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Document::Mapping(map) => {
                let mut out = serializer.serialize_map(Some(map.len()))?;
                for (key, value) in map {
                    out.serialize_entry(key, value)?;
                }
                out.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for Document {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(DocumentVisitor)
    }
}

struct DocumentVisitor;

impl<'de> Visitor<'de> for DocumentVisitor {
    type Value = Document;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a mapping, sequence or scalar value")
    }

    fn visit_unit<E: de::Error>(self) -> Result<Document, E> {
        Ok(Document::Null)
    }

    fn visit_none<E: de::Error>(self) -> Result<Document, E> {
        Ok(Document::Null)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Document, D::Error> {
        Deserialize::deserialize(deserializer)
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Document, E> {
        Ok(Document::Bool(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Document, E> {
        Ok(Document::Integer(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Document, E> {
        Ok(Document::from(v))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Document, E> {
        Ok(Document::Float(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Document, E> {
        Ok(Document::String(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Document, E> {
        Ok(Document::String(v))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Document, A::Error> {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element()? {
            items.push(item);
        }
        Ok(Document::Sequence(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Document, A::Error> {
        let mut map = Mapping::new();
        while let Some((MapKey(key), value)) = access.next_entry::<MapKey, Document>()? {
            if map.contains_key(&key) {
                return Err(de::Error::custom(format!("duplicate mapping key '{}'", key)));
            }
            map.insert(key, value);
        }
        Ok(Document::Mapping(map))
    }
}

/// Mapping key. YAML allows scalar keys such as `8080:` or `true:`; they are
/// stored by their textual form, so `1` and `1.0` end up as the same key.
struct MapKey(String);

impl<'de> Deserialize<'de> for MapKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(MapKeyVisitor)
    }
}

struct MapKeyVisitor;

impl Visitor<'_> for MapKeyVisitor {
    type Value = MapKey;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a scalar mapping key")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<MapKey, E> {
        Ok(MapKey(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<MapKey, E> {
        Ok(MapKey(v))
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<MapKey, E> {
        Ok(MapKey(v.to_string()))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<MapKey, E> {
        Ok(MapKey(v.to_string()))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<MapKey, E> {
        Ok(MapKey(v.to_string()))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<MapKey, E> {
        Ok(MapKey(v.to_string()))
    }

    fn visit_unit<E: de::Error>(self) -> Result<MapKey, E> {
        Ok(MapKey("null".to_string()))
    }
}
