//! GGUF format types and constants.

use std::collections::BTreeMap;

use serde::{Serialize, Serializer};

/// Magic bytes at offset 0 of every GGUF file.
pub const GGUF_MAGIC: [u8; 4] = *b"GGUF";

//  Value type tag

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[repr(u32)]
pub enum GGUFValueType {
    Uint8 = 0,
    Int8 = 1,
    Uint16 = 2,
    Int16 = 3,
    Uint32 = 4,
    Int32 = 5,
    Float32 = 6,
    Bool = 7,
    String = 8,
    Array = 9,
    Uint64 = 10,
    Int64 = 11,
    Float64 = 12,
}

impl TryFrom<u32> for GGUFValueType {
    type Error = GGUFError;
    fn try_from(v: u32) -> Result<Self, Self::Error> {
        match v {
            0 => Ok(Self::Uint8),
            1 => Ok(Self::Int8),
            2 => Ok(Self::Uint16),
            3 => Ok(Self::Int16),
            4 => Ok(Self::Uint32),
            5 => Ok(Self::Int32),
            6 => Ok(Self::Float32),
            7 => Ok(Self::Bool),
            8 => Ok(Self::String),
            9 => Ok(Self::Array),
            10 => Ok(Self::Uint64),
            11 => Ok(Self::Int64),
            12 => Ok(Self::Float64),
            _ => Err(GGUFError::UnsupportedTypeCode(v)),
        }
    }
}

impl GGUFValueType {
    /// Encoded width in bytes of a fixed-width scalar.
    ///
    /// `None` for `String` and `Array`, which the extractor dispatches
    /// itself.
    pub const fn width(self) -> Option<usize> {
        match self {
            Self::Uint8 | Self::Int8 | Self::Bool => Some(1),
            Self::Uint16 | Self::Int16 => Some(2),
            Self::Uint32 | Self::Int32 | Self::Float32 => Some(4),
            Self::Uint64 | Self::Int64 | Self::Float64 => Some(8),
            Self::String | Self::Array => None,
        }
    }
}

//  Header

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GGUFHeader {
    /// Informational only; field widths never depend on it.
    pub version: u32,
    pub tensor_count: u64,
    pub metadata_kv_count: u64,
}

//  Values

/// A single array element. Arrays never nest, so there is no array variant.
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarValue {
    Uint8(u8),
    Int8(i8),
    Uint16(u16),
    Int16(i16),
    Uint32(u32),
    Int32(i32),
    Float32(f32),
    Bool(bool),
    String(String),
    Uint64(u64),
    Int64(i64),
    Float64(f64),
}

#[derive(Debug, Clone, PartialEq)]
pub enum GGUFValue {
    Uint8(u8),
    Int8(i8),
    Uint16(u16),
    Int16(i16),
    Uint32(u32),
    Int32(i32),
    Float32(f32),
    Bool(bool),
    String(String),
    Array(Vec<ScalarValue>),
    Uint64(u64),
    Int64(i64),
    Float64(f64),
}

impl From<ScalarValue> for GGUFValue {
    fn from(v: ScalarValue) -> Self {
        match v {
            ScalarValue::Uint8(v) => Self::Uint8(v),
            ScalarValue::Int8(v) => Self::Int8(v),
            ScalarValue::Uint16(v) => Self::Uint16(v),
            ScalarValue::Int16(v) => Self::Int16(v),
            ScalarValue::Uint32(v) => Self::Uint32(v),
            ScalarValue::Int32(v) => Self::Int32(v),
            ScalarValue::Float32(v) => Self::Float32(v),
            ScalarValue::Bool(v) => Self::Bool(v),
            ScalarValue::String(v) => Self::String(v),
            ScalarValue::Uint64(v) => Self::Uint64(v),
            ScalarValue::Int64(v) => Self::Int64(v),
            ScalarValue::Float64(v) => Self::Float64(v),
        }
    }
}

impl GGUFValue {
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Self::Uint8(v) => Some(u64::from(*v)),
            Self::Uint16(v) => Some(u64::from(*v)),
            Self::Uint32(v) => Some(u64::from(*v)),
            Self::Uint64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[ScalarValue]> {
        match self {
            Self::Array(items) => Some(items.as_slice()),
            _ => None,
        }
    }
}

//  JSON conversion

fn float_json(v: f64) -> serde_json::Value {
    serde_json::Number::from_f64(v).map_or(serde_json::Value::Null, serde_json::Value::Number)
}

impl From<&ScalarValue> for serde_json::Value {
    fn from(v: &ScalarValue) -> Self {
        match v {
            ScalarValue::Uint8(v) => Self::from(*v),
            ScalarValue::Int8(v) => Self::from(*v),
            ScalarValue::Uint16(v) => Self::from(*v),
            ScalarValue::Int16(v) => Self::from(*v),
            ScalarValue::Uint32(v) => Self::from(*v),
            ScalarValue::Int32(v) => Self::from(*v),
            ScalarValue::Float32(v) => float_json(f64::from(*v)),
            ScalarValue::Bool(v) => Self::Bool(*v),
            ScalarValue::String(s) => Self::String(s.clone()),
            ScalarValue::Uint64(v) => Self::from(*v),
            ScalarValue::Int64(v) => Self::from(*v),
            ScalarValue::Float64(v) => float_json(*v),
        }
    }
}

impl From<&GGUFValue> for serde_json::Value {
    fn from(v: &GGUFValue) -> Self {
        match v {
            GGUFValue::Uint8(v) => Self::from(*v),
            GGUFValue::Int8(v) => Self::from(*v),
            GGUFValue::Uint16(v) => Self::from(*v),
            GGUFValue::Int16(v) => Self::from(*v),
            GGUFValue::Uint32(v) => Self::from(*v),
            GGUFValue::Int32(v) => Self::from(*v),
            GGUFValue::Float32(v) => float_json(f64::from(*v)),
            GGUFValue::Bool(v) => Self::Bool(*v),
            GGUFValue::String(s) => Self::String(s.clone()),
            GGUFValue::Array(items) => Self::Array(items.iter().map(Self::from).collect()),
            GGUFValue::Uint64(v) => Self::from(*v),
            GGUFValue::Int64(v) => Self::from(*v),
            GGUFValue::Float64(v) => float_json(*v),
        }
    }
}

// Serializes exactly as the `serde_json::Value` conversion above.
impl Serialize for ScalarValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serde_json::Value::from(self).serialize(serializer)
    }
}

impl Serialize for GGUFValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serde_json::Value::from(self).serialize(serializer)
    }
}

//  Metadata store

/// Decoded metadata, keyed and iterated in ascending key order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct MetadataStore {
    entries: BTreeMap<String, GGUFValue>,
}

impl MetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry. A later insert for the same key replaces the earlier
    /// value and returns it.
    pub fn insert(&mut self, key: String, value: GGUFValue) -> Option<GGUFValue> {
        self.entries.insert(key, value)
    }

    pub fn get(&self, key: &str) -> Option<&GGUFValue> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &GGUFValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub(crate) fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.entries.retain(|k, _| keep(k));
    }
}

impl FromIterator<(String, GGUFValue)> for MetadataStore {
    fn from_iter<I: IntoIterator<Item = (String, GGUFValue)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for MetadataStore {
    type Item = (String, GGUFValue);
    type IntoIter = std::collections::btree_map::IntoIter<String, GGUFValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

//  Error

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GGUFError {
    #[error("not a GGUF file (magic {:?})", String::from_utf8_lossy(.0))]
    InvalidMagic([u8; 4]),

    #[error("unexpected end of file at offset {offset}: needed {needed} more bytes")]
    UnexpectedEndOfFile { offset: usize, needed: u64 },

    #[error("unsupported value type code: {0}")]
    UnsupportedTypeCode(u32),
}

pub type Result<T, E = GGUFError> = std::result::Result<T, E>;
