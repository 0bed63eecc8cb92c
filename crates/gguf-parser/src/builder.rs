//! In-memory GGUF encoder.
//!
//! Produces the byte layout [`crate::parse`] consumes, so tests can build
//! files without real models on disk.
//!
//! ```
//! use gguf_parser::{GGUFBuilder, GGUFValue, extract_metadata};
//!
//! let bytes = GGUFBuilder::new()
//!     .add_string("general.name", "tiny")
//!     .add_u32("llama.context_length", 2048)
//!     .build();
//! let store = extract_metadata(&bytes).unwrap();
//! assert_eq!(store.get("general.name"), Some(&GGUFValue::String("tiny".into())));
//! ```

use crate::types::{GGUF_MAGIC, GGUFValue, GGUFValueType, ScalarValue};

/// Version written by [`GGUFBuilder::new`].
pub const DEFAULT_VERSION: u32 = 3;

/// Builder for GGUF metadata sections.
#[derive(Debug, Clone)]
pub struct GGUFBuilder {
    version: u32,
    tensor_count: u64,
    /// Encoded entries in insertion order: key, type code, payload.
    metadata: Vec<(String, u32, Vec<u8>)>,
}

impl Default for GGUFBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl GGUFBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            version: DEFAULT_VERSION,
            tensor_count: 0,
            metadata: Vec::new(),
        }
    }

    #[must_use]
    pub fn version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    /// Header tensor count. No tensor table is written.
    #[must_use]
    pub fn tensor_count(mut self, count: u64) -> Self {
        self.tensor_count = count;
        self
    }

    /// Append an entry with any decoded value.
    #[must_use]
    pub fn add(mut self, key: &str, value: &GGUFValue) -> Self {
        let mut payload = Vec::new();
        let code = encode_value(&mut payload, value);
        self.metadata.push((key.to_string(), code, payload));
        self
    }

    /// Append an entry with a raw type code and pre-encoded payload.
    #[must_use]
    pub fn add_raw(mut self, key: &str, type_code: u32, payload: Vec<u8>) -> Self {
        self.metadata.push((key.to_string(), type_code, payload));
        self
    }

    #[must_use]
    pub fn add_string(self, key: &str, value: &str) -> Self {
        self.add(key, &GGUFValue::String(value.to_string()))
    }

    #[must_use]
    pub fn add_u32(self, key: &str, value: u32) -> Self {
        self.add(key, &GGUFValue::Uint32(value))
    }

    #[must_use]
    pub fn add_bool(self, key: &str, value: bool) -> Self {
        self.add(key, &GGUFValue::Bool(value))
    }

    #[must_use]
    pub fn add_array(self, key: &str, items: Vec<ScalarValue>) -> Self {
        self.add(key, &GGUFValue::Array(items))
    }

    pub fn build(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&GGUF_MAGIC);
        out.extend_from_slice(&self.version.to_le_bytes());
        out.extend_from_slice(&self.tensor_count.to_le_bytes());
        out.extend_from_slice(&(self.metadata.len() as u64).to_le_bytes());
        for (key, code, payload) in &self.metadata {
            write_string(&mut out, key);
            out.extend_from_slice(&code.to_le_bytes());
            out.extend_from_slice(payload);
        }
        out
    }
}

pub fn write_string(out: &mut Vec<u8>, s: &str) {
    out.extend_from_slice(&(s.len() as u64).to_le_bytes());
    out.extend_from_slice(s.as_bytes());
}

/// Type code of an array element.
pub fn scalar_type(v: &ScalarValue) -> GGUFValueType {
    match v {
        ScalarValue::Uint8(_) => GGUFValueType::Uint8,
        ScalarValue::Int8(_) => GGUFValueType::Int8,
        ScalarValue::Uint16(_) => GGUFValueType::Uint16,
        ScalarValue::Int16(_) => GGUFValueType::Int16,
        ScalarValue::Uint32(_) => GGUFValueType::Uint32,
        ScalarValue::Int32(_) => GGUFValueType::Int32,
        ScalarValue::Float32(_) => GGUFValueType::Float32,
        ScalarValue::Bool(_) => GGUFValueType::Bool,
        ScalarValue::String(_) => GGUFValueType::String,
        ScalarValue::Uint64(_) => GGUFValueType::Uint64,
        ScalarValue::Int64(_) => GGUFValueType::Int64,
        ScalarValue::Float64(_) => GGUFValueType::Float64,
    }
}

fn encode_scalar(out: &mut Vec<u8>, v: &ScalarValue) {
    match v {
        ScalarValue::Uint8(v) => out.push(*v),
        ScalarValue::Int8(v) => out.extend_from_slice(&v.to_le_bytes()),
        ScalarValue::Uint16(v) => out.extend_from_slice(&v.to_le_bytes()),
        ScalarValue::Int16(v) => out.extend_from_slice(&v.to_le_bytes()),
        ScalarValue::Uint32(v) => out.extend_from_slice(&v.to_le_bytes()),
        ScalarValue::Int32(v) => out.extend_from_slice(&v.to_le_bytes()),
        ScalarValue::Float32(v) => out.extend_from_slice(&v.to_le_bytes()),
        ScalarValue::Bool(v) => out.push(u8::from(*v)),
        ScalarValue::String(s) => write_string(out, s),
        ScalarValue::Uint64(v) => out.extend_from_slice(&v.to_le_bytes()),
        ScalarValue::Int64(v) => out.extend_from_slice(&v.to_le_bytes()),
        ScalarValue::Float64(v) => out.extend_from_slice(&v.to_le_bytes()),
    }
}

/// Encode `value`'s payload and return its type code.
///
/// An empty array is written with element type `Uint8`. Arrays mixing
/// element types are encoded with the first element's type code and will not
/// decode back to the same values.
fn encode_value(out: &mut Vec<u8>, value: &GGUFValue) -> u32 {
    let scalar = match value {
        GGUFValue::Array(items) => {
            let elem = items.first().map_or(GGUFValueType::Uint8, scalar_type);
            out.extend_from_slice(&(elem as u32).to_le_bytes());
            out.extend_from_slice(&(items.len() as u64).to_le_bytes());
            for item in items {
                encode_scalar(out, item);
            }
            return GGUFValueType::Array as u32;
        }
        GGUFValue::Uint8(v) => ScalarValue::Uint8(*v),
        GGUFValue::Int8(v) => ScalarValue::Int8(*v),
        GGUFValue::Uint16(v) => ScalarValue::Uint16(*v),
        GGUFValue::Int16(v) => ScalarValue::Int16(*v),
        GGUFValue::Uint32(v) => ScalarValue::Uint32(*v),
        GGUFValue::Int32(v) => ScalarValue::Int32(*v),
        GGUFValue::Float32(v) => ScalarValue::Float32(*v),
        GGUFValue::Bool(v) => ScalarValue::Bool(*v),
        GGUFValue::String(s) => ScalarValue::String(s.clone()),
        GGUFValue::Uint64(v) => ScalarValue::Uint64(*v),
        GGUFValue::Int64(v) => ScalarValue::Int64(*v),
        GGUFValue::Float64(v) => ScalarValue::Float64(*v),
    };
    encode_scalar(out, &scalar);
    scalar_type(&scalar) as u32
}
