//! GGUF metadata reader: byte cursor plus the header/KV extraction loop.

use serde::Serialize;
use tracing::{debug, trace};

use crate::types::*;

/// Header plus every decoded metadata entry of one file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GGUFMetadata {
    pub header: GGUFHeader,
    pub metadata: MetadataStore,
}

//  Extraction

/// Decode the header and all metadata entries from an in-memory file.
///
/// The tensor table and data that follow the metadata are never touched.
/// Any malformed field aborts the whole call; no partial result is returned.
pub fn parse(bytes: &[u8]) -> Result<GGUFMetadata> {
    let mut reader = ByteReader::new(bytes);

    //  Magic
    let magic: [u8; 4] = reader.read_bytes()?;
    if magic != GGUF_MAGIC {
        return Err(GGUFError::InvalidMagic(magic));
    }

    //  Version and counts
    let version = reader.read_u32()?;
    let tensor_count = reader.read_u64()?;
    let metadata_kv_count = reader.read_u64()?;

    let header = GGUFHeader {
        version,
        tensor_count,
        metadata_kv_count,
    };
    debug!(version, tensor_count, metadata_kv_count, "GGUF header");

    //  Metadata KVs
    let mut metadata = MetadataStore::new();
    for _ in 0..metadata_kv_count {
        let (key, value) = reader.read_kv()?;
        trace!(key = %key, offset = reader.position(), "metadata entry");
        if metadata.contains_key(&key) {
            debug!(key = %key, "duplicate metadata key, keeping the later value");
        }
        metadata.insert(key, value);
    }

    Ok(GGUFMetadata { header, metadata })
}

/// Decode just the metadata store of an in-memory GGUF file.
pub fn extract_metadata(bytes: &[u8]) -> Result<MetadataStore> {
    parse(bytes).map(|file| file.metadata)
}

//  Binary reading primitives

/// Bounds-checked little-endian cursor over a byte buffer.
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// Consume exactly `len` bytes.
    pub fn read_fixed_width(&mut self, len: usize) -> Result<&'a [u8]> {
        if len > self.remaining() {
            return Err(self.eof(len as u64));
        }
        let buf: &'a [u8] = self.buf;
        let out = &buf[self.pos..self.pos + len];
        self.pos += len;
        Ok(out)
    }

    fn read_bytes<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_fixed_width(N)?);
        Ok(out)
    }

    fn eof(&self, needed: u64) -> GGUFError {
        GGUFError::UnexpectedEndOfFile {
            offset: self.pos,
            needed,
        }
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        self.read_bytes().map(u8::from_le_bytes)
    }

    pub fn read_i8(&mut self) -> Result<i8> {
        self.read_bytes().map(i8::from_le_bytes)
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        self.read_bytes().map(u16::from_le_bytes)
    }

    pub fn read_i16(&mut self) -> Result<i16> {
        self.read_bytes().map(i16::from_le_bytes)
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        self.read_bytes().map(u32::from_le_bytes)
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        self.read_bytes().map(i32::from_le_bytes)
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        self.read_bytes().map(u64::from_le_bytes)
    }

    pub fn read_i64(&mut self) -> Result<i64> {
        self.read_bytes().map(i64::from_le_bytes)
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        self.read_bytes().map(f32::from_le_bytes)
    }

    pub fn read_f64(&mut self) -> Result<f64> {
        self.read_bytes().map(f64::from_le_bytes)
    }

    pub fn read_bool(&mut self) -> Result<bool> {
        Ok(self.read_u8()? != 0)
    }

    /// `u64` byte length followed by that many bytes, decoded lossily.
    pub fn read_length_prefixed_string(&mut self) -> Result<String> {
        let len = self.read_u64()?;
        if len > self.remaining() as u64 {
            return Err(self.eof(len));
        }
        let raw = self.read_fixed_width(len as usize)?;
        Ok(String::from_utf8_lossy(raw).into_owned())
    }

    /// Decode one fixed-width scalar.
    pub fn read_scalar(&mut self, vtype: GGUFValueType) -> Result<ScalarValue> {
        match vtype {
            GGUFValueType::Uint8 => Ok(ScalarValue::Uint8(self.read_u8()?)),
            GGUFValueType::Int8 => Ok(ScalarValue::Int8(self.read_i8()?)),
            GGUFValueType::Uint16 => Ok(ScalarValue::Uint16(self.read_u16()?)),
            GGUFValueType::Int16 => Ok(ScalarValue::Int16(self.read_i16()?)),
            GGUFValueType::Uint32 => Ok(ScalarValue::Uint32(self.read_u32()?)),
            GGUFValueType::Int32 => Ok(ScalarValue::Int32(self.read_i32()?)),
            GGUFValueType::Float32 => Ok(ScalarValue::Float32(self.read_f32()?)),
            GGUFValueType::Bool => Ok(ScalarValue::Bool(self.read_bool()?)),
            GGUFValueType::Uint64 => Ok(ScalarValue::Uint64(self.read_u64()?)),
            GGUFValueType::Int64 => Ok(ScalarValue::Int64(self.read_i64()?)),
            GGUFValueType::Float64 => Ok(ScalarValue::Float64(self.read_f64()?)),
            GGUFValueType::String | GGUFValueType::Array => {
                Err(GGUFError::UnsupportedTypeCode(vtype as u32))
            }
        }
    }

    /// Decode `count` homogeneous elements.
    ///
    /// Strings are read one after another; fixed-width elements are taken as
    /// a single `count * width` block and unpacked from it.
    pub fn read_array_values(
        &mut self,
        elem_type: GGUFValueType,
        count: u64,
    ) -> Result<Vec<ScalarValue>> {
        let Some(width) = elem_type.width() else {
            if elem_type != GGUFValueType::String {
                return Err(GGUFError::UnsupportedTypeCode(elem_type as u32));
            }
            // Every string needs at least its 8-byte length.
            let mut out = Vec::with_capacity((count as usize).min(self.remaining() / 8));
            for _ in 0..count {
                out.push(ScalarValue::String(self.read_length_prefixed_string()?));
            }
            return Ok(out);
        };

        let total = count.checked_mul(width as u64).unwrap_or(u64::MAX);
        if total > self.remaining() as u64 {
            return Err(self.eof(total));
        }
        let mut block = ByteReader::new(self.read_fixed_width(total as usize)?);
        (0..count).map(|_| block.read_scalar(elem_type)).collect()
    }

    fn read_value(&mut self, vtype: GGUFValueType) -> Result<GGUFValue> {
        match vtype {
            GGUFValueType::String => Ok(GGUFValue::String(self.read_length_prefixed_string()?)),
            GGUFValueType::Array => {
                let elem_code = self.read_u32()?;
                let count = self.read_u64()?;
                let elem_type = GGUFValueType::try_from(elem_code)?;
                Ok(GGUFValue::Array(self.read_array_values(elem_type, count)?))
            }
            _ => self.read_scalar(vtype).map(GGUFValue::from),
        }
    }

    fn read_kv(&mut self) -> Result<(String, GGUFValue)> {
        let key = self.read_length_prefixed_string()?;
        let vtype = GGUFValueType::try_from(self.read_u32()?)?;
        let value = self.read_value(vtype)?;
        Ok((key, value))
    }
}
