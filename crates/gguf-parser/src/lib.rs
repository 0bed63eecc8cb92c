//! Pure-Rust GGUF metadata decoder.
//!
//! Decodes the header and key/value section of an in-memory `.gguf` file
//! into a sorted [`MetadataStore`] without reading the tensor data behind
//! it. The store can be filtered by key prefix and rendered either as one
//! JSON object or as YAML-style literal blocks of JSON.

pub mod builder;
pub mod filter;
pub mod format;
pub mod reader;
pub mod types;

pub use builder::GGUFBuilder;
pub use filter::{exclude_prefixes, should_include};
pub use format::{OutputFormat, render, render_block, render_json};
pub use reader::{ByteReader, GGUFMetadata, extract_metadata, parse};
pub use types::{
    GGUF_MAGIC, GGUFError, GGUFHeader, GGUFValue, GGUFValueType, MetadataStore, Result,
    ScalarValue,
};

/// Everything that controls one [`inspect`] call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InspectOptions {
    pub format: OutputFormat,
    /// Key prefixes to drop before rendering.
    pub exclude: Vec<String>,
}

/// Decode, filter and render `bytes` in one call.
pub fn inspect(bytes: &[u8], options: &InspectOptions) -> Result<String> {
    let store = extract_metadata(bytes)?;
    let store = exclude_prefixes(store, &options.exclude);
    Ok(render(&store, options.format))
}
