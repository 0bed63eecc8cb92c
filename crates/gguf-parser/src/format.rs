//! Text renderings of a metadata store.

use crate::types::{GGUFValue, MetadataStore};

/// Which rendering [`render`] produces.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// `key: |` followed by the value's indented JSON, one block per key.
    #[default]
    Block,
    /// One pretty-printed JSON object.
    Json,
}

pub fn render(store: &MetadataStore, format: OutputFormat) -> String {
    match format {
        OutputFormat::Block => render_block(store),
        OutputFormat::Json => render_json(store),
    }
}

/// The whole store as one JSON object with 2-space indentation.
pub fn render_json(store: &MetadataStore) -> String {
    let object: serde_json::Map<String, serde_json::Value> = store
        .iter()
        .map(|(k, v)| (k.to_string(), serde_json::Value::from(v)))
        .collect();
    format!("{:#}\n", serde_json::Value::Object(object))
}

/// Each entry as a YAML-style literal block holding the value's JSON.
pub fn render_block(store: &MetadataStore) -> String {
    let mut out = String::new();
    for (key, value) in store.iter() {
        out.push_str(&format!("{key}: |\n"));
        let json = value_json(value);
        let mut lines = json.lines().peekable();
        if lines.peek().is_none() {
            out.push_str("  \n");
        }
        for line in lines {
            out.push_str(&format!("  {line}\n"));
        }
        out.push('\n');
    }
    out
}

fn value_json(value: &GGUFValue) -> String {
    format!("{:#}", serde_json::Value::from(value))
}
