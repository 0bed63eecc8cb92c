//! End-to-end decoding of builder-encoded GGUF files.

use gguf_parser::{
    GGUFBuilder, GGUFError, GGUFValue, GGUFValueType, InspectOptions, OutputFormat, ScalarValue,
    exclude_prefixes, extract_metadata, inspect, parse, render_block, render_json,
};

fn sample_file() -> Vec<u8> {
    GGUFBuilder::new()
        .tensor_count(291)
        .add_string("general.architecture", "llama")
        .add_string("general.name", "tiny-llama")
        .add_u32("llama.context_length", 4096)
        .add("llama.rope.freq_base", &GGUFValue::Float32(10000.0))
        .add("general.file_type", &GGUFValue::Uint64(15))
        .add_bool("tokenizer.ggml.add_bos_token", true)
        .add_string("tokenizer.ggml.model", "llama")
        .add_array(
            "tokenizer.ggml.tokens",
            vec![
                ScalarValue::String("<unk>".into()),
                ScalarValue::String("<s>".into()),
                ScalarValue::String("</s>".into()),
            ],
        )
        .add_array(
            "tokenizer.ggml.scores",
            vec![ScalarValue::Float32(0.0), ScalarValue::Float32(-1.5)],
        )
        .build()
}

#[test]
fn decodes_header_and_entries() {
    let file = parse(&sample_file()).unwrap();
    assert_eq!(file.header.version, 3);
    assert_eq!(file.header.tensor_count, 291);
    assert_eq!(file.header.metadata_kv_count, 9);

    let store = file.metadata;
    assert_eq!(store.len(), 9);
    assert_eq!(
        store.get("general.architecture").and_then(GGUFValue::as_str),
        Some("llama")
    );
    assert_eq!(
        store.get("llama.context_length").and_then(GGUFValue::as_u64),
        Some(4096)
    );
    assert_eq!(
        store.get("tokenizer.ggml.add_bos_token").and_then(GGUFValue::as_bool),
        Some(true)
    );
    assert_eq!(
        store
            .get("tokenizer.ggml.tokens")
            .and_then(GGUFValue::as_array)
            .map(<[ScalarValue]>::len),
        Some(3)
    );
}

#[test]
fn tensor_data_after_metadata_is_ignored() {
    let mut bytes = sample_file();
    let clean = extract_metadata(&bytes).unwrap();
    bytes.extend_from_slice(&[0xAB; 64]);
    assert_eq!(extract_metadata(&bytes).unwrap(), clean);
}

#[test]
fn version_does_not_change_layout() {
    for version in [1, 2, 3, 99] {
        let bytes = GGUFBuilder::new()
            .version(version)
            .add_u32("x", 1)
            .build();
        let file = parse(&bytes).unwrap();
        assert_eq!(file.header.version, version);
        assert_eq!(file.metadata.get("x"), Some(&GGUFValue::Uint32(1)));
    }
}

#[test]
fn u32_array_decodes_in_order() {
    let bytes = GGUFBuilder::new()
        .add_array(
            "a",
            vec![
                ScalarValue::Uint32(1),
                ScalarValue::Uint32(2),
                ScalarValue::Uint32(3),
            ],
        )
        .build();
    let store = extract_metadata(&bytes).unwrap();
    assert_eq!(
        store.get("a"),
        Some(&GGUFValue::Array(vec![
            ScalarValue::Uint32(1),
            ScalarValue::Uint32(2),
            ScalarValue::Uint32(3),
        ]))
    );
}

#[test]
fn bool_array_from_raw_bytes() {
    let mut payload = (GGUFValueType::Bool as u32).to_le_bytes().to_vec();
    payload.extend_from_slice(&3u64.to_le_bytes());
    payload.extend_from_slice(&[1, 0, 1]);
    let bytes = GGUFBuilder::new().add_raw("flags", 9, payload).build();
    let store = extract_metadata(&bytes).unwrap();
    assert_eq!(
        store.get("flags"),
        Some(&GGUFValue::Array(vec![
            ScalarValue::Bool(true),
            ScalarValue::Bool(false),
            ScalarValue::Bool(true),
        ]))
    );
}

#[test]
fn duplicate_key_last_write_wins() {
    let bytes = GGUFBuilder::new().add_u32("a", 1).add_u32("a", 2).build();
    let file = parse(&bytes).unwrap();
    assert_eq!(file.header.metadata_kv_count, 2);
    assert_eq!(file.metadata.len(), 1);
    assert_eq!(file.metadata.get("a"), Some(&GGUFValue::Uint32(2)));
}

#[test]
fn invalid_magic() {
    let mut bytes = sample_file();
    bytes[..4].copy_from_slice(b"XXXX");
    assert_eq!(parse(&bytes).unwrap_err(), GGUFError::InvalidMagic(*b"XXXX"));
}

#[test]
fn scalar_type_code_13_is_unsupported() {
    let bytes = GGUFBuilder::new()
        .add_u32("ok", 1)
        .add_raw("bad", 13, vec![0; 4])
        .build();
    assert_eq!(
        extract_metadata(&bytes).unwrap_err(),
        GGUFError::UnsupportedTypeCode(13)
    );
}

#[test]
fn array_element_type_is_checked() {
    for code in [9u32, 13, u32::MAX] {
        let mut payload = code.to_le_bytes().to_vec();
        payload.extend_from_slice(&0u64.to_le_bytes());
        let bytes = GGUFBuilder::new().add_raw("arr", 9, payload).build();
        assert_eq!(
            extract_metadata(&bytes).unwrap_err(),
            GGUFError::UnsupportedTypeCode(code)
        );
    }
}

#[test]
fn kv_count_beyond_data_is_eof() {
    let mut bytes = GGUFBuilder::new().add_u32("a", 1).build();
    bytes[16..24].copy_from_slice(&2u64.to_le_bytes());
    assert!(matches!(
        extract_metadata(&bytes),
        Err(GGUFError::UnexpectedEndOfFile { .. })
    ));
}

#[test]
fn every_truncation_is_eof() {
    let bytes = sample_file();
    for cut in 0..bytes.len() {
        match parse(&bytes[..cut]) {
            Err(GGUFError::UnexpectedEndOfFile { offset, .. }) => assert!(offset <= cut),
            other => panic!("cut at {cut}: expected end of file, got {other:?}"),
        }
    }
}

#[test]
fn filter_drops_tokenizer_keys() {
    let bytes = GGUFBuilder::new()
        .add_string("tokenizer.ggml.model", "x")
        .add_string("general.name", "y")
        .build();
    let store = exclude_prefixes(extract_metadata(&bytes).unwrap(), &["tokenizer.ggml."]);
    assert_eq!(store.keys().collect::<Vec<_>>(), ["general.name"]);
}

/// Split block output back into `(key, embedded JSON)` pairs.
fn parse_blocks(text: &str) -> Vec<(String, serde_json::Value)> {
    let mut out = Vec::new();
    let mut current: Option<(String, String)> = None;
    for line in text.lines() {
        if let Some(body) = line.strip_prefix("  ") {
            let (_, json) = current.as_mut().expect("value line before key line");
            json.push_str(body);
            json.push('\n');
        } else if line.is_empty() {
            if let Some((key, json)) = current.take() {
                out.push((key, serde_json::from_str(&json).unwrap()));
            }
        } else {
            let key = line.strip_suffix(": |").expect("key line");
            current = Some((key.to_string(), String::new()));
        }
    }
    assert!(current.is_none(), "unterminated block");
    out
}

#[test]
fn block_and_json_renderings_agree() {
    let store = exclude_prefixes(extract_metadata(&sample_file()).unwrap(), &["general.name"]);
    let json: serde_json::Value = serde_json::from_str(&render_json(&store)).unwrap();
    let object = json.as_object().unwrap();
    let blocks = parse_blocks(&render_block(&store));

    assert_eq!(blocks.len(), object.len());
    for (key, value) in &blocks {
        assert_eq!(object.get(key), Some(value), "mismatch for {key}");
    }
    let block_keys: Vec<&str> = blocks.iter().map(|(k, _)| k.as_str()).collect();
    assert_eq!(block_keys, store.keys().collect::<Vec<_>>());
}

#[test]
fn json_values_are_native() {
    let out = inspect(
        &sample_file(),
        &InspectOptions {
            format: OutputFormat::Json,
            exclude: vec!["tokenizer.".into()],
        },
    )
    .unwrap();
    let json: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "general.architecture": "llama",
            "general.file_type": 15,
            "general.name": "tiny-llama",
            "llama.context_length": 4096,
            "llama.rope.freq_base": 10000.0,
        })
    );
}

#[test]
fn float32_renders_widened() {
    let bytes = GGUFBuilder::new()
        .add("eps", &GGUFValue::Float32(0.1))
        .build();
    let out = inspect(&bytes, &InspectOptions::default()).unwrap();
    assert_eq!(out, "eps: |\n  0.10000000149011612\n\n");
}

#[test]
fn inspect_propagates_decode_errors() {
    assert_eq!(
        inspect(b"XXXXrest", &InspectOptions::default()).unwrap_err(),
        GGUFError::InvalidMagic(*b"XXXX")
    );
}
