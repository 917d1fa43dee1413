//! Exchange token codec
//!
//! A token is the set's pretty JSON, compressed with raw DEFLATE and written
//! as standard base64.

use super::set::PreferenceSet;
use anyhow::{Context, Result};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use flate2::Compression;
use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;
use std::io::{Read, Write};

pub fn serialize(set: &PreferenceSet) -> Result<String> {
    serde_json::to_string_pretty(set).context("Failed to serialize preference set")
}

/// Parse and validate a set's JSON
pub fn deserialize(json: &str) -> Result<PreferenceSet> {
    let set: PreferenceSet =
        serde_json::from_str(json).context("Failed to parse preference set")?;
    set.validate()?;
    Ok(set)
}

pub fn compress_to_base64(text: &str) -> Result<String> {
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(text.as_bytes())
        .context("Deflate compression failed")?;
    let compressed = encoder.finish().context("Deflate finish failed")?;
    Ok(STANDARD.encode(compressed))
}

/// Reverse [`compress_to_base64`]; surrounding whitespace is ignored
pub fn decompress_from_base64(token: &str) -> Result<String> {
    let compressed = STANDARD
        .decode(token.trim())
        .context("Token is not valid base64")?;
    let mut decoder = DeflateDecoder::new(compressed.as_slice());
    let mut text = String::new();
    decoder
        .read_to_string(&mut text)
        .context("Deflate decompression failed")?;
    Ok(text)
}

pub fn encode(set: &PreferenceSet) -> Result<String> {
    compress_to_base64(&serialize(set)?)
}

pub fn decode(token: &str) -> Result<PreferenceSet> {
    deserialize(&decompress_from_base64(token)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exchange::{ManagerData, PreferenceData};
    use crate::preferences::PreferenceValue;

    fn sample_set() -> PreferenceSet {
        let mut manager = ManagerData::new("com.example.kitchen", "Kitchen Tweaks");
        manager.add(PreferenceData::from_value("count", &PreferenceValue::Int(4)));
        manager.add(PreferenceData::from_value("speed", &PreferenceValue::Float(1.5)));
        manager.add(PreferenceData::from_value("mode", &PreferenceValue::Enum("Hard".into())));
        let mut set = PreferenceSet::new("Speedrun", true);
        set.add(manager);
        set
    }

    #[test]
    fn test_json_field_names() {
        let json = serialize(&sample_set()).unwrap();
        for field in ["\"Name\"", "\"CreatedAt\"", "\"ReadOnlyMode\"", "\"Managers\"", "\"ModGuid\"", "\"ModName\"", "\"keys\"", "\"types\"", "\"values\""] {
            assert!(json.contains(field), "missing {}", field);
        }
    }

    #[test]
    fn test_token_decodes_to_same_set() {
        let set = sample_set();
        let token = encode(&set).unwrap();
        assert!(!token.contains('{'));
        assert_eq!(decode(&format!("  {}\n", token)).unwrap(), set);
    }

    #[test]
    fn test_garbage_token_fails_before_parsing() {
        assert!(decompress_from_base64("not base64 at all!").is_err());
        let not_deflate = STANDARD.encode([0xffu8; 16]);
        assert!(decompress_from_base64(&not_deflate).is_err());
    }

    #[test]
    fn test_bad_structure_fails_to_deserialize() {
        let token = compress_to_base64("{\"Name\": 3}").unwrap();
        let text = decompress_from_base64(&token).unwrap();
        assert!(deserialize(&text).is_err());
    }
}
