//! Core types for the preference system

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Type tag of a registered preference
///
/// The tag is part of a preference's identity in the store and is written
/// next to every value on disk and in preference sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PreferenceType {
    Bool,
    Int,
    Float,
    String,
    Enum,
    List,
    Dictionary,
}

impl PreferenceType {
    /// Wire name used in files and preference sets
    pub fn tag(&self) -> &'static str {
        match self {
            PreferenceType::Bool => "bool",
            PreferenceType::Int => "int",
            PreferenceType::Float => "float",
            PreferenceType::String => "string",
            PreferenceType::Enum => "enum",
            PreferenceType::List => "list",
            PreferenceType::Dictionary => "dictionary",
        }
    }

    /// Parse a wire name back into a type tag
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "bool" => Some(PreferenceType::Bool),
            "int" => Some(PreferenceType::Int),
            "float" => Some(PreferenceType::Float),
            "string" => Some(PreferenceType::String),
            "enum" => Some(PreferenceType::Enum),
            "list" => Some(PreferenceType::List),
            "dictionary" => Some(PreferenceType::Dictionary),
            _ => None,
        }
    }
}

impl std::fmt::Display for PreferenceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

/// A strongly-typed preference value
#[derive(Debug, Clone, PartialEq)]
pub enum PreferenceValue {
    Bool(bool),
    Int(i32),
    Float(f32),
    String(String),
    /// Symbolic variant name, never an ordinal
    Enum(String),
    List(Vec<Value>),
    Dictionary(BTreeMap<String, Value>),
}

impl PreferenceValue {
    /// Type tag of this value
    pub fn ty(&self) -> PreferenceType {
        match self {
            PreferenceValue::Bool(_) => PreferenceType::Bool,
            PreferenceValue::Int(_) => PreferenceType::Int,
            PreferenceValue::Float(_) => PreferenceType::Float,
            PreferenceValue::String(_) => PreferenceType::String,
            PreferenceValue::Enum(_) => PreferenceType::Enum,
            PreferenceValue::List(_) => PreferenceType::List,
            PreferenceValue::Dictionary(_) => PreferenceType::Dictionary,
        }
    }

    /// False only for NaN and infinite floats, which have no JSON form
    pub fn is_finite(&self) -> bool {
        !matches!(self, PreferenceValue::Float(v) if !v.is_finite())
    }

    /// Encode for the store file
    ///
    /// Scalars are plain text; enums, lists and dictionaries are JSON text.
    pub fn encode(&self) -> Result<String> {
        let encoded = match self {
            PreferenceValue::Bool(v) => v.to_string(),
            PreferenceValue::Int(v) => v.to_string(),
            PreferenceValue::Float(v) => v.to_string(),
            PreferenceValue::String(v) => v.clone(),
            PreferenceValue::Enum(name) => serde_json::to_string(name)?,
            PreferenceValue::List(items) => serde_json::to_string(items)?,
            PreferenceValue::Dictionary(map) => serde_json::to_string(map)?,
        };
        Ok(encoded)
    }

    /// Decode text written by [`PreferenceValue::encode`]
    pub fn decode(ty: PreferenceType, raw: &str) -> Result<Self> {
        let value = match ty {
            PreferenceType::Bool => {
                PreferenceValue::Bool(raw.trim().to_lowercase().parse::<bool>().context("Failed to parse as bool")?)
            }
            PreferenceType::Int => {
                PreferenceValue::Int(raw.trim().parse::<i32>().context("Failed to parse as int")?)
            }
            PreferenceType::Float => {
                let value = raw.trim().parse::<f32>().context("Failed to parse as float")?;
                if !value.is_finite() {
                    anyhow::bail!("Float {} is not finite", value);
                }
                PreferenceValue::Float(value)
            }
            PreferenceType::String => PreferenceValue::String(raw.to_string()),
            PreferenceType::Enum => {
                PreferenceValue::Enum(serde_json::from_str(raw).context("Failed to parse enum name")?)
            }
            PreferenceType::List => {
                PreferenceValue::List(serde_json::from_str(raw).context("Failed to parse as list")?)
            }
            PreferenceType::Dictionary => PreferenceValue::Dictionary(
                serde_json::from_str(raw).context("Failed to parse as dictionary")?,
            ),
        };
        Ok(value)
    }

    /// JSON representation used inside preference sets
    pub fn to_json(&self) -> Value {
        match self {
            PreferenceValue::Bool(v) => Value::Bool(*v),
            PreferenceValue::Int(v) => Value::Number((*v).into()),
            PreferenceValue::Float(v) => serde_json::Number::from_f64(f64::from(*v))
                .map(Value::Number)
                .unwrap_or(Value::Null),
            PreferenceValue::String(v) | PreferenceValue::Enum(v) => Value::String(v.clone()),
            PreferenceValue::List(items) => Value::Array(items.clone()),
            PreferenceValue::Dictionary(map) => {
                Value::Object(map.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            }
        }
    }

    /// Rebuild a value of the given type from its preference set JSON
    pub fn from_json(ty: PreferenceType, value: &Value) -> Result<Self> {
        let result = match (ty, value) {
            (PreferenceType::Bool, Value::Bool(b)) => PreferenceValue::Bool(*b),
            (PreferenceType::Int, Value::Number(n)) => {
                let wide = n
                    .as_i64()
                    .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
                    .ok_or_else(|| anyhow::anyhow!("Expected integer, got {}", n))?;
                PreferenceValue::Int(i32::try_from(wide).context("Integer out of range")?)
            }
            (PreferenceType::Float, Value::Number(n)) => {
                let wide = n
                    .as_f64()
                    .ok_or_else(|| anyhow::anyhow!("Expected number, got {}", n))?;
                PreferenceValue::Float(wide as f32)
            }
            (PreferenceType::String, Value::String(s)) => PreferenceValue::String(s.clone()),
            (PreferenceType::Enum, Value::String(s)) => PreferenceValue::Enum(s.clone()),
            (PreferenceType::List, Value::Array(items)) => PreferenceValue::List(items.clone()),
            (PreferenceType::Dictionary, Value::Object(map)) => PreferenceValue::Dictionary(
                map.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
            ),
            (ty, value) => anyhow::bail!("Type mismatch: expected {}, got {}", ty, value),
        };
        Ok(result)
    }
}

impl std::fmt::Display for PreferenceValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PreferenceValue::Bool(v) => write!(f, "{}", v),
            PreferenceValue::Int(v) => write!(f, "{}", v),
            PreferenceValue::Float(v) => write!(f, "{}", v),
            PreferenceValue::String(v) | PreferenceValue::Enum(v) => f.write_str(v),
            other => write!(f, "{}", other.to_json()),
        }
    }
}

/// Rust types that may back a declared option or property
///
/// Implemented for `bool`, `i32`, `f32`, `String`, and for enums declared
/// with [`preference_enum!`](crate::preference_enum).
pub trait PreferenceKind: Clone + Default + 'static {
    /// Tag stored alongside the value
    const TYPE: PreferenceType;

    fn into_value(self) -> PreferenceValue;

    fn from_value(value: &PreferenceValue) -> Option<Self>;
}

impl PreferenceKind for bool {
    const TYPE: PreferenceType = PreferenceType::Bool;

    fn into_value(self) -> PreferenceValue {
        PreferenceValue::Bool(self)
    }

    fn from_value(value: &PreferenceValue) -> Option<Self> {
        match value {
            PreferenceValue::Bool(v) => Some(*v),
            _ => None,
        }
    }
}

impl PreferenceKind for i32 {
    const TYPE: PreferenceType = PreferenceType::Int;

    fn into_value(self) -> PreferenceValue {
        PreferenceValue::Int(self)
    }

    fn from_value(value: &PreferenceValue) -> Option<Self> {
        match value {
            PreferenceValue::Int(v) => Some(*v),
            _ => None,
        }
    }
}

impl PreferenceKind for f32 {
    const TYPE: PreferenceType = PreferenceType::Float;

    fn into_value(self) -> PreferenceValue {
        PreferenceValue::Float(self)
    }

    fn from_value(value: &PreferenceValue) -> Option<Self> {
        match value {
            PreferenceValue::Float(v) => Some(*v),
            _ => None,
        }
    }
}

impl PreferenceKind for String {
    const TYPE: PreferenceType = PreferenceType::String;

    fn into_value(self) -> PreferenceValue {
        PreferenceValue::String(self)
    }

    fn from_value(value: &PreferenceValue) -> Option<Self> {
        match value {
            PreferenceValue::String(v) => Some(v.clone()),
            _ => None,
        }
    }
}

/// Enumerations persisted by symbolic name
///
/// Usually implemented through [`preference_enum!`](crate::preference_enum).
pub trait PreferenceEnum: Copy + Default + 'static {
    /// Every variant, in declaration order
    fn variants() -> &'static [Self];

    /// Symbolic name written to disk
    fn name(&self) -> &'static str;

    /// Look a variant up by its symbolic name
    fn from_name(name: &str) -> Option<Self> {
        Self::variants().iter().copied().find(|v| v.name() == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_roundtrip() {
        for ty in [
            PreferenceType::Bool,
            PreferenceType::Int,
            PreferenceType::Float,
            PreferenceType::String,
            PreferenceType::Enum,
            PreferenceType::List,
            PreferenceType::Dictionary,
        ] {
            assert_eq!(PreferenceType::from_tag(ty.tag()), Some(ty));
        }
        assert_eq!(PreferenceType::from_tag("System.Int32"), None);
    }

    #[test]
    fn test_scalar_encoding_is_plain_text() {
        assert_eq!(PreferenceValue::Bool(true).encode().unwrap(), "true");
        assert_eq!(PreferenceValue::Int(-7).encode().unwrap(), "-7");
        assert_eq!(PreferenceValue::Float(0.25).encode().unwrap(), "0.25");
        assert_eq!(PreferenceValue::String("a b".into()).encode().unwrap(), "a b");
    }

    #[test]
    fn test_enum_encodes_symbolic_name() {
        let encoded = PreferenceValue::Enum("Hard".into()).encode().unwrap();
        assert_eq!(encoded, "\"Hard\"");
        let decoded = PreferenceValue::decode(PreferenceType::Enum, &encoded).unwrap();
        assert_eq!(decoded, PreferenceValue::Enum("Hard".into()));
    }

    #[test]
    fn test_decode_accepts_capitalized_bool() {
        let decoded = PreferenceValue::decode(PreferenceType::Bool, "True").unwrap();
        assert_eq!(decoded, PreferenceValue::Bool(true));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(PreferenceValue::decode(PreferenceType::Int, "twelve").is_err());
        assert!(PreferenceValue::decode(PreferenceType::Dictionary, "[1]").is_err());
    }

    #[test]
    fn test_float_json_survives_widening() {
        let value = PreferenceValue::Float(0.1);
        let json = value.to_json();
        let back = PreferenceValue::from_json(PreferenceType::Float, &json).unwrap();
        assert_eq!(back, value);
    }

    #[test]
    fn test_from_json_type_mismatch() {
        let result = PreferenceValue::from_json(PreferenceType::Bool, &Value::String("yes".into()));
        assert!(result.is_err());
    }

    #[test]
    fn test_non_finite_floats() {
        assert!(PreferenceValue::Float(1.5).is_finite());
        assert!(!PreferenceValue::Float(f32::NAN).is_finite());
        assert!(!PreferenceValue::Float(f32::INFINITY).is_finite());
        assert!(PreferenceValue::String("NaN".into()).is_finite());
        assert!(PreferenceValue::decode(PreferenceType::Float, "NaN").is_err());
        assert!(PreferenceValue::decode(PreferenceType::Float, "inf").is_err());
    }
}
