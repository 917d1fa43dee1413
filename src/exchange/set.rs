//! Preference set data model

use crate::preferences::{PreferenceType, PreferenceValue};
use anyhow::{Result, bail};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::Write as _;

/// Named snapshot of one or more mods' preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreferenceSet {
    #[serde(rename = "Name")]
    pub name: String,
    /// Unix timestamp in seconds
    #[serde(rename = "CreatedAt")]
    pub created_at: i64,
    #[serde(rename = "ReadOnlyMode", default)]
    pub read_only_mode: bool,
    #[serde(rename = "Managers", default)]
    pub managers: Vec<ManagerData>,
}

impl PreferenceSet {
    /// Empty set stamped with the current time
    pub fn new(name: &str, read_only_mode: bool) -> Self {
        Self {
            name: name.to_string(),
            created_at: Utc::now().timestamp(),
            read_only_mode,
            managers: Vec::new(),
        }
    }

    /// Add a mod's data, replacing any earlier data for the same mod
    pub fn add(&mut self, data: ManagerData) {
        match self.managers.iter_mut().find(|m| m.mod_guid == data.mod_guid) {
            Some(existing) => *existing = data,
            None => self.managers.push(data),
        }
    }

    pub fn manager(&self, mod_guid: &str) -> Option<&ManagerData> {
        self.managers.iter().find(|m| m.mod_guid == mod_guid)
    }

    /// Reject structurally broken sets
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            bail!("Preference set has no name");
        }
        for manager in &self.managers {
            manager.validate()?;
        }
        Ok(())
    }

    /// Human readable summary of the set
    pub fn preview(&self) -> String {
        let created = DateTime::<Utc>::from_timestamp(self.created_at, 0)
            .map(|utc| utc.format("%Y/%m/%d %H:%M:%S").to_string())
            .unwrap_or_default();

        let mut text = String::new();
        let _ = writeln!(text, "Name: {}", self.name);
        let _ = writeln!(text, "Created: {}", created);
        let _ = writeln!(text, "Read Only Mode: {}", self.read_only_mode);
        for manager in &self.managers {
            let _ = writeln!(text, "\tMod: {}", manager.mod_name);
            for preference in manager.preferences() {
                let _ = writeln!(
                    text,
                    "\t\t{}: {} ({})",
                    preference.key,
                    display_json(&preference.value),
                    preference.type_tag
                );
            }
        }
        text
    }
}

fn display_json(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// One mod's entries inside a preference set
///
/// Entries are stored as three parallel arrays, matching the exchange format.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ManagerData {
    #[serde(rename = "ModGuid")]
    pub mod_guid: String,
    #[serde(rename = "ModName", default)]
    pub mod_name: String,
    #[serde(default)]
    keys: Vec<String>,
    #[serde(default)]
    types: Vec<String>,
    #[serde(default)]
    values: Vec<Value>,
}

impl ManagerData {
    pub fn new(mod_guid: &str, mod_name: &str) -> Self {
        Self {
            mod_guid: mod_guid.to_string(),
            mod_name: mod_name.to_string(),
            ..Default::default()
        }
    }

    /// Add an entry, replacing any entry with the same key
    pub fn add(&mut self, preference: PreferenceData) {
        match self.keys.iter().position(|k| *k == preference.key) {
            Some(i) => {
                self.types[i] = preference.type_tag;
                self.values[i] = preference.value;
            }
            None => {
                self.keys.push(preference.key);
                self.types.push(preference.type_tag);
                self.values.push(preference.value);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn preferences(&self) -> Vec<PreferenceData> {
        self.keys
            .iter()
            .zip(&self.types)
            .zip(&self.values)
            .map(|((key, type_tag), value)| PreferenceData {
                key: key.clone(),
                type_tag: type_tag.clone(),
                value: value.clone(),
            })
            .collect()
    }

    pub fn get(&self, key: &str) -> Option<PreferenceData> {
        let i = self.keys.iter().position(|k| k == key)?;
        Some(PreferenceData {
            key: self.keys[i].clone(),
            type_tag: self.types[i].clone(),
            value: self.values[i].clone(),
        })
    }

    fn validate(&self) -> Result<()> {
        if self.mod_guid.is_empty() {
            bail!("Manager data has no mod id");
        }
        if self.keys.len() != self.types.len() || self.keys.len() != self.values.len() {
            bail!(
                "Manager data for {} has {} keys, {} types and {} values",
                self.mod_guid,
                self.keys.len(),
                self.types.len(),
                self.values.len()
            );
        }
        for preference in self.preferences() {
            preference.to_preference_value()?;
        }
        Ok(())
    }

    /// Whether every entry of `check` that this data also holds has the same value
    ///
    /// Keys present in `check` but absent here are ignored.
    pub fn satisfies(&self, check: &ManagerData) -> bool {
        check.preferences().iter().all(|expected| match self.get(&expected.key) {
            Some(actual) => actual.matches(expected),
            None => true,
        })
    }
}

/// A single (key, type tag, value) triple
#[derive(Debug, Clone, PartialEq)]
pub struct PreferenceData {
    pub key: String,
    pub type_tag: String,
    pub value: Value,
}

impl PreferenceData {
    pub fn from_value(key: &str, value: &PreferenceValue) -> Self {
        Self {
            key: key.to_string(),
            type_tag: value.ty().tag().to_string(),
            value: value.to_json(),
        }
    }

    pub fn value_type(&self) -> Option<PreferenceType> {
        PreferenceType::from_tag(&self.type_tag)
    }

    pub fn to_preference_value(&self) -> Result<PreferenceValue> {
        let Some(ty) = self.value_type() else {
            bail!("Unknown preference type '{}' for {}", self.type_tag, self.key);
        };
        PreferenceValue::from_json(ty, &self.value)
    }

    /// Same key, same type tag and equal values
    ///
    /// Numbers compare by value regardless of how they were written.
    pub fn matches(&self, other: &PreferenceData) -> bool {
        self.key == other.key
            && self.type_tag == other.type_tag
            && values_equal(&self.value, &other.value)
    }
}

enum Widened {
    Signed(i64),
    Unsigned(u64),
    Float(f64),
}

fn widen(value: &Value) -> Option<Widened> {
    let Value::Number(n) = value else {
        return None;
    };
    if let Some(i) = n.as_i64() {
        Some(Widened::Signed(i))
    } else if let Some(u) = n.as_u64() {
        Some(Widened::Unsigned(u))
    } else {
        n.as_f64().map(Widened::Float)
    }
}

fn as_f64(widened: &Widened) -> f64 {
    match *widened {
        Widened::Signed(i) => i as f64,
        Widened::Unsigned(u) => u as f64,
        Widened::Float(f) => f,
    }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    let (Some(wa), Some(wb)) = (widen(a), widen(b)) else {
        return a == b;
    };
    match (&wa, &wb) {
        (Widened::Signed(x), Widened::Signed(y)) => x == y,
        (Widened::Unsigned(x), Widened::Unsigned(y)) => x == y,
        (Widened::Signed(x), Widened::Unsigned(y)) => i128::from(*x) == i128::from(*y),
        (Widened::Unsigned(x), Widened::Signed(y)) => i128::from(*x) == i128::from(*y),
        _ => as_f64(&wa) == as_f64(&wb),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn data(key: &str, type_tag: &str, value: Value) -> PreferenceData {
        PreferenceData {
            key: key.to_string(),
            type_tag: type_tag.to_string(),
            value,
        }
    }

    #[test]
    fn test_set_add_replaces_same_mod() {
        let mut set = PreferenceSet::new("Casual", false);
        set.add(ManagerData::new("a", "Mod A"));
        let mut replacement = ManagerData::new("a", "Mod A");
        replacement.add(data("speed", "int", json!(3)));
        set.add(replacement);
        set.add(ManagerData::new("b", "Mod B"));

        assert_eq!(set.managers.len(), 2);
        assert_eq!(set.manager("a").unwrap().len(), 1);
    }

    #[test]
    fn test_manager_add_replaces_same_key() {
        let mut manager = ManagerData::new("a", "Mod A");
        manager.add(data("speed", "int", json!(3)));
        manager.add(data("speed", "int", json!(4)));
        assert_eq!(manager.preferences(), vec![data("speed", "int", json!(4))]);
    }

    #[test]
    fn test_numeric_widening() {
        assert!(values_equal(&json!(3), &json!(3u64)));
        assert!(values_equal(&json!(2.0), &json!(2)));
        assert!(!values_equal(&json!(-1), &json!(u64::MAX)));
        assert!(values_equal(&json!(0.5), &json!(0.5)));
        assert!(!values_equal(&json!("3"), &json!(3)));
    }

    #[test]
    fn test_matches_requires_type_tag() {
        let a = data("x", "int", json!(1));
        assert!(a.matches(&data("x", "int", json!(1))));
        assert!(!a.matches(&data("x", "float", json!(1))));
        assert!(!a.matches(&data("y", "int", json!(1))));
    }

    #[test]
    fn test_satisfies_ignores_missing_keys() {
        let mut live = ManagerData::new("a", "Mod A");
        live.add(data("speed", "int", json!(3)));

        let mut check = ManagerData::new("a", "Mod A");
        check.add(data("speed", "int", json!(3)));
        check.add(data("removed", "bool", json!(true)));
        assert!(live.satisfies(&check));

        check.add(data("speed", "int", json!(4)));
        assert!(!live.satisfies(&check));
    }

    #[test]
    fn test_validate_rejects_unknown_type() {
        let mut set = PreferenceSet::new("Bad", false);
        let mut manager = ManagerData::new("a", "Mod A");
        manager.add(data("speed", "quaternion", json!(3)));
        set.add(manager);
        assert!(set.validate().is_err());
    }

    #[test]
    fn test_preview_lists_entries() {
        let mut set = PreferenceSet::new("Casual", true);
        let mut manager = ManagerData::new("a", "Mod A");
        manager.add(data("speed", "int", json!(3)));
        manager.add(data("mode", "enum", json!("Hard")));
        set.add(manager);

        set.created_at = 1_700_000_000;

        let preview = set.preview();
        assert!(preview.starts_with("Name: Casual\nCreated: 2023/11/14 22:13:20\n"));
        assert!(preview.contains("Read Only Mode: true\n"));
        assert!(preview.contains("\tMod: Mod A\n"));
        assert!(preview.contains("\t\tspeed: 3 (int)\n"));
        assert!(preview.contains("\t\tmode: Hard (enum)\n"));
    }
}
