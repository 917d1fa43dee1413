//! File-backed storage for one mod's preferences

use super::types::{PreferenceKind, PreferenceType, PreferenceValue};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// One entry of a profile file
#[derive(Debug, Serialize, Deserialize)]
struct StoredPreference {
    #[serde(rename = "Key")]
    key: String,
    #[serde(rename = "Value")]
    value: String,
    #[serde(rename = "Type")]
    ty: PreferenceType,
}

/// Typed key/value store scoped to a mod and its current profile
///
/// Preferences are identified by `(key, type)`. Values live in memory and are
/// written wholesale to `<dir>/<mod>/<mod>[-<profile>].json` on [`save`](Self::save).
pub struct PreferenceStore {
    mod_id: String,
    preferences_dir: PathBuf,
    profile: String,
    file_path: PathBuf,
    values: HashMap<(String, PreferenceType), PreferenceValue>,
    order: Vec<(String, PreferenceType)>,
}

impl PreferenceStore {
    /// Create a store for `mod_id` under `preferences_dir`, on the default profile
    pub fn new(mod_id: &str, preferences_dir: impl AsRef<Path>) -> Self {
        let preferences_dir = preferences_dir.as_ref().to_path_buf();
        let file_path = Self::profile_path(&preferences_dir, mod_id, "");
        Self {
            mod_id: mod_id.to_string(),
            preferences_dir,
            profile: String::new(),
            file_path,
            values: HashMap::new(),
            order: Vec::new(),
        }
    }

    fn profile_path(preferences_dir: &Path, mod_id: &str, profile: &str) -> PathBuf {
        let file_name = if profile.is_empty() {
            format!("{}.json", mod_id)
        } else {
            format!("{}-{}.json", mod_id, profile)
        };
        preferences_dir.join(mod_id).join(file_name)
    }

    pub fn mod_id(&self) -> &str {
        &self.mod_id
    }

    /// Active profile name (empty for the default profile)
    pub fn profile(&self) -> &str {
        &self.profile
    }

    /// File the active profile is saved to
    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    /// Register a preference with its default value
    ///
    /// Returns `false` (and leaves the existing value alone) when the key is
    /// already registered for the same type.
    pub fn register(&mut self, key: &str, default: PreferenceValue) -> bool {
        let id = (key.to_string(), default.ty());
        if self.values.contains_key(&id) {
            log::warn!(
                "Unable to register {} ({}) for {}, key already registered",
                key,
                default.ty(),
                self.mod_id
            );
            return false;
        }
        log::debug!("Registered preference: {}.{} ({})", self.mod_id, key, default.ty());
        self.order.push(id.clone());
        self.values.insert(id, default);
        true
    }

    /// Check if a key is registered for a type
    pub fn is_registered(&self, key: &str, ty: PreferenceType) -> bool {
        self.values.contains_key(&(key.to_string(), ty))
    }

    /// Get a value by key and type
    pub fn get(&self, key: &str, ty: PreferenceType) -> Option<&PreferenceValue> {
        let value = self.values.get(&(key.to_string(), ty));
        if value.is_none() {
            log::warn!("Unable to get value of {} ({}), key not registered", key, ty);
        }
        value
    }

    /// Get a typed value, falling back to the type default when unregistered
    pub fn get_typed<T: PreferenceKind>(&self, key: &str) -> T {
        self.get(key, T::TYPE)
            .and_then(T::from_value)
            .unwrap_or_default()
    }

    /// Set a value with type checking, then save the profile file
    pub fn set(&mut self, key: &str, value: PreferenceValue) -> Result<()> {
        let id = (key.to_string(), value.ty());
        let Some(slot) = self.values.get_mut(&id) else {
            anyhow::bail!(
                "Unable to set value of {} ({}), key not registered",
                key,
                value.ty()
            );
        };
        log::debug!("Set preference: {}.{} = {}", self.mod_id, key, value);
        *slot = value;
        self.save()
    }

    /// Switch the active profile; does not load it
    pub fn set_profile(&mut self, profile: &str) {
        self.profile = profile.to_string();
        self.file_path = Self::profile_path(&self.preferences_dir, &self.mod_id, profile);
        log::debug!("Preference file for {} is now {:?}", self.mod_id, self.file_path);
    }

    /// Registered entries in registration order
    pub fn entries(&self) -> impl Iterator<Item = (&str, &PreferenceValue)> {
        self.order.iter().filter_map(move |id| {
            self.values.get(id).map(|value| (id.0.as_str(), value))
        })
    }

    /// Write every registered preference to the active profile file
    pub fn save(&self) -> Result<()> {
        let mut stored = Vec::with_capacity(self.order.len());
        for (key, value) in self.entries() {
            stored.push(StoredPreference {
                key: key.to_string(),
                value: value.encode()?,
                ty: value.ty(),
            });
        }

        if let Some(parent) = self.file_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create preference directory: {:?}", parent))?;
        }
        let contents = serde_json::to_string_pretty(&stored)?;
        std::fs::write(&self.file_path, contents)
            .with_context(|| format!("Failed to write preferences: {:?}", self.file_path))?;
        Ok(())
    }

    /// Read the active profile file into the registered preferences
    ///
    /// A missing or empty file leaves the in-memory values untouched.
    pub fn load(&mut self) -> Result<()> {
        let contents = if self.file_path.exists() {
            std::fs::read_to_string(&self.file_path)
                .with_context(|| format!("Failed to read preferences: {:?}", self.file_path))?
        } else {
            String::new()
        };
        if contents.trim().is_empty() {
            log::warn!(
                "Unable to load preferences for {}, file empty or not saved",
                self.mod_id
            );
            return Ok(());
        }

        let stored: Vec<StoredPreference> = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse preferences: {:?}", self.file_path))?;
        for item in stored {
            let id = (item.key, item.ty);
            let Some(slot) = self.values.get_mut(&id) else {
                log::warn!("Unable to load {} ({}), key not registered", id.0, id.1);
                continue;
            };
            match PreferenceValue::decode(id.1, &item.value) {
                Ok(value) => *slot = value,
                Err(e) => log::warn!("Unable to load {} ({}): {:#}", id.0, id.1, e),
            }
        }
        Ok(())
    }
}
