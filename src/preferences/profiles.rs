//! Global profile index shared by every mod

use super::store::PreferenceStore;
use super::types::{PreferenceType, PreferenceValue};
use anyhow::Result;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

/// Namespace the index is persisted under
pub const GLOBAL_NAMESPACE: &str = "global";

const CURRENT_PROFILE_KEY: &str = "modCurrentProfile";
const MOD_PROFILES_KEY: &str = "modProfiles";

/// Current profile and known profiles, per mod id
///
/// Lives in its own store so it never depends on a single mod's files.
pub struct GlobalProfiles {
    store: PreferenceStore,
}

impl GlobalProfiles {
    /// Register the index preferences and load them from disk
    pub fn open(preferences_dir: impl AsRef<Path>) -> Result<Self> {
        let mut store = PreferenceStore::new(GLOBAL_NAMESPACE, preferences_dir);
        store.register(CURRENT_PROFILE_KEY, PreferenceValue::Dictionary(BTreeMap::new()));
        store.register(MOD_PROFILES_KEY, PreferenceValue::Dictionary(BTreeMap::new()));
        store.load()?;
        log::debug!("Opened global profile index at {:?}", store.file_path());
        Ok(Self { store })
    }

    fn dictionary(&self, key: &str) -> BTreeMap<String, Value> {
        match self.store.get(key, PreferenceType::Dictionary) {
            Some(PreferenceValue::Dictionary(map)) => map.clone(),
            _ => BTreeMap::new(),
        }
    }

    /// Known profile names of a mod, in creation order
    pub fn get_profiles(&self, mod_id: &str) -> Vec<String> {
        match self.dictionary(MOD_PROFILES_KEY).get(mod_id) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|item| item.as_str().map(String::from))
                .collect(),
            _ => Vec::new(),
        }
    }

    fn store_profiles(&mut self, mod_id: &str, profiles: Vec<String>) -> Result<()> {
        let mut map = self.dictionary(MOD_PROFILES_KEY);
        map.insert(
            mod_id.to_string(),
            Value::Array(profiles.into_iter().map(Value::String).collect()),
        );
        self.store.set(MOD_PROFILES_KEY, PreferenceValue::Dictionary(map))
    }

    /// Record a new profile name for a mod
    pub fn add_profile(&mut self, mod_id: &str, profile: &str) -> Result<()> {
        let mut profiles = self.get_profiles(mod_id);
        if profiles.iter().any(|p| p == profile) {
            return Ok(());
        }
        profiles.push(profile.to_string());
        log::info!("Added profile '{}' for {}", profile, mod_id);
        self.store_profiles(mod_id, profiles)
    }

    /// Forget a profile name for a mod
    pub fn remove_profile(&mut self, mod_id: &str, profile: &str) -> Result<()> {
        let mut profiles = self.get_profiles(mod_id);
        profiles.retain(|p| p != profile);
        log::info!("Removed profile '{}' for {}", profile, mod_id);
        self.store_profiles(mod_id, profiles)
    }

    pub fn does_profile_exist(&self, mod_id: &str, profile: &str) -> bool {
        self.get_profiles(mod_id).iter().any(|p| p == profile)
    }

    /// Current profile of a mod; empty for the default profile
    pub fn get_profile(&self, mod_id: &str) -> String {
        self.dictionary(CURRENT_PROFILE_KEY)
            .get(mod_id)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    }

    /// Record the current profile of a mod
    pub fn set_profile(&mut self, mod_id: &str, profile: &str) -> Result<()> {
        let mut map = self.dictionary(CURRENT_PROFILE_KEY);
        map.insert(mod_id.to_string(), Value::String(profile.to_string()));
        self.store.set(CURRENT_PROFILE_KEY, PreferenceValue::Dictionary(map))
    }
}
