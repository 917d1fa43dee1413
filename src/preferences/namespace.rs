//! A mod's preference namespace

use super::store::PreferenceStore;
use super::types::{PreferenceKind, PreferenceType, PreferenceValue};
use crate::context::PreferenceContext;
use crate::exchange::{ManagerData, PreferenceData};
use anyhow::{Result, bail};

/// Registered preferences of one mod, bound to its current profile
///
/// Wraps a [`PreferenceStore`] with the registration rules of a manager: a
/// key is registered once, under one type, for the lifetime of the manager.
pub struct ModPreferences {
    mod_guid: String,
    mod_name: String,
    ctx: PreferenceContext,
    store: PreferenceStore,
    registered: Vec<(String, PreferenceType)>,
    defaults: Option<Vec<(String, PreferenceValue)>>,
}

impl ModPreferences {
    pub fn new(ctx: PreferenceContext, mod_guid: &str, mod_name: &str) -> Self {
        let store = PreferenceStore::new(mod_guid, ctx.config().preferences_dir());
        Self {
            mod_guid: mod_guid.to_string(),
            mod_name: mod_name.to_string(),
            ctx,
            store,
            registered: Vec::new(),
            defaults: None,
        }
    }

    pub fn mod_guid(&self) -> &str {
        &self.mod_guid
    }

    pub fn mod_name(&self) -> &str {
        &self.mod_name
    }

    /// Active profile of the underlying store
    pub fn profile(&self) -> &str {
        self.store.profile()
    }

    pub fn store(&self) -> &PreferenceStore {
        &self.store
    }

    /// Registered keys with their types, in registration order
    pub fn registered(&self) -> &[(String, PreferenceType)] {
        &self.registered
    }

    fn registered_type(&self, key: &str) -> Option<PreferenceType> {
        self.registered
            .iter()
            .find(|(registered, _)| registered == key)
            .map(|(_, ty)| *ty)
    }

    /// Register a preference with its initial value
    pub fn register<T: PreferenceKind>(&mut self, key: &str, initial: T) -> Result<()> {
        self.register_value(key, initial.into_value())
    }

    pub fn register_value(&mut self, key: &str, initial: PreferenceValue) -> Result<()> {
        if self.registered_type(key).is_some() {
            bail!("Key {} already exists!", key);
        }
        if !initial.is_finite() {
            bail!("Key {} cannot hold {}", key, initial);
        }
        let ty = initial.ty();
        self.store.register(key, initial);
        self.registered.push((key.to_string(), ty));
        Ok(())
    }

    pub fn has<T: PreferenceKind>(&self, key: &str) -> bool {
        self.registered_type(key) == Some(T::TYPE)
    }

    /// Live value of a registered key
    pub fn value(&self, key: &str) -> Option<&PreferenceValue> {
        let ty = self.registered_type(key)?;
        self.store.get(key, ty)
    }

    pub fn get<T: PreferenceKind>(&self, key: &str) -> Result<T> {
        let Some(ty) = self.registered_type(key) else {
            bail!("Key {} is not registered for {}", key, self.mod_guid);
        };
        if ty != T::TYPE {
            bail!("Key {} is registered as {}, not {}", key, ty, T::TYPE);
        }
        Ok(self.store.get_typed::<T>(key))
    }

    pub fn set<T: PreferenceKind>(&mut self, key: &str, value: T) -> Result<()> {
        self.set_value(key, value.into_value())
    }

    /// Type-checked write of a registered key; saves the profile
    pub fn set_value(&mut self, key: &str, value: PreferenceValue) -> Result<()> {
        match self.registered_type(key) {
            None => bail!("Key {} is not registered for {}", key, self.mod_guid),
            Some(ty) if ty != value.ty() => {
                bail!("Key {} is registered as {}, not {}", key, ty, value.ty())
            }
            Some(_) if !value.is_finite() => bail!("Key {} cannot hold {}", key, value),
            Some(_) => self.store.set(key, value),
        }
    }

    pub fn load(&mut self) -> Result<()> {
        self.store.load()
    }

    pub fn save(&self) -> Result<()> {
        self.store.save()
    }

    /// Make `profile` current: record it globally, then load and save it
    pub fn set_profile(&mut self, profile: &str) -> Result<()> {
        {
            let mut profiles = self.ctx.profiles()?;
            if !profiles.does_profile_exist(&self.mod_guid, profile) {
                profiles.add_profile(&self.mod_guid, profile)?;
            }
            profiles.set_profile(&self.mod_guid, profile)?;
        }
        log::info!("Switched {} to profile '{}'", self.mod_guid, profile);
        self.store.set_profile(profile);
        self.store.load()?;
        self.store.save()
    }

    /// Point the store at the globally recorded profile and load it
    pub fn switch_to_recorded_profile(&mut self) -> Result<()> {
        let profile = self.ctx.profiles()?.get_profile(&self.mod_guid);
        self.switch_profile_unrecorded(&profile)
    }

    /// Point the store at `profile` and load it, leaving the global index alone
    pub fn switch_profile_unrecorded(&mut self, profile: &str) -> Result<()> {
        log::debug!("Loading profile '{}' for {}", profile, self.mod_guid);
        self.store.set_profile(profile);
        self.store.load()
    }

    /// Snapshot current values as the defaults, once
    pub fn capture_defaults(&mut self) {
        if self.defaults.is_some() {
            return;
        }
        let snapshot = self
            .store
            .entries()
            .map(|(key, value)| (key.to_string(), value.clone()))
            .collect();
        self.defaults = Some(snapshot);
    }

    /// Write the defaults snapshot back into every registered key
    pub fn reset_to_defaults(&mut self) -> Result<()> {
        let Some(defaults) = self.defaults.clone() else {
            bail!("No defaults captured for {}", self.mod_guid);
        };
        for (key, value) in defaults {
            self.set_value(&key, value)?;
        }
        log::info!("Reset {} to defaults", self.mod_guid);
        Ok(())
    }

    /// Snapshot of every registered key for a preference set
    pub fn get_data(&self) -> ManagerData {
        let mut data = ManagerData::new(&self.mod_guid, &self.mod_name);
        for (key, ty) in &self.registered {
            if let Some(value) = self.store.get(key, *ty) {
                data.add(PreferenceData::from_value(key, value));
            }
        }
        data
    }

    /// Apply a preference set's data under the `<set>_Loaded` profile
    ///
    /// Stops at the first failing entry; entries already applied stay applied.
    pub fn load_data(&mut self, set_name: &str, data: &ManagerData) -> Result<()> {
        let preferences = data.preferences();
        if preferences.is_empty() {
            return Ok(());
        }
        self.set_profile(&format!("{}_Loaded", set_name))?;
        for preference in preferences {
            let value = preference.to_preference_value()?;
            self.set_value(&preference.key, value)?;
        }
        Ok(())
    }
}
