//! Registered managers and the on-disk preference set cache

use super::Status;
use super::codec;
use super::set::PreferenceSet;
use crate::preferences::{ModPreferences, PreferenceKind};
use anyhow::{Context, Result};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::rc::{Rc, Weak};

struct RegisteredManager {
    name: String,
    preferences: Weak<RefCell<ModPreferences>>,
}

/// Every manager known to a context, plus the sets found in the sets directory
///
/// Managers are held weakly; a dropped manager behaves as if it was never
/// registered.
pub struct PreferenceSetRegistry {
    sets_dir: PathBuf,
    managers: BTreeMap<String, RegisteredManager>,
    cache: BTreeMap<String, PreferenceSet>,
    file_paths: BTreeMap<String, PathBuf>,
    last_loaded: Option<String>,
}

impl PreferenceSetRegistry {
    pub fn new(sets_dir: impl AsRef<Path>) -> Self {
        Self {
            sets_dir: sets_dir.as_ref().to_path_buf(),
            managers: BTreeMap::new(),
            cache: BTreeMap::new(),
            file_paths: BTreeMap::new(),
            last_loaded: None,
        }
    }

    pub fn sets_dir(&self) -> &Path {
        &self.sets_dir
    }

    /// Register a manager; the first registration for a mod id wins
    pub fn add_manager(&mut self, preferences: &Rc<RefCell<ModPreferences>>) -> bool {
        let (guid, name) = {
            let prefs = preferences.borrow();
            (prefs.mod_guid().to_string(), prefs.mod_name().to_string())
        };
        if self.live_manager(&guid).is_some() {
            log::warn!(
                "Preference manager for {} already registered, skipping add to registry",
                guid
            );
            return false;
        }
        log::debug!("Registered preference manager {} ({})", guid, name);
        self.managers.insert(
            guid,
            RegisteredManager {
                name,
                preferences: Rc::downgrade(preferences),
            },
        );
        true
    }

    fn live_manager(&self, guid: &str) -> Option<Rc<RefCell<ModPreferences>>> {
        self.managers.get(guid)?.preferences.upgrade()
    }

    /// Mod id to mod name of every live manager
    pub fn registered_mods(&self) -> BTreeMap<String, String> {
        self.managers
            .iter()
            .filter(|(_, manager)| manager.preferences.strong_count() > 0)
            .map(|(guid, manager)| (guid.clone(), manager.name.clone()))
            .collect()
    }

    /// Build a set from the live values of the given mods
    pub fn convert(
        &self,
        name: &str,
        mod_guids: &[&str],
        read_only_mode: bool,
    ) -> std::result::Result<PreferenceSet, Status> {
        if name.is_empty() {
            return Err(Status::failed("Preference Set Name cannot be empty."));
        }
        if mod_guids.is_empty() {
            return Err(Status::failed("At least one mod must be selected."));
        }

        let mut set = PreferenceSet::new(name, read_only_mode);
        for guid in mod_guids {
            let Some(manager) = self.live_manager(guid) else {
                return Err(Status::failed(format!("{} not found!", guid)));
            };
            set.add(manager.borrow().get_data());
        }
        Ok(set)
    }

    fn set_file_name(name: &str) -> String {
        format!("{}.txt", name)
    }

    fn ensure_sets_dir(&self) -> Result<()> {
        std::fs::create_dir_all(&self.sets_dir)
            .with_context(|| format!("Failed to create preference set directory: {:?}", self.sets_dir))
    }

    /// Convert the given mods into a set and write its token to `<sets_dir>/<name>.txt`
    pub fn export(&mut self, name: &str, read_only_mode: bool, mod_guids: &[&str]) -> Status {
        if let Err(e) = self.ensure_sets_dir() {
            log::error!("{:#}", e);
            return Status::failed(e.to_string());
        }

        let set = match self.convert(name, mod_guids, read_only_mode) {
            Ok(set) => set,
            Err(status) => return status,
        };
        if let Err(e) = set.validate() {
            log::error!("Refusing to export '{}': {:#}", name, e);
            return Status::failed(format!("Failed to export {}", name));
        }

        let file_name = Self::set_file_name(name);
        let path = self.sets_dir.join(&file_name);
        if path.exists() {
            return Status::failed(format!("{} is used.", file_name));
        }

        let written = codec::encode(&set).and_then(|token| {
            std::fs::write(&path, token)
                .with_context(|| format!("Failed to write preference set: {:?}", path))
        });
        if let Err(e) = written {
            log::error!("{:#}", e);
            return Status::failed(format!("Failed to export {}", name));
        }

        log::info!("Exported preference set '{}' to {:?}", name, path);
        self.init_preference_sets();
        Status::ok(format!("Preference Set exported to {}", path.display()))
    }

    /// Save a pasted token as a set, optionally renaming it
    ///
    /// A rename also stamps the set with the current time.
    pub fn import(&mut self, token: &str, name_override: Option<&str>) -> Status {
        if let Err(e) = self.ensure_sets_dir() {
            log::error!("{:#}", e);
            return Status::failed(e.to_string());
        }

        let json = match codec::decompress_from_base64(token) {
            Ok(json) => json,
            Err(e) => {
                log::error!("{:#}", e);
                return Status::failed(
                    "Invalid Base64 string! Check that all the text is correctly copied.",
                );
            }
        };
        let mut set = match codec::deserialize(&json) {
            Ok(set) => set,
            Err(e) => {
                log::error!("{:#}", e);
                return Status::failed(
                    "Invalid data contained in import! Check that all the text is correctly copied.",
                );
            }
        };

        let mut token = token.trim().to_string();
        if let Some(name) = name_override.filter(|name| !name.is_empty()) {
            let renamed = PreferenceSet::new(name, set.read_only_mode);
            set.name = renamed.name;
            set.created_at = renamed.created_at;
            token = match codec::encode(&set) {
                Ok(token) => token,
                Err(e) => {
                    log::error!("{:#}", e);
                    return Status::failed(format!("Failed to import {}", set.name));
                }
            };
        }

        let file_name = Self::set_file_name(&set.name);
        let path = self.sets_dir.join(&file_name);
        if path.exists() {
            return Status::failed(format!(
                "{} is used. If this preference set has not already been imported, please provide a new preference set name.",
                file_name
            ));
        }
        if let Err(e) = std::fs::write(&path, token) {
            log::error!("Failed to write preference set {:?}: {}", path, e);
            return Status::failed(format!("Failed to import {}", set.name));
        }

        log::info!("Imported preference set '{}' to {:?}", set.name, path);
        self.init_preference_sets();
        Status::ok(format!("Preference Set imported and saved to {}", path.display()))
    }

    /// Rebuild the cache from the sets directory
    ///
    /// Unreadable or undecodable files are skipped. When two files carry the
    /// same set name, the first in path order wins.
    pub fn init_preference_sets(&mut self) {
        self.cache.clear();
        self.file_paths.clear();
        if let Err(e) = self.ensure_sets_dir() {
            log::error!("{:#}", e);
            return;
        }

        let mut paths: Vec<PathBuf> = match std::fs::read_dir(&self.sets_dir) {
            Ok(entries) => entries
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|path| path.is_file())
                .collect(),
            Err(e) => {
                log::error!("Failed to read {:?}: {}", self.sets_dir, e);
                return;
            }
        };
        paths.sort();

        for path in paths {
            let set = std::fs::read_to_string(&path)
                .map_err(anyhow::Error::from)
                .and_then(|token| codec::decode(&token));
            match set {
                Ok(set) if !self.cache.contains_key(&set.name) => {
                    self.file_paths.insert(set.name.clone(), path);
                    self.cache.insert(set.name.clone(), set);
                }
                Ok(set) => log::warn!("Skipping {:?}, set '{}' already cached", path, set.name),
                Err(e) => log::debug!("Skipping {:?}: {:#}", path, e),
            }
        }
        log::debug!("Cached {} preference sets", self.cache.len());
    }

    pub fn cached_sets(&self) -> &BTreeMap<String, PreferenceSet> {
        &self.cache
    }

    pub fn cached_set_names(&self) -> Vec<String> {
        self.cache.keys().cloned().collect()
    }

    pub fn cached_set(&self, name: &str) -> Option<&PreferenceSet> {
        self.cache.get(name)
    }

    /// Token text of a cached set, as written to its file
    pub fn token(&self, name: &str) -> Option<String> {
        let path = self.file_paths.get(name)?;
        std::fs::read_to_string(path).ok()
    }

    /// Preview of a cached set; empty when the set is unknown
    pub fn preview(&self, name: &str) -> String {
        self.cache.get(name).map(PreferenceSet::preview).unwrap_or_default()
    }

    pub fn last_loaded_set_name(&self) -> Option<&str> {
        self.last_loaded.as_deref()
    }

    /// Apply a cached set to every registered mod it covers
    ///
    /// Mods are applied independently. A failure anywhere makes the whole load
    /// a failure, but values already written are kept.
    pub fn load(&mut self, name: &str) -> Status {
        let Some(set) = self.cache.get(name) else {
            return Status::failed(format!("Preference Set {} not found!", name));
        };

        let mut failed = Vec::new();
        for data in &set.managers {
            let Some(manager) = self.live_manager(&data.mod_guid) else {
                log::error!("Cannot load '{}' into {}, mod not registered", set.name, data.mod_guid);
                failed.push(data.mod_name.clone());
                continue;
            };
            if let Err(e) = manager.borrow_mut().load_data(&set.name, data) {
                log::error!("Cannot load '{}' into {}: {:#}", set.name, data.mod_guid, e);
                failed.push(data.mod_name.clone());
            }
        }

        if !failed.is_empty() {
            return Status::failed(format!(
                "Failed to load Preference Set {} for {}",
                name,
                failed.join(", ")
            ));
        }
        log::info!("Loaded preference set '{}'", name);
        self.last_loaded = Some(name.to_string());
        Status::ok(format!("Loaded Preference Set {}", name))
    }

    /// Whether live values drifted from the last loaded set
    ///
    /// Mods that are no longer registered and keys that no longer exist are
    /// not considered. A last loaded set that left the cache is forgotten.
    pub fn is_preferences_tampered(&mut self) -> bool {
        let Some(name) = self.last_loaded.clone() else {
            return false;
        };
        let Some(set) = self.cache.get(&name) else {
            self.last_loaded = None;
            return false;
        };

        set.managers.iter().any(|check| match self.live_manager(&check.mod_guid) {
            Some(manager) => !manager.borrow().get_data().satisfies(check),
            None => false,
        })
    }

    /// Remove a cached set's file and rescan
    pub fn delete(&mut self, name: &str) -> Status {
        let Some(path) = self.file_paths.get(name).cloned() else {
            return Status::failed(format!("Preference Set {} not found!", name));
        };
        if let Err(e) = std::fs::remove_file(&path) {
            log::error!("Failed to delete {:?}: {}", path, e);
            return Status::failed(format!("Failed to delete {}", name));
        }
        log::info!("Deleted preference set '{}'", name);
        self.init_preference_sets();
        Status::ok(format!("Deleted Preference Set {}", name))
    }

    /// Live value of another mod's preference; the type default when unavailable
    pub fn preference_value<T: PreferenceKind>(&self, mod_guid: &str, key: &str) -> T {
        let Some(manager) = self.live_manager(mod_guid) else {
            return T::default();
        };
        let value = manager.borrow().get::<T>(key);
        value.unwrap_or_else(|e| {
            log::warn!("Unable to read {}.{}: {:#}", mod_guid, key, e);
            T::default()
        })
    }
}
