//! Filesystem layout configuration for the preference system
//!
//! Everything the crate writes lives below a single data directory:
//! - `Preferences/<mod>/<mod>[-<profile>].json` for live preference values
//! - `Preferences/global/global.json` for the global profile index
//! - `PreferenceSets/<name>.txt` for exported and imported preference sets

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const APP_DIR_NAME: &str = "PreferenceSystem";
const PREFERENCES_DIR_NAME: &str = "Preferences";
const PREFERENCE_SETS_DIR_NAME: &str = "PreferenceSets";

/// Location of all persisted preference data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Root directory for preference files and preference sets
    pub data_dir: PathBuf,
}

/// On-disk shape of an optional `preference-system.toml`
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    data_dir: Option<PathBuf>,
}

impl Config {
    /// Use an explicit data directory (tests, embedded hosts)
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Platform default data directory
    pub fn default_data_dir() -> Result<PathBuf> {
        let base = if let Some(dir) = dirs::data_dir() {
            dir
        } else {
            dirs::home_dir()
                .context("Failed to get home directory")?
                .join(".local")
                .join("share")
        };
        Ok(base.join(APP_DIR_NAME))
    }

    /// Load configuration from a TOML file, falling back to the platform default
    ///
    /// A missing file is not an error; the defaults are used instead.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file: ConfigFile = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?;
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?
        } else {
            log::debug!("No config file at {:?}, using defaults", path);
            ConfigFile::default()
        };

        let data_dir = match file.data_dir {
            Some(dir) => dir,
            None => Self::default_data_dir()?,
        };
        Ok(Self { data_dir })
    }

    /// Directory holding one sub-directory per mod namespace
    pub fn preferences_dir(&self) -> PathBuf {
        self.data_dir.join(PREFERENCES_DIR_NAME)
    }

    /// Directory holding `<name>.txt` preference set tokens
    pub fn preference_sets_dir(&self) -> PathBuf {
        self.data_dir.join(PREFERENCE_SETS_DIR_NAME)
    }
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = Self::default_data_dir().unwrap_or_else(|_| PathBuf::from(APP_DIR_NAME));
        Self { data_dir }
    }
}
