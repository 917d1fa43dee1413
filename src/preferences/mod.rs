//! Typed, profile-aware preference persistence
//!
//! - [`types`] - value and type-tag definitions
//! - [`store`] - file-backed store for one mod and profile
//! - [`profiles`] - global profile index
//! - [`namespace`] - a mod's registered preferences, defaults and profile switching

pub mod namespace;
pub mod profiles;
pub mod store;
pub mod types;

pub use namespace::ModPreferences;
pub use profiles::GlobalProfiles;
pub use store::PreferenceStore;
pub use types::{PreferenceEnum, PreferenceKind, PreferenceType, PreferenceValue};
