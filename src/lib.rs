//! Declarative, profile-aware preference menus for moddable games
//!
//! - [`preferences`] - typed stores, profiles and per-mod namespaces
//! - [`menu`] - menu declaration, resolution and live sessions
//! - [`exchange`] - shareable preference sets and drift detection
//! - [`context`] - shared state a host creates once
//! - [`config`] / [`logging`] - data directory and log setup

#[macro_use]
mod macros;

pub mod config;
pub mod context;
pub mod exchange;
pub mod logging;
pub mod menu;
pub mod preferences;

pub use config::Config;
pub use context::PreferenceContext;
pub use exchange::{PreferenceSet, PreferenceSetRegistry, Status};
pub use menu::{MenuHost, MenuKind, MenuSession, PreferenceSystemManager};
pub use preferences::{PreferenceEnum, PreferenceKind, PreferenceType, PreferenceValue};
