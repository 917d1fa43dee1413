//! Shareable preference sets
//!
//! - [`set`] - set and per-mod data model, drift comparison
//! - [`codec`] - JSON and compressed base64 token
//! - [`registry`] - registered managers, cached sets on disk, load and drift detection

pub mod codec;
pub mod registry;
pub mod set;

pub use registry::PreferenceSetRegistry;
pub use set::{ManagerData, PreferenceData, PreferenceSet};

/// Outcome of an exchange operation, suitable for showing to the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub success: bool,
    pub message: String,
}

impl Status {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}
