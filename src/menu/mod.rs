//! Declarative menu composition
//!
//! A [`PreferenceSystemManager`] accumulates [`Element`]s into scopes while a
//! mod declares its menu. [`register_menu`](PreferenceSystemManager::register_menu)
//! seals the scopes and hands them to a [`MenuHost`]. At render time a
//! [`MenuSession`] replays a scope through [`resolve`] against live state.

pub mod builder;
pub mod element;
pub mod generator;
pub mod host;
pub mod manager;
pub mod resolve;
pub mod session;

pub use builder::{MenuBuilder, sanitize_key};
pub use element::{
    ConfirmDecision, Element, ElementStyle, MenuAction, MenuKind, OptionDecl, OptionElement,
    ScopeId, ScopeIds,
};
pub use generator::IntValues;
pub use host::{CompiledScope, MenuHost, RecordingHost};
pub use manager::PreferenceSystemManager;
pub use resolve::{Resolution, page_count, resolve};
pub use session::{
    Activation, Binding, CREATE_PROFILE, ConfirmRequest, MenuSession, RenderedElement,
    SessionResponse,
};
