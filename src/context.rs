//! Shared state for every manager created by a host

use crate::config::Config;
use crate::exchange::PreferenceSetRegistry;
use crate::menu::ScopeIds;
use crate::preferences::GlobalProfiles;
use anyhow::Result;
use once_cell::unsync::OnceCell;
use std::cell::{RefCell, RefMut};
use std::rc::Rc;

struct ContextInner {
    config: Config,
    profiles: OnceCell<RefCell<GlobalProfiles>>,
    sets: RefCell<PreferenceSetRegistry>,
    scope_ids: ScopeIds,
}

/// Handle to the process-wide preference state
///
/// Holds the global profile index (opened on first use), the preference
/// set registry and the menu scope id counter. Cloning is cheap and every clone refers to the same state.
/// Everything runs on the host's UI thread, so the state is not `Send`.
#[derive(Clone)]
pub struct PreferenceContext {
    inner: Rc<ContextInner>,
}

impl PreferenceContext {
    pub fn new(config: Config) -> Self {
        let sets = PreferenceSetRegistry::new(config.preference_sets_dir());
        Self {
            inner: Rc::new(ContextInner {
                config,
                profiles: OnceCell::new(),
                sets: RefCell::new(sets),
                scope_ids: ScopeIds::default(),
            }),
        }
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Global profile index, loaded from disk on first access
    pub fn profiles(&self) -> Result<RefMut<'_, GlobalProfiles>> {
        let cell = self.inner.profiles.get_or_try_init(|| {
            GlobalProfiles::open(self.inner.config.preferences_dir()).map(RefCell::new)
        })?;
        Ok(cell.borrow_mut())
    }

    /// Counter every manager's menu scopes are numbered from
    pub fn scope_ids(&self) -> ScopeIds {
        self.inner.scope_ids.clone()
    }

    /// Registry of managers and cached preference sets
    pub fn sets(&self) -> RefMut<'_, PreferenceSetRegistry> {
        self.inner.sets.borrow_mut()
    }
}
