use super::element::{Element, MenuKind, ScopeId};
use std::rc::Rc;

/// A sealed scope handed to the host
#[derive(Debug, Clone)]
pub struct CompiledScope {
    /// Unique among the scopes of every manager sharing a context
    pub id: ScopeId,
    /// Unique key, `<Mod>` for the root and `<Mod>_<Submenu>` below it
    pub key: String,
    pub elements: Rc<Vec<Element>>,
}

/// The menu system a manager publishes into
pub trait MenuHost {
    /// Receive a sealed scope; called once per scope
    fn publish(&mut self, scope: CompiledScope);

    /// Attach a mod's root scope to a host menu; called once per kind
    fn register_root(&mut self, kind: MenuKind, mod_name: &str, scope: ScopeId);
}

/// Host that keeps everything it is given, for embedding and tests
#[derive(Debug, Default)]
pub struct RecordingHost {
    pub scopes: Vec<CompiledScope>,
    pub roots: Vec<(MenuKind, String, ScopeId)>,
}

impl RecordingHost {
    pub fn scope(&self, id: ScopeId) -> Option<&CompiledScope> {
        self.scopes.iter().find(|scope| scope.id == id)
    }

    pub fn scope_by_key(&self, key: &str) -> Option<&CompiledScope> {
        self.scopes.iter().find(|scope| scope.key == key)
    }
}

impl MenuHost for RecordingHost {
    fn publish(&mut self, scope: CompiledScope) {
        self.scopes.push(scope);
    }

    fn register_root(&mut self, kind: MenuKind, mod_name: &str, scope: ScopeId) {
        self.roots.push((kind, mod_name.to_string(), scope));
    }
}
