//! Stack-based scope builder
//!
//! Declarations append to the scope on top of the stack. Nesting rules for
//! blockers and paged items are checked as each marker is added.

use super::element::{Element, PredicateFn, ScopeId, ScopeIds};
use super::host::CompiledScope;
use anyhow::{Result, bail};
use once_cell::sync::Lazy;
use regex::Regex;
use std::rc::Rc;

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Strip all whitespace from a mod name or submenu key
pub fn sanitize_key(raw: &str) -> String {
    WHITESPACE.replace_all(raw, "").into_owned()
}

struct Scope {
    id: ScopeId,
    key: String,
    elements: Vec<Element>,
    /// Element indices of blockers not yet terminated
    open_blockers: Vec<usize>,
    compiled: Option<Rc<Vec<Element>>>,
}

impl Scope {
    fn new(id: ScopeId, key: String) -> Self {
        Self {
            id,
            key,
            elements: Vec::new(),
            open_blockers: Vec::new(),
            compiled: None,
        }
    }

    fn elements(&self) -> &[Element] {
        match &self.compiled {
            Some(compiled) => compiled.as_slice(),
            None => self.elements.as_slice(),
        }
    }

    /// Index of the unterminated paged item, if the nearest paged marker opens one
    fn open_paged_item(&self) -> Option<usize> {
        self.elements
            .iter()
            .enumerate()
            .rev()
            .find(|(_, e)| matches!(e, Element::PagedItem | Element::PagedItemDone))
            .and_then(|(i, e)| matches!(e, Element::PagedItem).then_some(i))
    }
}

/// Per-manager arena of menu scopes
///
/// Scope ids come from a shared [`ScopeIds`] counter; the stack and the
/// sealing order hold positions in this builder's arena.
pub struct MenuBuilder {
    mod_key: String,
    ids: ScopeIds,
    scopes: Vec<Scope>,
    stack: Vec<usize>,
    completed: Vec<usize>,
}

impl MenuBuilder {
    pub fn new(mod_name: &str, ids: ScopeIds) -> Self {
        let mod_key = sanitize_key(mod_name);
        let root = Scope::new(ids.allocate(), mod_key.clone());
        Self {
            scopes: vec![root],
            mod_key,
            ids,
            stack: vec![0],
            completed: Vec::new(),
        }
    }

    pub fn root(&self) -> ScopeId {
        self.scopes[0].id
    }

    /// Scope currently receiving declarations
    pub fn current(&self) -> Option<ScopeId> {
        self.stack.last().map(|&index| self.scopes[index].id)
    }

    pub fn is_sealed(&self) -> bool {
        self.stack.is_empty()
    }

    fn current_scope(&mut self) -> Result<&mut Scope> {
        let Some(&index) = self.stack.last() else {
            bail!("Menu for {} is already registered", self.mod_key);
        };
        Ok(&mut self.scopes[index])
    }

    fn scope(&self, id: ScopeId) -> Option<&Scope> {
        self.scopes.iter().find(|scope| scope.id == id)
    }

    pub fn scope_key(&self, id: ScopeId) -> Option<&str> {
        self.scope(id).map(|scope| scope.key.as_str())
    }

    pub fn elements(&self, id: ScopeId) -> Option<&[Element]> {
        self.scope(id).map(Scope::elements)
    }

    /// Append a structurally neutral element
    pub fn push(&mut self, element: Element) -> Result<()> {
        self.current_scope()?.elements.push(element);
        Ok(())
    }

    /// Open a submenu and make it current
    pub fn add_submenu(&mut self, text: &str, key: &str, skip_stack: bool) -> Result<ScopeId> {
        let full_key = format!("{}_{}", self.mod_key, sanitize_key(key));
        if self.scopes.iter().any(|scope| scope.key == full_key) {
            bail!("Submenu key already exists!");
        }
        self.current_scope()?;
        let id = self.ids.allocate();
        self.push(Element::SubmenuButton {
            text: text.to_string(),
            scope: id,
            skip_stack,
        })?;
        log::debug!("Opened submenu {} ({:?})", full_key, id);
        self.stack.push(self.scopes.len());
        self.scopes.push(Scope::new(id, full_key));
        Ok(id)
    }

    /// Seal the current submenu and return to its parent
    pub fn submenu_done(&mut self) -> Result<()> {
        if self.stack.len() < 2 {
            bail!("Submenu depth already at highest level.");
        }
        self.seal_top();
        Ok(())
    }

    fn seal_top(&mut self) {
        let Some(index) = self.stack.pop() else {
            return;
        };
        let scope = &mut self.scopes[index];
        if !scope.open_blockers.is_empty() || scope.open_paged_item().is_some() {
            log::warn!("Scope {} sealed with unterminated regions", scope.key);
        }
        scope.compiled = Some(Rc::new(std::mem::take(&mut scope.elements)));
        self.completed.push(index);
    }

    /// Seal every open scope down to the root
    pub fn seal_all(&mut self) {
        while !self.stack.is_empty() {
            self.seal_top();
        }
    }

    pub fn add_conditional_blocker(&mut self, predicate: PredicateFn) -> Result<()> {
        let scope = self.current_scope()?;
        scope.open_blockers.push(scope.elements.len());
        scope.elements.push(Element::ConditionalBlocker { predicate });
        Ok(())
    }

    pub fn conditional_blocker_done(&mut self) -> Result<()> {
        let scope = self.current_scope()?;
        let Some(&open) = scope.open_blockers.last() else {
            bail!("No blockers to terminate");
        };

        let mut depth = 0i32;
        for element in &scope.elements[open + 1..] {
            match element {
                Element::PagedItem => depth += 1,
                Element::PagedItemDone => depth -= 1,
                _ => continue,
            }
            if depth < 0 {
                break;
            }
        }
        if depth != 0 {
            bail!("Conditional blocker cannot cross a paged item boundary");
        }

        scope.open_blockers.pop();
        scope.elements.push(Element::ConditionalBlockerDone);
        Ok(())
    }

    /// Paginate the current scope
    pub fn add_page_selector(&mut self, max_items_per_page: usize) -> Result<()> {
        if max_items_per_page == 0 {
            bail!("Page selector needs at least one item per page");
        }
        let scope = self.current_scope()?;
        if scope
            .elements
            .iter()
            .any(|e| matches!(e, Element::PageSelector { .. }))
        {
            bail!("Scope already has a page selector");
        }
        if scope.elements.iter().any(Element::is_selectable) {
            bail!("Page selector must be added before any selectable element");
        }
        scope.elements.push(Element::PageSelector { max_items_per_page });
        Ok(())
    }

    pub fn start_paged_item(&mut self) -> Result<()> {
        let scope = self.current_scope()?;
        if !scope
            .elements
            .iter()
            .any(|e| matches!(e, Element::PageSelector { .. }))
        {
            bail!("Paged item requires a page selector earlier in the menu");
        }
        if scope.open_paged_item().is_some() {
            bail!("Previous paged item is not terminated");
        }
        scope.elements.push(Element::PagedItem);
        Ok(())
    }

    pub fn paged_item_done(&mut self) -> Result<()> {
        let scope = self.current_scope()?;
        let Some(open) = scope.open_paged_item() else {
            bail!("No paged item to terminate");
        };
        if scope.open_blockers.iter().any(|&blocker| blocker > open) {
            bail!("Conditional blocker inside paged item is not terminated");
        }
        scope.elements.push(Element::PagedItemDone);
        Ok(())
    }

    /// Every sealed scope, in sealing order
    pub fn compiled(&self) -> Vec<CompiledScope> {
        self.completed
            .iter()
            .filter_map(|&index| {
                let scope = &self.scopes[index];
                scope.compiled.as_ref().map(|elements| CompiledScope {
                    id: scope.id,
                    key: scope.key.clone(),
                    elements: Rc::clone(elements),
                })
            })
            .collect()
    }
}
