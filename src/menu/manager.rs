//! Per-mod declaration facade

use super::builder::MenuBuilder;
use super::element::{
    ConfirmDecision, Element, ElementStyle, MenuAction, MenuKind, OptionDecl, ScopeId,
};
use super::host::{CompiledScope, MenuHost};
use super::session::MenuSession;
use crate::context::PreferenceContext;
use crate::exchange::ManagerData;
use crate::preferences::{ModPreferences, PreferenceKind};
use anyhow::{Result, bail};
use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

const RESET_CONFIRM_TEXT: &str = "Reset all preferences to their defaults?";

/// Declares a mod's preferences and menu tree
///
/// Infallible declarations return `&mut Self` for chaining; declarations that
/// can violate a nesting rule return `Result<&mut Self>`.
///
/// ```
/// use preference_system::config::Config;
/// use preference_system::context::PreferenceContext;
/// use preference_system::menu::{MenuKind, PreferenceSystemManager, RecordingHost};
///
/// # fn main() -> anyhow::Result<()> {
/// let dir = tempfile::tempdir()?;
/// let ctx = PreferenceContext::new(Config::with_data_dir(dir.path()));
/// let mut manager = PreferenceSystemManager::new(&ctx, "com.example.kitchen", "Kitchen Tweaks");
/// manager
///     .add_label("Kitchen Tweaks")
///     .add_option("fast", false, vec![false, true], vec!["Off".into(), "On".into()])?
///     .add_submenu("Advanced", "advanced", false)?
///     .add_property("seed", 7)?
///     .submenu_done()?;
///
/// let mut host = RecordingHost::default();
/// manager.register_menu(&mut host, MenuKind::MainMenu)?;
/// assert_eq!(host.scopes.len(), 2);
/// # Ok(())
/// # }
/// ```
pub struct PreferenceSystemManager {
    mod_guid: String,
    mod_name: String,
    ctx: PreferenceContext,
    prefs: Rc<RefCell<ModPreferences>>,
    builder: MenuBuilder,
    published: bool,
    roots: HashSet<MenuKind>,
}

impl PreferenceSystemManager {
    /// Create a manager and add it to the context's set registry
    pub fn new(ctx: &PreferenceContext, mod_guid: &str, mod_name: &str) -> Self {
        let prefs = Rc::new(RefCell::new(ModPreferences::new(ctx.clone(), mod_guid, mod_name)));
        ctx.sets().add_manager(&prefs);
        Self {
            mod_guid: mod_guid.to_string(),
            mod_name: mod_name.to_string(),
            ctx: ctx.clone(),
            prefs,
            builder: MenuBuilder::new(mod_name, ctx.scope_ids()),
            published: false,
            roots: HashSet::new(),
        }
    }

    pub fn mod_guid(&self) -> &str {
        &self.mod_guid
    }

    pub fn mod_name(&self) -> &str {
        &self.mod_name
    }

    pub fn context(&self) -> &PreferenceContext {
        &self.ctx
    }

    /// Shared handle to this mod's preferences
    pub fn preferences(&self) -> Rc<RefCell<ModPreferences>> {
        Rc::clone(&self.prefs)
    }

    /// Id of this mod's root scope, unique within the context
    pub fn root_scope(&self) -> ScopeId {
        self.builder.root()
    }

    /// Whether the menu tree was sealed and published
    pub fn is_registered(&self) -> bool {
        self.published
    }

    fn ensure_declaring(&self) -> Result<()> {
        if self.builder.is_sealed() {
            bail!("Menu for {} is already registered", self.mod_guid);
        }
        Ok(())
    }

    fn append(&mut self, element: Element) -> &mut Self {
        if let Err(e) = self.builder.push(element) {
            log::error!("Ignoring declaration for {}: {:#}", self.mod_guid, e);
        }
        self
    }

    /// Register a preference and show it as an option
    pub fn add_option<T: PreferenceKind>(
        &mut self,
        key: &str,
        initial: T,
        values: Vec<T>,
        strings: Vec<String>,
    ) -> Result<&mut Self> {
        self.add_option_with(OptionDecl::new(key, initial).values(values).strings(strings))
    }

    pub fn add_option_with<T: PreferenceKind>(&mut self, decl: OptionDecl<T>) -> Result<&mut Self> {
        self.ensure_declaring()?;
        let key = decl.key().to_string();
        let initial = decl.initial();
        let element = decl.build()?;
        self.prefs.borrow_mut().register(&key, initial)?;
        self.builder.push(element)?;
        Ok(self)
    }

    /// Register a preference without showing it
    pub fn add_property<T: PreferenceKind>(&mut self, key: &str, initial: T) -> Result<&mut Self> {
        self.add_property_with_load(key, initial, false)
    }

    /// Register a hidden preference, optionally reloading the active profile afterwards
    pub fn add_property_with_load<T: PreferenceKind>(
        &mut self,
        key: &str,
        initial: T,
        do_load: bool,
    ) -> Result<&mut Self> {
        let mut prefs = self.prefs.borrow_mut();
        prefs.register(key, initial)?;
        if do_load {
            prefs.load()?;
        }
        drop(prefs);
        Ok(self)
    }

    pub fn add_label(&mut self, text: &str) -> &mut Self {
        self.append(Element::Label {
            text: text.to_string(),
        })
    }

    pub fn add_info(&mut self, text: &str) -> &mut Self {
        self.append(Element::Info {
            text: text.to_string(),
        })
    }

    pub fn add_spacer(&mut self) -> &mut Self {
        self.append(Element::Spacer)
    }

    pub fn add_select(
        &mut self,
        options: Vec<String>,
        on_activate: impl Fn(usize) + 'static,
        index: usize,
    ) -> &mut Self {
        self.append(Element::Select {
            options,
            on_activate: Rc::new(on_activate),
            index,
        })
    }

    pub fn add_button(
        &mut self,
        text: &str,
        on_activate: impl Fn(i32) + 'static,
        style: ElementStyle,
    ) -> &mut Self {
        self.append(Element::Button {
            text: text.to_string(),
            on_activate: Rc::new(on_activate),
            style,
        })
    }

    pub fn add_button_with_confirm(
        &mut self,
        text: &str,
        info_text: &str,
        callback: impl Fn(ConfirmDecision) + 'static,
        style: ElementStyle,
    ) -> &mut Self {
        self.append(Element::ButtonWithConfirm {
            text: text.to_string(),
            info_text: info_text.to_string(),
            callback: Rc::new(callback),
            style,
        })
    }

    pub fn add_player_row(
        &mut self,
        username: &str,
        player_id: u64,
        on_kick: impl Fn(i32) + 'static,
        on_remove: impl Fn(i32) + 'static,
        style: ElementStyle,
    ) -> &mut Self {
        self.append(Element::PlayerRow {
            username: username.to_string(),
            player_id,
            on_kick: Rc::new(on_kick),
            on_remove: Rc::new(on_remove),
            style,
        })
    }

    pub fn add_action_button(
        &mut self,
        text: &str,
        action: MenuAction,
        style: ElementStyle,
    ) -> &mut Self {
        self.append(Element::ActionButton {
            text: text.to_string(),
            action,
            style,
        })
    }

    pub fn add_profile_selector(&mut self) -> &mut Self {
        self.append(Element::ProfileSelector)
    }

    pub fn add_delete_profile_button(&mut self, text: &str, style: ElementStyle) -> &mut Self {
        self.append(Element::DeleteProfileButton {
            text: text.to_string(),
            style,
        })
    }

    /// Button that writes the defaults snapshot back into every preference
    pub fn add_reset_preferences_button(&mut self, text: &str, confirm: bool) -> &mut Self {
        let prefs = Rc::downgrade(&self.prefs);
        let reset = move || {
            let Some(prefs) = prefs.upgrade() else {
                return;
            };
            if let Err(e) = prefs.borrow_mut().reset_to_defaults() {
                log::error!("Failed to reset preferences: {:#}", e);
            }
        };

        let element = if confirm {
            Element::ButtonWithConfirm {
                text: text.to_string(),
                info_text: RESET_CONFIRM_TEXT.to_string(),
                callback: Rc::new(move |decision: ConfirmDecision| {
                    if decision == ConfirmDecision::Accept {
                        reset();
                    }
                }),
                style: ElementStyle::default(),
            }
        } else {
            Element::Button {
                text: text.to_string(),
                on_activate: Rc::new(move |_: i32| reset()),
                style: ElementStyle::default(),
            }
        };
        self.append(element)
    }

    /// Open a submenu; declarations go into it until [`submenu_done`](Self::submenu_done)
    pub fn add_submenu(&mut self, text: &str, key: &str, skip_stack: bool) -> Result<&mut Self> {
        self.builder.add_submenu(text, key, skip_stack)?;
        Ok(self)
    }

    pub fn submenu_done(&mut self) -> Result<&mut Self> {
        self.builder.submenu_done()?;
        Ok(self)
    }

    /// Hide everything up to the matching done while `predicate` is true
    pub fn add_conditional_blocker(
        &mut self,
        predicate: impl Fn() -> bool + 'static,
    ) -> Result<&mut Self> {
        self.builder.add_conditional_blocker(Rc::new(predicate))?;
        Ok(self)
    }

    pub fn conditional_blocker_done(&mut self) -> Result<&mut Self> {
        self.builder.conditional_blocker_done()?;
        Ok(self)
    }

    pub fn add_page_selector(&mut self, max_items_per_page: usize) -> Result<&mut Self> {
        self.builder.add_page_selector(max_items_per_page)?;
        Ok(self)
    }

    pub fn start_paged_item(&mut self) -> Result<&mut Self> {
        self.builder.start_paged_item()?;
        Ok(self)
    }

    pub fn paged_item_done(&mut self) -> Result<&mut Self> {
        self.builder.paged_item_done()?;
        Ok(self)
    }

    /// Seal the tree, load the recorded profile and publish to `host`
    ///
    /// Scopes are published on the first call only. The root is attached once
    /// per menu kind.
    pub fn register_menu(&mut self, host: &mut dyn MenuHost, kind: MenuKind) -> Result<()> {
        self.builder.seal_all();
        {
            let mut prefs = self.prefs.borrow_mut();
            prefs.capture_defaults();
            prefs.switch_to_recorded_profile()?;
        }

        if !self.published {
            for scope in self.builder.compiled() {
                log::info!("Publishing menu scope {} for {}", scope.key, self.mod_guid);
                host.publish(scope);
            }
            self.published = true;
        }
        if self.roots.insert(kind) {
            log::info!("Registering {} root for {:?}", self.mod_name, kind);
            host.register_root(kind, &self.mod_name, self.builder.root());
        }
        Ok(())
    }

    pub fn compiled_scope(&self, id: ScopeId) -> Option<CompiledScope> {
        self.builder.compiled().into_iter().find(|scope| scope.id == id)
    }

    /// Bind a published scope for one player
    pub fn open_session(&self, scope: ScopeId, player_id: u64) -> Result<MenuSession> {
        if !self.published {
            bail!("Menu for {} is not registered", self.mod_guid);
        }
        let Some(compiled) = self.compiled_scope(scope) else {
            bail!("Unknown menu scope {:?} for {}", scope, self.mod_guid);
        };
        Ok(MenuSession::new(
            Rc::clone(&self.prefs),
            self.ctx.clone(),
            compiled,
            player_id,
        ))
    }

    pub fn get<T: PreferenceKind>(&self, key: &str) -> Result<T> {
        self.prefs.borrow().get(key)
    }

    pub fn set<T: PreferenceKind>(&self, key: &str, value: T) -> Result<()> {
        self.prefs.borrow_mut().set(key, value)
    }

    pub fn has<T: PreferenceKind>(&self, key: &str) -> bool {
        self.prefs.borrow().has::<T>(key)
    }

    /// Switch to `profile`, creating it if needed
    pub fn set_profile(&self, profile: &str) -> Result<()> {
        self.prefs.borrow_mut().set_profile(profile)
    }

    pub fn get_data(&self) -> ManagerData {
        self.prefs.borrow().get_data()
    }
}
