//! Live binding of a compiled scope for one player

use super::element::{ConfirmDecision, ConfirmFn, Element, MenuAction, OptionElement, ScopeId};
use super::host::CompiledScope;
use super::resolve::{Resolution, resolve};
use crate::context::PreferenceContext;
use crate::preferences::{ModPreferences, PreferenceValue};
use anyhow::{Result, bail};
use std::cell::RefCell;
use std::rc::Rc;

/// Trailing profile selector entry that asks for a new profile name
pub const CREATE_PROFILE: &str = "Create";

/// Live state attached to a rendered element
#[derive(Debug, Clone, PartialEq)]
pub enum Binding {
    None,
    Option {
        value: PreferenceValue,
        /// Index of `value` among the option's values, if it is one of them
        selected: Option<usize>,
    },
    Page {
        current: usize,
        count: usize,
    },
    Profiles {
        options: Vec<String>,
        selected: usize,
    },
}

/// One element the host should show, in order
#[derive(Debug, Clone)]
pub struct RenderedElement {
    /// Index into the scope's element list
    pub index: usize,
    pub element: Element,
    pub binding: Binding,
}

/// Input the host forwards for an element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    Press,
    Choose(usize),
    Kick,
    Remove,
}

/// Pending confirmation the host must show before acting
pub struct ConfirmRequest {
    info_text: String,
    action: Box<dyn FnOnce(ConfirmDecision) -> Result<()>>,
}

impl ConfirmRequest {
    fn callback(info_text: &str, callback: ConfirmFn) -> Self {
        Self {
            info_text: info_text.to_string(),
            action: Box::new(move |decision| {
                callback(decision);
                Ok(())
            }),
        }
    }

    pub fn info_text(&self) -> &str {
        &self.info_text
    }

    /// Deliver the user's answer
    pub fn complete(self, decision: ConfirmDecision) -> Result<()> {
        (self.action)(decision)
    }
}

impl std::fmt::Debug for ConfirmRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfirmRequest")
            .field("info_text", &self.info_text)
            .finish_non_exhaustive()
    }
}

/// What the host should do after an activation
#[derive(Debug)]
pub enum SessionResponse {
    None,
    Redraw,
    OpenSubmenu { scope: ScopeId, skip_stack: bool },
    Confirm(ConfirmRequest),
    Action(MenuAction),
    /// Show a text prompt, then call [`MenuSession::create_profile`]
    RequestProfileName,
}

/// A scope opened for one player
///
/// Every render and activation walks the element list again, so blocker
/// predicates always see current state.
pub struct MenuSession {
    prefs: Rc<RefCell<ModPreferences>>,
    ctx: PreferenceContext,
    scope: CompiledScope,
    player_id: u64,
    current_page: usize,
}

impl MenuSession {
    pub(crate) fn new(
        prefs: Rc<RefCell<ModPreferences>>,
        ctx: PreferenceContext,
        scope: CompiledScope,
        player_id: u64,
    ) -> Self {
        Self {
            prefs,
            ctx,
            scope,
            player_id,
            current_page: 1,
        }
    }

    pub fn scope(&self) -> &CompiledScope {
        &self.scope
    }

    pub fn player_id(&self) -> u64 {
        self.player_id
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    fn resolution(&mut self) -> Resolution {
        let resolution = resolve(&self.scope.elements, self.current_page);
        self.current_page = resolution.current_page;
        resolution
    }

    /// Profile list for the selector and the entry that should be shown as current
    fn profile_choices(&self) -> Result<(Vec<String>, String)> {
        let guid = self.prefs.borrow().mod_guid().to_string();
        let profiles = self.ctx.profiles()?;
        let mut options = profiles.get_profiles(&guid);
        let mut current = profiles.get_profile(&guid);
        match options.first() {
            Some(first) if !options.contains(&current) => current = first.clone(),
            Some(_) => {}
            None => current = String::new(),
        }
        options.push(CREATE_PROFILE.to_string());
        Ok((options, current))
    }

    /// Visible elements with their live values
    pub fn render(&mut self) -> Result<Vec<RenderedElement>> {
        let resolution = self.resolution();
        let elements = Rc::clone(&self.scope.elements);
        let mut rendered = Vec::with_capacity(resolution.visible.len());

        for index in resolution.visible {
            let element = &elements[index];
            let binding = match element {
                Element::BoolOption(option)
                | Element::IntOption(option)
                | Element::FloatOption(option)
                | Element::StringOption(option) => {
                    let prefs = self.prefs.borrow();
                    let Some(value) = prefs.value(&option.key).cloned() else {
                        bail!("Option {} is not registered", option.key);
                    };
                    Binding::Option {
                        selected: option.index_of(&value),
                        value,
                    }
                }
                Element::PageSelector { .. } => Binding::Page {
                    current: resolution.current_page,
                    count: resolution.page_count,
                },
                Element::ProfileSelector => {
                    let (options, current) = self.profile_choices()?;
                    if self.prefs.borrow().profile() != current {
                        let mut prefs = self.prefs.borrow_mut();
                        prefs.switch_profile_unrecorded(&current)?;
                    }
                    let selected = options.iter().position(|p| *p == current).unwrap_or(0);
                    Binding::Profiles { options, selected }
                }
                _ => Binding::None,
            };
            rendered.push(RenderedElement {
                index,
                element: element.clone(),
                binding,
            });
        }
        Ok(rendered)
    }

    /// Handle input on the element at `index`
    pub fn activate(&mut self, index: usize, activation: Activation) -> Result<SessionResponse> {
        let resolution = self.resolution();
        if !resolution.visible.contains(&index) {
            bail!("Element {} is not visible", index);
        }
        let elements = Rc::clone(&self.scope.elements);
        let element = &elements[index];
        if let (Some(option), Activation::Choose(i)) = (element.option(), activation) {
            return self.choose_option(option, i);
        }

        let response = match (element, activation) {
            (Element::Select { on_activate, .. }, Activation::Choose(i)) => {
                on_activate(i);
                SessionResponse::None
            }
            (Element::Button { on_activate, style, .. }, Activation::Press) => {
                on_activate(style.arg);
                SessionResponse::None
            }
            (
                Element::ButtonWithConfirm {
                    info_text, callback, ..
                },
                Activation::Press,
            ) => SessionResponse::Confirm(ConfirmRequest::callback(info_text, Rc::clone(callback))),
            (Element::PlayerRow { on_kick, style, .. }, Activation::Kick) => {
                on_kick(style.arg);
                SessionResponse::None
            }
            (Element::PlayerRow { on_remove, style, .. }, Activation::Remove) => {
                on_remove(style.arg);
                SessionResponse::None
            }
            (Element::SubmenuButton { scope, skip_stack, .. }, Activation::Press) => {
                SessionResponse::OpenSubmenu {
                    scope: *scope,
                    skip_stack: *skip_stack,
                }
            }
            (Element::ActionButton { action, .. }, Activation::Press) => {
                SessionResponse::Action(*action)
            }
            (Element::PageSelector { .. }, Activation::Choose(i)) => {
                let page = i + 1;
                if page > resolution.page_count {
                    bail!("Page {} out of range", page);
                }
                self.current_page = page;
                SessionResponse::Redraw
            }
            (Element::ProfileSelector, Activation::Choose(i)) => self.choose_profile(i)?,
            (Element::DeleteProfileButton { .. }, Activation::Press) => self.request_delete_profile()?,
            (element, activation) => {
                bail!("{} cannot handle {:?}", element.name(), activation)
            }
        };
        Ok(response)
    }

    fn choose_option(&mut self, option: &OptionElement, i: usize) -> Result<SessionResponse> {
        let Some(value) = option.values.get(i).cloned() else {
            bail!("Option {} has no value at {}", option.key, i);
        };
        self.prefs.borrow_mut().set_value(&option.key, value.clone())?;
        if let Some(callback) = &option.on_changed {
            callback(&value);
        }
        Ok(if option.redraw {
            SessionResponse::Redraw
        } else {
            SessionResponse::None
        })
    }

    fn choose_profile(&mut self, i: usize) -> Result<SessionResponse> {
        let (options, _) = self.profile_choices()?;
        let Some(choice) = options.get(i) else {
            bail!("Profile selector has no entry at {}", i);
        };
        if i == options.len() - 1 {
            return Ok(SessionResponse::RequestProfileName);
        }
        self.prefs.borrow_mut().set_profile(choice)?;
        Ok(SessionResponse::Redraw)
    }

    /// Create a profile from the name the host prompted for, and switch to it
    pub fn create_profile(&mut self, name: &str) -> Result<SessionResponse> {
        if name.is_empty() || name == CREATE_PROFILE {
            log::warn!("Ignoring profile name '{}'", name);
            return Ok(SessionResponse::None);
        }
        self.prefs.borrow_mut().set_profile(name)?;
        Ok(SessionResponse::Redraw)
    }

    fn request_delete_profile(&self) -> Result<SessionResponse> {
        let guid = self.prefs.borrow().mod_guid().to_string();
        let current = self.ctx.profiles()?.get_profile(&guid);
        if current.is_empty() {
            return Ok(SessionResponse::None);
        }

        let prefs = Rc::clone(&self.prefs);
        let ctx = self.ctx.clone();
        let info_text = format!("Delete preference profile, {}?", current);
        Ok(SessionResponse::Confirm(ConfirmRequest {
            info_text,
            action: Box::new(move |decision| {
                if decision != ConfirmDecision::Accept {
                    return Ok(());
                }
                delete_profile(&ctx, &prefs, &guid, &current)
            }),
        }))
    }
}

/// Remove `profile` and fall back to its neighbour, or the default profile
fn delete_profile(
    ctx: &PreferenceContext,
    prefs: &Rc<RefCell<ModPreferences>>,
    guid: &str,
    profile: &str,
) -> Result<()> {
    let fallback = {
        let mut profiles = ctx.profiles()?;
        let list = profiles.get_profiles(guid);
        let Some(index) = list.iter().position(|p| p == profile) else {
            log::error!("Failed to find profile {} for {}", profile, guid);
            return Ok(());
        };
        profiles.remove_profile(guid, profile)?;
        let fallback = if list.len() > 1 {
            let neighbour = if index > 0 { index - 1 } else { index + 1 };
            list[neighbour].clone()
        } else {
            String::new()
        };
        profiles.set_profile(guid, &fallback)?;
        fallback
    };
    log::info!("Deleted profile {} for {}, now on '{}'", profile, guid, fallback);

    let mut prefs = prefs.borrow_mut();
    prefs.switch_profile_unrecorded(&fallback)?;
    prefs.save()
}
