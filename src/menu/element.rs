use crate::preferences::{PreferenceEnum, PreferenceKind, PreferenceType, PreferenceValue};
use anyhow::{Result, bail};
use std::cell::Cell;
use std::rc::Rc;

/// Identifier of a menu scope, unique across every manager of a context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(pub usize);

/// Shared counter handing out [`ScopeId`]s
///
/// Clones share the counter, so builders created from one context never
/// hand out the same id twice.
#[derive(Debug, Clone, Default)]
pub struct ScopeIds(Rc<Cell<usize>>);

impl ScopeIds {
    pub fn allocate(&self) -> ScopeId {
        let id = self.0.get();
        self.0.set(id + 1);
        ScopeId(id)
    }
}

/// Button layout hints passed through to the host
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElementStyle {
    pub arg: i32,
    pub scale: f32,
    pub padding: f32,
}

impl Default for ElementStyle {
    fn default() -> Self {
        Self {
            arg: 0,
            scale: 1.0,
            padding: 0.2,
        }
    }
}

impl ElementStyle {
    pub fn arg(mut self, arg: i32) -> Self {
        self.arg = arg;
        self
    }

    pub fn scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    pub fn padding(mut self, padding: f32) -> Self {
        self.padding = padding;
        self
    }
}

/// Host menu surfaces a root can be attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MenuKind {
    MainMenu,
    PauseMenu,
}

/// Navigation actions an action button asks the host to perform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MenuAction {
    MainMenuNull,
    MainMenuStartSingleplayer,
    MainMenuQuit,
    MainMenuStartMultiplayer,
    MainMenuBack,
    PauseMenuCloseMenu,
    PauseMenuBack,
    PauseMenuDisconnectPlayer,
    PauseMenuQuit,
    PauseMenuAbandonRestaurant,
    PauseMenuOpenInvitePanel,
    PauseMenuLeaveGame,
    PauseMenuPracticeMode,
}

/// Answer to a confirmation prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmDecision {
    Accept,
    Cancel,
}

pub type ActivateFn = Rc<dyn Fn(i32)>;
pub type SelectFn = Rc<dyn Fn(usize)>;
pub type ConfirmFn = Rc<dyn Fn(ConfirmDecision)>;
pub type ChangedFn = Rc<dyn Fn(&PreferenceValue)>;
pub type PredicateFn = Rc<dyn Fn() -> bool>;

/// A declared option bound to a registered preference
#[derive(Clone)]
pub struct OptionElement {
    pub key: String,
    pub ty: PreferenceType,
    pub values: Vec<PreferenceValue>,
    pub strings: Vec<String>,
    pub on_changed: Option<ChangedFn>,
    pub redraw: bool,
}

impl OptionElement {
    /// Position of `value` among the allowed values
    pub fn index_of(&self, value: &PreferenceValue) -> Option<usize> {
        self.values.iter().position(|v| v == value)
    }
}

/// Declarative menu elements, stored in declaration order
#[derive(Clone)]
pub enum Element {
    Label {
        text: String,
    },
    Info {
        text: String,
    },
    Spacer,
    Select {
        options: Vec<String>,
        on_activate: SelectFn,
        index: usize,
    },
    Button {
        text: String,
        on_activate: ActivateFn,
        style: ElementStyle,
    },
    ButtonWithConfirm {
        text: String,
        info_text: String,
        callback: ConfirmFn,
        style: ElementStyle,
    },
    PlayerRow {
        username: String,
        player_id: u64,
        on_kick: ActivateFn,
        on_remove: ActivateFn,
        style: ElementStyle,
    },
    SubmenuButton {
        text: String,
        scope: ScopeId,
        skip_stack: bool,
    },
    ActionButton {
        text: String,
        action: MenuAction,
        style: ElementStyle,
    },
    /// Current profile picker with a trailing "Create" entry
    ProfileSelector,
    DeleteProfileButton {
        text: String,
        style: ElementStyle,
    },
    BoolOption(OptionElement),
    IntOption(OptionElement),
    FloatOption(OptionElement),
    /// String options, and enum options carrying variant names
    StringOption(OptionElement),
    ConditionalBlocker {
        predicate: PredicateFn,
    },
    ConditionalBlockerDone,
    PageSelector {
        max_items_per_page: usize,
    },
    PagedItem,
    PagedItemDone,
}

impl Element {
    /// Short name for logs and errors
    pub fn name(&self) -> &'static str {
        match self {
            Element::Label { .. } => "Label",
            Element::Info { .. } => "Info",
            Element::Spacer => "Spacer",
            Element::Select { .. } => "Select",
            Element::Button { .. } => "Button",
            Element::ButtonWithConfirm { .. } => "ButtonWithConfirm",
            Element::PlayerRow { .. } => "PlayerRow",
            Element::SubmenuButton { .. } => "SubmenuButton",
            Element::ActionButton { .. } => "ActionButton",
            Element::ProfileSelector => "ProfileSelector",
            Element::DeleteProfileButton { .. } => "DeleteProfileButton",
            Element::BoolOption(_) => "BoolOption",
            Element::IntOption(_) => "IntOption",
            Element::FloatOption(_) => "FloatOption",
            Element::StringOption(_) => "StringOption",
            Element::ConditionalBlocker { .. } => "ConditionalBlocker",
            Element::ConditionalBlockerDone => "ConditionalBlockerDone",
            Element::PageSelector { .. } => "PageSelector",
            Element::PagedItem => "PagedItem",
            Element::PagedItemDone => "PagedItemDone",
        }
    }

    /// Whether the element takes input
    pub fn is_selectable(&self) -> bool {
        !matches!(
            self,
            Element::Label { .. }
                | Element::Info { .. }
                | Element::Spacer
                | Element::ConditionalBlocker { .. }
                | Element::ConditionalBlockerDone
                | Element::PageSelector { .. }
                | Element::PagedItem
                | Element::PagedItemDone
        )
    }

    pub fn option(&self) -> Option<&OptionElement> {
        match self {
            Element::BoolOption(option)
            | Element::IntOption(option)
            | Element::FloatOption(option)
            | Element::StringOption(option) => Some(option),
            _ => None,
        }
    }

    fn from_option(option: OptionElement) -> Self {
        match option.ty {
            PreferenceType::Bool => Element::BoolOption(option),
            PreferenceType::Int => Element::IntOption(option),
            PreferenceType::Float => Element::FloatOption(option),
            _ => Element::StringOption(option),
        }
    }
}

impl std::fmt::Debug for Element {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.option() {
            Some(option) => write!(f, "{}({})", self.name(), option.key),
            None => f.write_str(self.name()),
        }
    }
}

/// Fluent declaration of an option
///
/// ```
/// use preference_system::menu::OptionDecl;
///
/// let decl = OptionDecl::new("volume", 5)
///     .values(vec![0, 5, 10])
///     .strings(vec!["Off".into(), "Half".into(), "Full".into()])
///     .redraw(true);
/// assert_eq!(decl.key(), "volume");
/// ```
pub struct OptionDecl<T: PreferenceKind> {
    key: String,
    initial: T,
    values: Vec<T>,
    strings: Vec<String>,
    on_changed: Option<Rc<dyn Fn(&T)>>,
    redraw: bool,
}

impl<T: PreferenceKind> OptionDecl<T> {
    pub fn new(key: &str, initial: T) -> Self {
        Self {
            key: key.to_string(),
            initial,
            values: Vec::new(),
            strings: Vec::new(),
            on_changed: None,
            redraw: false,
        }
    }

    pub fn values(mut self, values: Vec<T>) -> Self {
        self.values = values;
        self
    }

    /// Display strings, one per value
    pub fn strings(mut self, strings: Vec<String>) -> Self {
        self.strings = strings;
        self
    }

    /// Called with the new value after it was written
    pub fn on_changed(mut self, callback: impl Fn(&T) + 'static) -> Self {
        self.on_changed = Some(Rc::new(callback));
        self
    }

    /// Rebuild the menu after every change
    pub fn redraw(mut self, redraw: bool) -> Self {
        self.redraw = redraw;
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub(crate) fn initial(&self) -> T {
        self.initial.clone()
    }

    pub(crate) fn build(self) -> Result<Element> {
        if self.values.len() != self.strings.len() {
            bail!(
                "Option {} has {} values but {} strings",
                self.key,
                self.values.len(),
                self.strings.len()
            );
        }
        let on_changed = self.on_changed.map(|callback| -> ChangedFn {
            Rc::new(move |value: &PreferenceValue| {
                if let Some(typed) = T::from_value(value) {
                    callback(&typed);
                }
            })
        });
        Ok(Element::from_option(OptionElement {
            key: self.key,
            ty: T::TYPE,
            values: self.values.into_iter().map(T::into_value).collect(),
            strings: self.strings,
            on_changed,
            redraw: self.redraw,
        }))
    }
}

impl<T: PreferenceEnum + PreferenceKind> OptionDecl<T> {
    /// Offer every variant, labelled with its name
    pub fn variants(self) -> Self {
        let values = T::variants().to_vec();
        let strings = values.iter().map(|v| v.name().to_string()).collect();
        self.values(values).strings(strings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    crate::preference_enum! {
        enum Heat { Low, Medium, High }
    }

    #[test]
    fn test_style_defaults() {
        let style = ElementStyle::default();
        assert_eq!(style.arg, 0);
        assert_eq!(style.scale, 1.0);
        assert_eq!(style.padding, 0.2);
        assert_eq!(style.arg(3).arg, 3);
    }

    #[test]
    fn test_scope_ids_are_shared_between_clones() {
        let ids = ScopeIds::default();
        let other = ids.clone();
        assert_eq!(ids.allocate(), ScopeId(0));
        assert_eq!(other.allocate(), ScopeId(1));
        assert_eq!(ids.allocate(), ScopeId(2));
    }

    #[test]
    fn test_option_length_mismatch() {
        let decl = OptionDecl::new("count", 1)
            .values(vec![1, 2])
            .strings(vec!["one".into()]);
        assert!(decl.build().is_err());
    }

    #[test]
    fn test_enum_option_is_string_option() {
        let element = OptionDecl::new("heat", Heat::Medium).variants().build().unwrap();
        let Element::StringOption(option) = &element else {
            panic!("expected StringOption, got {:?}", element);
        };
        assert_eq!(option.ty, PreferenceType::Enum);
        assert_eq!(option.strings, vec!["Low", "Medium", "High"]);
        assert_eq!(option.index_of(&PreferenceValue::Enum("High".into())), Some(2));
    }

    #[test]
    fn test_typed_callback() {
        let seen = Rc::new(Cell::new(0));
        let sink = seen.clone();
        let element = OptionDecl::new("count", 1)
            .values(vec![1, 2])
            .strings(vec!["one".into(), "two".into()])
            .on_changed(move |v| sink.set(*v))
            .build()
            .unwrap();

        let option = element.option().unwrap();
        (option.on_changed.as_ref().unwrap())(&PreferenceValue::Int(2));
        assert_eq!(seen.get(), 2);
        assert!(element.is_selectable());
        assert!(!Element::PagedItem.is_selectable());
    }
}
