//! Type-safe key bindings.
//!
//! A [`Binding`] groups the key presses that trigger an action together with
//! the help text shown for it. Components collect their bindings in a struct
//! implementing [`KeyMap`], which the view layer renders as a short or full
//! help listing.
//!
//! # Examples
//!
//! ```rust
//! use bubbletea_admin::key::{self, Binding};
//! use crossterm::event::{KeyCode, KeyModifiers};
//!
//! let next = Binding::new(vec![KeyCode::Right, KeyCode::Char('l')])
//!     .with_help("→/l", "next page");
//! let quit = Binding::new(vec![(KeyCode::Char('c'), KeyModifiers::CONTROL)])
//!     .with_help("ctrl+c", "quit");
//! assert_eq!(next.help().key, "→/l");
//! ```

use bubbletea_rs::KeyMsg;
use crossterm::event::{KeyCode, KeyModifiers};

/// A single key press: a code plus its modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyPress {
    /// The key code.
    pub code: KeyCode,
    /// Modifier keys held with it.
    pub mods: KeyModifiers,
}

impl From<KeyCode> for KeyPress {
    fn from(code: KeyCode) -> Self {
        Self {
            code,
            mods: KeyModifiers::NONE,
        }
    }
}

impl From<(KeyCode, KeyModifiers)> for KeyPress {
    fn from((code, mods): (KeyCode, KeyModifiers)) -> Self {
        Self { code, mods }
    }
}

/// Help text for a binding: the key label and what it does.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Help {
    /// Short key label, e.g. `"←/h"`.
    pub key: String,
    /// Action description, e.g. `"prev page"`.
    pub desc: String,
}

/// A set of key presses bound to one action.
#[derive(Debug, Clone, Default)]
pub struct Binding {
    keys: Vec<KeyPress>,
    help: Help,
    disabled: bool,
}

impl Binding {
    /// Creates a binding from key codes or `(code, modifiers)` pairs.
    pub fn new<K: Into<KeyPress>>(keys: Vec<K>) -> Self {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
            help: Help::default(),
            disabled: false,
        }
    }

    /// Replaces the bound keys.
    pub fn with_keys<K: Into<KeyPress>>(mut self, keys: Vec<K>) -> Self {
        self.keys = keys.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the help key label and description.
    pub fn with_help(mut self, key: &str, desc: &str) -> Self {
        self.help = Help {
            key: key.to_string(),
            desc: desc.to_string(),
        };
        self
    }

    /// Disables the binding; disabled bindings never match and are hidden
    /// from help.
    pub fn with_disabled(mut self) -> Self {
        self.disabled = true;
        self
    }

    /// Enables or disables the binding.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.disabled = !enabled;
    }

    /// Whether the binding currently participates in matching and help.
    pub fn enabled(&self) -> bool {
        !self.disabled && !self.keys.is_empty()
    }

    /// The help text.
    pub fn help(&self) -> &Help {
        &self.help
    }

    /// The bound key presses.
    pub fn keys(&self) -> &[KeyPress] {
        &self.keys
    }

    /// Whether the given key message triggers this binding.
    pub fn matches(&self, msg: &KeyMsg) -> bool {
        self.enabled() && self.keys.iter().any(|press| press_matches(press, msg))
    }
}

/// Shift is folded into the character for `Char` codes, so it is ignored when
/// comparing modifiers on those.
fn press_matches(press: &KeyPress, msg: &KeyMsg) -> bool {
    if press.code != msg.key {
        return false;
    }
    let mut got = msg.modifiers;
    let mut want = press.mods;
    if matches!(msg.key, KeyCode::Char(_)) {
        got.remove(KeyModifiers::SHIFT);
        want.remove(KeyModifiers::SHIFT);
    }
    got == want
}

/// Whether the message triggers the given binding.
pub fn matches_binding(msg: &KeyMsg, binding: &Binding) -> bool {
    binding.matches(msg)
}

/// Whether the message triggers any of the given bindings.
pub fn matches(msg: &KeyMsg, bindings: &[&Binding]) -> bool {
    bindings.iter().any(|b| b.matches(msg))
}

/// Options for [`new_binding`].
pub enum BindingOpt {
    /// Bound key presses.
    Keys(Vec<KeyPress>),
    /// Help key label and description.
    Help(Help),
    /// Start disabled.
    Disabled,
}

/// Option constructor: the bound keys.
pub fn with_keys<K: Into<KeyPress>>(keys: Vec<K>) -> BindingOpt {
    BindingOpt::Keys(keys.into_iter().map(Into::into).collect())
}

/// Option constructor: help key label and description.
pub fn with_help(key: &str, desc: &str) -> BindingOpt {
    BindingOpt::Help(Help {
        key: key.to_string(),
        desc: desc.to_string(),
    })
}

/// Option constructor: start disabled.
pub fn with_disabled() -> BindingOpt {
    BindingOpt::Disabled
}

/// Creates a binding from a list of options.
///
/// ```rust
/// use bubbletea_admin::key::{new_binding, with_help, with_keys};
/// use crossterm::event::KeyCode;
///
/// let refresh = new_binding(vec![
///     with_keys(vec![KeyCode::Char('r')]),
///     with_help("r", "refresh"),
/// ]);
/// assert!(refresh.enabled());
/// ```
pub fn new_binding(opts: Vec<BindingOpt>) -> Binding {
    let mut binding = Binding::default();
    for opt in opts {
        match opt {
            BindingOpt::Keys(keys) => binding.keys = keys,
            BindingOpt::Help(help) => binding.help = help,
            BindingOpt::Disabled => binding.disabled = true,
        }
    }
    binding
}

/// A component's key bindings, for help rendering.
pub trait KeyMap {
    /// Bindings shown in the one-line help.
    fn short_help(&self) -> Vec<&Binding>;
    /// Binding columns shown in the expanded help.
    fn full_help(&self) -> Vec<Vec<&Binding>>;
}
