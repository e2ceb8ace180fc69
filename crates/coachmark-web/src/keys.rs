#![forbid(unsafe_code)]

//! DOM input normalization.
//!
//! Maps `KeyboardEvent.key` strings, modifier flags, and `MouseEvent.button`
//! numbers onto the canonical event types, and decides which navigation keys
//! a listener should suppress. Pure functions, so they are tested natively
//! without a browser.

use coachmark_core::event::{KeyCode, KeyEvent, KeyEventKind, Modifiers, PointerButton};
use coachmark_runtime::{KeyAction, TourController};

/// Normalize a DOM `key` value.
///
/// Returns `None` for keys the tour has no use for (function keys, media
/// keys, IME composition).
#[must_use]
pub fn dom_key_code(dom_key: &str, mods: Modifiers) -> Option<KeyCode> {
    if dom_key == "Tab" && mods.contains(Modifiers::SHIFT) {
        return Some(KeyCode::BackTab);
    }

    let mut chars = dom_key.chars();
    if let Some(first) = chars.next()
        && chars.next().is_none()
    {
        return Some(KeyCode::Char(first));
    }

    let code = match dom_key {
        "Enter" => KeyCode::Enter,
        "Escape" | "Esc" => KeyCode::Escape,
        "Backspace" => KeyCode::Backspace,
        "Tab" => KeyCode::Tab,
        "Home" => KeyCode::Home,
        "End" => KeyCode::End,
        "ArrowUp" | "Up" => KeyCode::Up,
        "ArrowDown" | "Down" => KeyCode::Down,
        "ArrowLeft" | "Left" => KeyCode::Left,
        "ArrowRight" | "Right" => KeyCode::Right,
        "Spacebar" => KeyCode::Char(' '),
        _ => return None,
    };
    Some(code)
}

/// Build the modifier set from the DOM boolean flags.
#[must_use]
pub fn dom_modifiers(shift: bool, alt: bool, ctrl: bool, meta: bool) -> Modifiers {
    let mut mods = Modifiers::NONE;
    if shift {
        mods |= Modifiers::SHIFT;
    }
    if alt {
        mods |= Modifiers::ALT;
    }
    if ctrl {
        mods |= Modifiers::CTRL;
    }
    if meta {
        mods |= Modifiers::SUPER;
    }
    mods
}

/// Normalize a `keydown` event.
///
/// Shift is dropped for printable characters since the DOM `key` already
/// reflects it.
#[must_use]
pub fn dom_key_event(dom_key: &str, mods: Modifiers, repeat: bool) -> Option<KeyEvent> {
    let code = dom_key_code(dom_key, mods)?;
    let mods = match code {
        KeyCode::Char(_) | KeyCode::BackTab => mods - Modifiers::SHIFT,
        _ => mods,
    };
    let kind = if repeat {
        KeyEventKind::Repeat
    } else {
        KeyEventKind::Press
    };
    Some(KeyEvent::new(code).with_modifiers(mods).with_kind(kind))
}

/// Map `MouseEvent.button`.
#[must_use]
pub const fn dom_pointer_button(button: i16) -> Option<PointerButton> {
    match button {
        0 => Some(PointerButton::Primary),
        1 => Some(PointerButton::Auxiliary),
        2 => Some(PointerButton::Secondary),
        _ => None,
    }
}

/// Navigation keys that will move the tour right now.
///
/// A key listener runs before the tour sees the key, so it reads this
/// snapshot to decide synchronously whether to suppress the key's default
/// action (an Enter that advances the tour must not also submit a form).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NavKeys {
    pub next: bool,
    pub prev: bool,
}

impl NavKeys {
    #[must_use]
    pub fn for_tour(tour: &TourController) -> Self {
        let enabled =
            tour.is_open() && tour.config().keyboard_navigation && !tour.navigation_locked();
        Self {
            next: enabled,
            prev: enabled && tour.step_index().is_some_and(|index| index > 0),
        }
    }

    /// Whether a key bound to `action` should have its default suppressed.
    /// Cancel keys always are.
    #[must_use]
    pub const fn suppresses(self, action: KeyAction) -> bool {
        match action {
            KeyAction::Cancel => true,
            KeyAction::Next => self.next,
            KeyAction::Prev => self.prev,
        }
    }
}
