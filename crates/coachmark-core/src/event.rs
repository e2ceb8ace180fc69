#![forbid(unsafe_code)]

//! Canonical input/event types.
//!
//! Hosts translate their native input (DOM events, terminal input, test
//! scripts) into these values before handing them to the tour runtime.
//!
//! # Design Notes
//!
//! - Pointer coordinates are viewport pixels, same space as [`Rect`](crate::geometry::Rect)
//! - `KeyEventKind` defaults to `Press` when the host cannot distinguish
//! - `Modifiers` use bitflags for easy combination

use bitflags::bitflags;

use crate::geometry::{Point, Size};

/// Canonical input event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Event {
    /// A keyboard event.
    Key(KeyEvent),

    /// A pointer (mouse, pen, touch) event.
    Pointer(PointerEvent),

    /// The viewport was resized.
    Resize(Size),
}

/// A keyboard event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    /// The key code that was pressed.
    pub code: KeyCode,

    /// Modifier keys held during the event.
    pub modifiers: Modifiers,

    /// The type of key event (press, repeat, or release).
    pub kind: KeyEventKind,
}

impl KeyEvent {
    /// Create a new key event with default modifiers and Press kind.
    #[must_use]
    pub const fn new(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: Modifiers::NONE,
            kind: KeyEventKind::Press,
        }
    }

    /// Create a key event with modifiers.
    #[must_use]
    pub const fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Create a key event with a specific kind.
    #[must_use]
    pub const fn with_kind(mut self, kind: KeyEventKind) -> Self {
        self.kind = kind;
        self
    }

    /// Whether this is a press (or auto-repeat) rather than a release.
    #[must_use]
    pub const fn is_press(&self) -> bool {
        matches!(self.kind, KeyEventKind::Press | KeyEventKind::Repeat)
    }
}

/// Key codes for keyboard events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum KeyCode {
    /// A regular character key.
    Char(char),

    /// Enter/Return key.
    Enter,

    /// Escape key.
    Escape,

    /// Backspace key.
    Backspace,

    /// Tab key.
    Tab,

    /// Shift+Tab (back-tab).
    BackTab,

    /// Home key.
    Home,

    /// End key.
    End,

    /// Up arrow key.
    Up,

    /// Down arrow key.
    Down,

    /// Left arrow key.
    Left,

    /// Right arrow key.
    Right,
}

/// The type of key event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum KeyEventKind {
    /// Key was pressed (default when not distinguishable).
    #[default]
    Press,

    /// Key is being held (repeat event).
    Repeat,

    /// Key was released.
    Release,
}

bitflags! {
    /// Modifier keys that can be held during an input event.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Modifiers: u8 {
        /// No modifiers.
        const NONE  = 0b0000;
        /// Shift key.
        const SHIFT = 0b0001;
        /// Alt/Option key.
        const ALT   = 0b0010;
        /// Control key.
        const CTRL  = 0b0100;
        /// Super/Meta/Command key.
        const SUPER = 0b1000;
    }
}

impl Default for Modifiers {
    fn default() -> Self {
        Self::NONE
    }
}

/// A pointer event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    /// The type of pointer event.
    pub kind: PointerEventKind,

    /// Position in viewport pixels.
    pub position: Point,

    /// Modifier keys held during the event.
    pub modifiers: Modifiers,
}

impl PointerEvent {
    /// Create a new pointer event.
    #[must_use]
    pub const fn new(kind: PointerEventKind, position: Point) -> Self {
        Self {
            kind,
            position,
            modifiers: Modifiers::NONE,
        }
    }

    /// Create a pointer event with modifiers.
    #[must_use]
    pub const fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Primary-button press: the "activate" gesture (click, tap).
    #[must_use]
    pub const fn is_primary_press(&self) -> bool {
        matches!(self.kind, PointerEventKind::Down(PointerButton::Primary))
    }
}

/// The type of pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerEventKind {
    /// Button pressed down.
    Down(PointerButton),

    /// Button released.
    Up(PointerButton),

    /// Pointer moved.
    Moved,
}

/// Pointer button identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerButton {
    /// Primary button (left mouse button, touch contact).
    Primary,

    /// Secondary button (right mouse button).
    Secondary,

    /// Auxiliary button (middle mouse button).
    Auxiliary,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_event_defaults_to_press() {
        let key = KeyEvent::new(KeyCode::Escape);
        assert_eq!(key.kind, KeyEventKind::Press);
        assert_eq!(key.modifiers, Modifiers::NONE);
        assert!(key.is_press());
        assert!(!key.with_kind(KeyEventKind::Release).is_press());
    }

    #[test]
    fn repeat_counts_as_press() {
        let key = KeyEvent::new(KeyCode::Right).with_kind(KeyEventKind::Repeat);
        assert!(key.is_press());
    }

    #[test]
    fn only_primary_down_is_primary_press() {
        let at = Point::new(1.0, 2.0);
        assert!(PointerEvent::new(PointerEventKind::Down(PointerButton::Primary), at).is_primary_press());
        assert!(!PointerEvent::new(PointerEventKind::Up(PointerButton::Primary), at).is_primary_press());
        assert!(
            !PointerEvent::new(PointerEventKind::Down(PointerButton::Secondary), at)
                .is_primary_press()
        );
        assert!(!PointerEvent::new(PointerEventKind::Moved, at).is_primary_press());
    }

    #[test]
    fn modifiers_combine() {
        let mods = Modifiers::CTRL | Modifiers::SHIFT;
        assert!(mods.contains(Modifiers::CTRL));
        assert!(!mods.contains(Modifiers::ALT));
        assert_eq!(Modifiers::default(), Modifiers::NONE);
    }
}
