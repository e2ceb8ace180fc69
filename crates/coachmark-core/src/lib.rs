#![forbid(unsafe_code)]

//! Core: geometry, input events, and host clocks.
//!
//! # Role in Coachmark
//! `coachmark-core` is the vocabulary layer. It defines the viewport-space
//! [`Rect`](geometry::Rect) every other crate measures with, the normalized
//! [`Event`](event::Event) type hosts translate their input into, and the
//! [`Clock`](clock::Clock) abstraction that keeps the tour runtime free of
//! ambient time.
//!
//! # How it fits in the system
//! The placement solver (`coachmark-layout`) consumes geometry only. The tour
//! runtime (`coachmark-runtime`) consumes geometry, events, and clocks, and
//! hosts (`coachmark-web`, `coachmark-cli`) produce them.

pub mod clock;
pub mod event;
pub mod geometry;
pub mod logging;

pub use clock::{Clock, DeterministicClock, SystemClock};
pub use event::{
    Event, KeyCode, KeyEvent, KeyEventKind, Modifiers, PointerButton, PointerEvent,
    PointerEventKind,
};
pub use geometry::{Point, Rect, Size};
