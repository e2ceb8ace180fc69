#![forbid(unsafe_code)]

//! Web: browser host for Coachmark tours.
//!
//! # Role in Coachmark
//! `coachmark-web` connects the tour runtime to a live document. On
//! `wasm32` it provides:
//! - `DomResolver`: `querySelector`, `scrollIntoView` (centred), then
//!   `getBoundingClientRect`
//! - `DomListenerHost`: document key, window resize, and capturing target
//!   click listeners that detach when their guard drops
//! - `WebTour`: timer-driven pump that runs settle tickets via `setTimeout`
//!   and hands a `TourView` to the host's renderer; its methods are safe to
//!   call from the renderer and from tour hooks
//!
//! The DOM input normalization in [`keys`] is target-independent and tested
//! natively.

pub mod keys;

#[cfg(target_arch = "wasm32")]
pub mod dom;

#[cfg(target_arch = "wasm32")]
pub use dom::{DomListener, DomListenerHost, DomResolver, DomSignal, WebTour, viewport_size};
pub use keys::{NavKeys, dom_key_code, dom_key_event, dom_modifiers, dom_pointer_button};
