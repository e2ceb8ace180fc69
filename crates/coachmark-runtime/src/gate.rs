#![forbid(unsafe_code)]

//! Interaction gate for interactive steps.
//!
//! While an interactive step is resolved, the first primary press inside the
//! anchor is captured before it reaches the page: the host suppresses the
//! default action and stops propagation, then hands the [`GateTicket`] back to
//! the controller. Presses elsewhere pass through untouched.

use coachmark_core::event::PointerEvent;
use coachmark_core::geometry::Rect;

/// Proof that a gate was armed for one specific step activation.
///
/// Only the controller mints tickets. A ticket presented after the step has
/// changed is stale and ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GateTicket {
    step: usize,
    generation: u64,
}

impl GateTicket {
    pub(crate) const fn new(step: usize, generation: u64) -> Self {
        Self { step, generation }
    }

    /// Step index the gate was armed for.
    #[must_use]
    pub const fn step(&self) -> usize {
        self.step
    }

    /// Activation generation the gate was armed for.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }
}

/// Result of offering a pointer event to the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// Not for the gate; deliver normally.
    Pass,
    /// Captured: suppress the default action and advance with the ticket.
    Capture(GateTicket),
}

impl GateDecision {
    #[must_use]
    pub const fn is_capture(&self) -> bool {
        matches!(self, Self::Capture(_))
    }
}

/// An armed gate over the anchor of an interactive step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InteractionGate {
    ticket: GateTicket,
    target: Rect,
}

impl InteractionGate {
    pub(crate) const fn new(ticket: GateTicket, target: Rect) -> Self {
        Self { ticket, target }
    }

    #[must_use]
    pub const fn ticket(&self) -> GateTicket {
        self.ticket
    }

    /// Anchor bounds the gate hit-tests against.
    #[must_use]
    pub const fn target(&self) -> Rect {
        self.target
    }

    /// Offer a pointer event to the gate.
    #[must_use]
    pub fn intercept(&self, event: &PointerEvent) -> GateDecision {
        if event.is_primary_press() && self.target.contains(event.position) {
            GateDecision::Capture(self.ticket)
        } else {
            GateDecision::Pass
        }
    }
}
