#![forbid(unsafe_code)]

//! Tour lifecycle controller.
//!
//! [`TourController`] owns the step sequence and the state machine
//! `Closed -> Showing(i) -> Completed | Cancelled`. It is host-driven: the host
//! feeds it time ([`poll`](TourController::poll)), input
//! ([`handle_event`](TourController::handle_event)), and geometry (through a
//! [`GeometryResolver`]), and reads back a [`TourView`] to draw.
//!
//! # Settle tickets
//!
//! Activating an anchored step does not measure the target immediately. It
//! issues a [`SettleTicket`] due after the settle delay, giving the host time
//! to scroll the target into view. Every activation bumps a generation
//! counter; a ticket (or [`GateTicket`]) minted for an older generation is
//! rejected, so a late timer can never apply geometry to the wrong step.
//!
//! # Unresolved targets
//!
//! A target is looked up exactly once per activation. If it is missing the
//! step is skipped (or shown centred when `skip_unresolved` is off) and one
//! warning is logged. An unresolvable last step completes the tour.

use std::time::Duration;

use coachmark_core::event::Event;
use coachmark_core::geometry::{Rect, Size};
use coachmark_layout::placement::{self, Placement};
use tracing::{debug, info, warn};

use crate::binding::Binding;
use crate::config::{KeyAction, TourConfig};
use crate::error::TourError;
use crate::gate::{GateDecision, GateTicket, InteractionGate};
use crate::resolver::GeometryResolver;
use crate::step::Step;
use crate::view::{TourView, progress_window};

/// Tooltip size assumed until the host reports a measured one.
pub const DEFAULT_TOOLTIP_SIZE: Size = Size {
    width: 320.0,
    height: 160.0,
};
/// Viewport assumed until the host reports one.
pub const DEFAULT_VIEWPORT: Size = Size {
    width: 1280.0,
    height: 800.0,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TourPhase {
    #[default]
    Closed,
    Showing(usize),
    Completed,
    Cancelled,
}

impl TourPhase {
    #[must_use]
    pub const fn is_showing(&self) -> bool {
        matches!(self, Self::Showing(_))
    }

    #[must_use]
    pub const fn step_index(&self) -> Option<usize> {
        match self {
            Self::Showing(index) => Some(*index),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Closed => "closed",
            Self::Showing(_) => "showing",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TourAdvanceReason {
    ManualNext,
    ManualPrev,
    Jump,
    /// The user acted on an interactive step's target.
    Interaction,
    /// The step's target could not be found.
    Skipped,
}

impl TourAdvanceReason {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ManualNext => "next",
            Self::ManualPrev => "prev",
            Self::Jump => "jump",
            Self::Interaction => "interaction",
            Self::Skipped => "skipped",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TourEvent {
    Opened {
        steps: usize,
    },
    StepChanged {
        from: usize,
        to: usize,
        reason: TourAdvanceReason,
    },
    Completed {
        last: usize,
        reason: TourAdvanceReason,
    },
    Cancelled {
        at: usize,
    },
    /// Closed externally; no completion or cancellation callback fires.
    Dismissed {
        at: usize,
    },
}

/// Where the current step's anchor stands.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum AnchorState {
    /// Waiting for the settle ticket.
    #[default]
    Pending,
    /// The step has no target and is shown centred.
    Unanchored,
    /// Last measured bounds of the target.
    Resolved(Rect),
    /// Lookup failed and skipping is disabled; shown centred.
    Missing,
}

impl AnchorState {
    #[must_use]
    pub const fn rect(&self) -> Option<Rect> {
        match self {
            Self::Resolved(rect) => Some(*rect),
            _ => None,
        }
    }
}

/// A deferred geometry lookup for one step activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SettleTicket {
    step: usize,
    generation: u64,
    due: Duration,
}

impl SettleTicket {
    #[must_use]
    pub const fn step(&self) -> usize {
        self.step
    }

    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Host time at which the lookup should run.
    #[must_use]
    pub const fn due(&self) -> Duration {
        self.due
    }
}

/// Result of running a settle ticket.
#[derive(Debug)]
pub enum SettleOutcome {
    Resolved(Rect),
    /// Target missing; the tour moved on (or completed).
    Skipped { error: TourError, event: TourEvent },
    /// Target missing and skipping is disabled; the step stays, centred.
    Unresolved(TourError),
}

/// Outcome of [`TourController::handle_event`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Dispatch {
    /// The host should suppress the event's default action and stop its
    /// propagation.
    pub consumed: bool,
    pub event: Option<TourEvent>,
}

impl Dispatch {
    const fn ignored() -> Self {
        Self {
            consumed: false,
            event: None,
        }
    }

    const fn consumed(event: Option<TourEvent>) -> Self {
        Self {
            consumed: true,
            event,
        }
    }
}

type Callback = Box<dyn FnMut()>;
type EventCallback = Box<dyn FnMut(&TourEvent)>;

/// Host callbacks.
#[derive(Default)]
pub struct TourHooks {
    on_complete: Option<Callback>,
    on_cancel: Option<Callback>,
    on_event: Option<EventCallback>,
}

impl TourHooks {
    /// Fired once when the user finishes the last step.
    #[must_use]
    pub fn on_complete(mut self, f: impl FnMut() + 'static) -> Self {
        self.on_complete = Some(Box::new(f));
        self
    }

    /// Fired once when the user cancels.
    #[must_use]
    pub fn on_cancel(mut self, f: impl FnMut() + 'static) -> Self {
        self.on_cancel = Some(Box::new(f));
        self
    }

    /// Observer for every emitted [`TourEvent`].
    #[must_use]
    pub fn on_event(mut self, f: impl FnMut(&TourEvent) + 'static) -> Self {
        self.on_event = Some(Box::new(f));
        self
    }

    /// Run the callbacks for `event`: completion or cancellation first, then
    /// the event observer.
    ///
    /// The controller calls this for every event it emits. Hosts that defer
    /// callbacks until their own state is released call it themselves.
    pub fn notify(&mut self, event: &TourEvent) {
        match event {
            TourEvent::Completed { .. } => {
                if let Some(on_complete) = self.on_complete.as_mut() {
                    on_complete();
                }
            }
            TourEvent::Cancelled { .. } => {
                if let Some(on_cancel) = self.on_cancel.as_mut() {
                    on_cancel();
                }
            }
            _ => {}
        }
        if let Some(on_event) = self.on_event.as_mut() {
            on_event(event);
        }
    }
}

impl std::fmt::Debug for TourHooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TourHooks")
            .field("on_complete", &self.on_complete.is_some())
            .field("on_cancel", &self.on_cancel.is_some())
            .field("on_event", &self.on_event.is_some())
            .finish()
    }
}

#[derive(Debug)]
pub struct TourController {
    config: TourConfig,
    hooks: TourHooks,
    steps: Vec<Step>,
    phase: TourPhase,
    anchor: AnchorState,
    generation: u64,
    pending: Option<SettleTicket>,
    now: Duration,
    viewport: Size,
    tooltip: Size,
}

impl Default for TourController {
    fn default() -> Self {
        Self::new(TourConfig::default())
    }
}

impl TourController {
    pub fn new(config: TourConfig) -> Self {
        Self {
            config,
            hooks: TourHooks::default(),
            steps: Vec::new(),
            phase: TourPhase::Closed,
            anchor: AnchorState::Pending,
            generation: 0,
            pending: None,
            now: Duration::ZERO,
            viewport: DEFAULT_VIEWPORT,
            tooltip: DEFAULT_TOOLTIP_SIZE,
        }
    }

    #[must_use]
    pub fn with_hooks(mut self, hooks: TourHooks) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn config(&self) -> &TourConfig {
        &self.config
    }

    pub fn phase(&self) -> TourPhase {
        self.phase
    }

    pub fn is_open(&self) -> bool {
        self.phase.is_showing()
    }

    pub fn step_index(&self) -> Option<usize> {
        self.phase.step_index()
    }

    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    pub fn current_step(&self) -> Option<&Step> {
        self.steps.get(self.phase.step_index()?)
    }

    pub fn anchor(&self) -> AnchorState {
        self.anchor
    }

    /// Last measured bounds of the current target.
    pub fn last_anchor(&self) -> Option<Rect> {
        self.anchor.rect()
    }

    /// Activation counter; bumps on every step change and on close.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn viewport(&self) -> Size {
        self.viewport
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    // --- Lifecycle ---

    /// Open the tour at its first step.
    pub fn open(&mut self, steps: Vec<Step>) -> Result<TourEvent, TourError> {
        if let TourPhase::Showing(step) = self.phase {
            debug!(step, "Tour already open; ignoring open");
            return Err(TourError::AlreadyOpen { step });
        }
        if steps.is_empty() {
            debug!("Tour has no steps; nothing to show");
            return Err(TourError::EmptyTour);
        }
        self.steps = steps;
        info!(steps = self.steps.len(), "Tour opened");
        self.activate(0);
        let event = TourEvent::Opened {
            steps: self.steps.len(),
        };
        Ok(self.emit(event))
    }

    /// Follow an externally owned open flag.
    ///
    /// Opens (building the steps lazily) when `open` is set and the tour is
    /// not showing; dismisses without callbacks when it is cleared.
    pub fn sync_open(&mut self, open: bool, steps: impl FnOnce() -> Vec<Step>) -> Option<TourEvent> {
        match (open, self.is_open()) {
            (true, false) => self.open(steps()).ok(),
            (false, true) => self.dismiss(),
            _ => None,
        }
    }

    /// Go to the next step, or complete the tour from the last one.
    pub fn advance(&mut self) -> Option<TourEvent> {
        let index = self.phase.step_index()?;
        if self.navigation_locked() {
            debug!(step = index, "Navigation locked by interactive step");
            return None;
        }
        Some(self.step_forward(index, TourAdvanceReason::ManualNext))
    }

    /// Go to the previous step. No-op on the first step.
    pub fn retreat(&mut self) -> Option<TourEvent> {
        let index = self.phase.step_index()?;
        if index == 0 {
            return None;
        }
        if self.navigation_locked() {
            debug!(step = index, "Navigation locked by interactive step");
            return None;
        }
        self.activate(index - 1);
        Some(self.emit(TourEvent::StepChanged {
            from: index,
            to: index - 1,
            reason: TourAdvanceReason::ManualPrev,
        }))
    }

    /// Jump to `index` (clamped to the last step).
    pub fn jump_to(&mut self, index: usize) -> Option<TourEvent> {
        let from = self.phase.step_index()?;
        let to = index.min(self.steps.len().saturating_sub(1));
        if to == from || self.navigation_locked() {
            return None;
        }
        self.activate(to);
        Some(self.emit(TourEvent::StepChanged {
            from,
            to,
            reason: TourAdvanceReason::Jump,
        }))
    }

    /// Advance after the user acted on an interactive target.
    pub fn interactive_advance(&mut self, ticket: GateTicket) -> Result<TourEvent, TourError> {
        match self.gate() {
            Some(gate) if gate.ticket() == ticket => {}
            _ => {
                debug!(
                    step = ticket.step(),
                    generation = ticket.generation(),
                    "Discarding stale interaction"
                );
                return Err(TourError::StaleCallback {
                    step: ticket.step(),
                    generation: ticket.generation(),
                });
            }
        }
        Ok(self.step_forward(ticket.step(), TourAdvanceReason::Interaction))
    }

    /// User-initiated close. Fires the cancel callback.
    pub fn request_close(&mut self) -> Option<TourEvent> {
        let at = self.phase.step_index()?;
        self.phase = TourPhase::Cancelled;
        self.reset();
        info!(step = at, "Tour cancelled");
        Some(self.emit(TourEvent::Cancelled { at }))
    }

    /// Host-initiated close. No completion or cancellation callback fires.
    pub fn dismiss(&mut self) -> Option<TourEvent> {
        let at = self.phase.step_index()?;
        self.phase = TourPhase::Closed;
        self.reset();
        debug!(step = at, "Tour dismissed");
        Some(self.emit(TourEvent::Dismissed { at }))
    }

    // --- Time and geometry ---

    /// Advance host time. Time never moves backwards.
    pub fn set_now(&mut self, now: Duration) {
        self.now = self.now.max(now);
    }

    /// The outstanding settle ticket, if any.
    pub fn pending_settle(&self) -> Option<SettleTicket> {
        self.pending
    }

    /// When the host should next call [`poll`](Self::poll).
    pub fn next_deadline(&self) -> Option<Duration> {
        self.pending.map(|t| t.due)
    }

    /// Advance time and run the pending settle ticket if it is due.
    pub fn poll(&mut self, now: Duration, resolver: &mut dyn GeometryResolver) -> Option<SettleOutcome> {
        self.set_now(now);
        let ticket = self.pending?;
        if ticket.due > self.now {
            return None;
        }
        Some(self.run_settle(ticket, resolver))
    }

    /// Run a settle ticket delivered by a host timer.
    ///
    /// Tickets from an earlier activation (or already run) are rejected with
    /// [`TourError::StaleCallback`] and change nothing.
    pub fn settle(
        &mut self,
        ticket: SettleTicket,
        resolver: &mut dyn GeometryResolver,
    ) -> Result<SettleOutcome, TourError> {
        if self.pending != Some(ticket) {
            debug!(
                step = ticket.step,
                generation = ticket.generation,
                current = self.generation,
                "Discarding stale settle"
            );
            return Err(TourError::StaleCallback {
                step: ticket.step,
                generation: ticket.generation,
            });
        }
        Ok(self.run_settle(ticket, resolver))
    }

    /// Re-measure a resolved target (after a resize or scroll).
    ///
    /// Keeps the previous bounds if the target has gone missing meanwhile.
    pub fn refresh_anchor(&mut self, resolver: &mut dyn GeometryResolver) -> Option<Rect> {
        let AnchorState::Resolved(previous) = self.anchor else {
            return None;
        };
        let selector = self.current_step()?.target.clone();
        match resolver.resolve(&selector) {
            Some(rect) => {
                self.anchor = AnchorState::Resolved(rect);
                Some(rect)
            }
            None => {
                debug!(selector = %selector, "Target vanished; keeping last bounds");
                Some(previous)
            }
        }
    }

    pub fn set_viewport(&mut self, viewport: Size) {
        self.viewport = viewport;
    }

    /// Report the rendered tooltip size so placement can use it.
    pub fn set_tooltip_size(&mut self, size: Size) {
        self.tooltip = size;
    }

    // --- Input ---

    /// Route one input event.
    pub fn handle_event(&mut self, event: &Event) -> Dispatch {
        if !self.is_open() {
            return Dispatch::ignored();
        }
        match event {
            Event::Key(key) => match self.config.keys.action_for(key) {
                Some(KeyAction::Cancel) => Dispatch::consumed(self.request_close()),
                Some(KeyAction::Next) if self.config.keyboard_navigation => {
                    let event = self.advance();
                    Dispatch {
                        consumed: event.is_some(),
                        event,
                    }
                }
                Some(KeyAction::Prev) if self.config.keyboard_navigation => {
                    let event = self.retreat();
                    Dispatch {
                        consumed: event.is_some(),
                        event,
                    }
                }
                _ => Dispatch::ignored(),
            },
            Event::Pointer(pointer) => match self.gate().map(|gate| gate.intercept(pointer)) {
                Some(GateDecision::Capture(ticket)) => {
                    Dispatch::consumed(self.interactive_advance(ticket).ok())
                }
                _ => Dispatch::ignored(),
            },
            Event::Resize(size) => {
                self.set_viewport(*size);
                Dispatch::ignored()
            }
        }
    }

    /// The armed interaction gate, if the current step is interactive and
    /// its target has been measured.
    pub fn gate(&self) -> Option<InteractionGate> {
        let index = self.phase.step_index()?;
        let step = self.steps.get(index)?;
        if !step.gates_navigation() {
            return None;
        }
        let rect = self.anchor.rect()?;
        Some(InteractionGate::new(
            GateTicket::new(index, self.generation),
            rect,
        ))
    }

    /// Whether next/back are disabled.
    ///
    /// Interactive steps lock navigation until acted on, unless their target
    /// turned out to be missing.
    pub fn navigation_locked(&self) -> bool {
        self.current_step()
            .is_some_and(|step| step.gates_navigation() && self.anchor != AnchorState::Missing)
    }

    /// Listeners that should be live right now.
    pub fn bindings(&self) -> Vec<Binding> {
        let Some(index) = self.phase.step_index() else {
            return Vec::new();
        };
        let mut bindings = vec![Binding::CancelKey];
        if self.anchor != AnchorState::Pending {
            bindings.push(Binding::Resize {
                generation: self.generation,
            });
        }
        if let (Some(gate), Some(step)) = (self.gate(), self.steps.get(index)) {
            bindings.push(Binding::Target {
                generation: self.generation,
                selector: step.target.clone(),
                ticket: gate.ticket(),
            });
        }
        bindings
    }

    // --- Rendering ---

    /// Tooltip layout for the current step, once its anchor has settled.
    pub fn placement(&self) -> Option<Placement> {
        let step = self.current_step()?;
        if self.anchor == AnchorState::Pending {
            return None;
        }
        Some(placement::place_with(
            &self.config.placement,
            self.anchor.rect(),
            self.tooltip,
            step.side,
            self.viewport,
        ))
    }

    /// Snapshot for rendering, with up to `max_steps` progress entries.
    pub fn view(&self, max_steps: usize) -> Option<TourView<'_>> {
        let index = self.phase.step_index()?;
        let step = self.steps.get(index)?;
        let step_count = self.steps.len();
        Some(TourView {
            step_index: index,
            step_count,
            step,
            title: step.title.as_str(),
            content: step.content.as_str(),
            interactive: step.gates_navigation(),
            navigation_locked: self.navigation_locked(),
            is_first: index == 0,
            is_last: index + 1 == step_count,
            highlight: self
                .anchor
                .rect()
                .map(|rect| rect.inflate(self.config.highlight_padding)),
            placement: self.placement(),
            tooltip_size: self.tooltip,
            viewport: self.viewport,
            steps: progress_window(&self.steps, index, max_steps),
        })
    }

    // --- Internals ---

    fn activate(&mut self, index: usize) {
        self.phase = TourPhase::Showing(index);
        self.generation = self.generation.wrapping_add(1);
        self.pending = None;
        let Some(step) = self.steps.get(index) else {
            return;
        };
        if step.is_unanchored() {
            self.anchor = AnchorState::Unanchored;
        } else {
            let delay = step
                .settle_delay_ms
                .map(Duration::from_millis)
                .unwrap_or_else(|| self.config.settle_delay_duration());
            self.anchor = AnchorState::Pending;
            self.pending = Some(SettleTicket {
                step: index,
                generation: self.generation,
                due: self.now.saturating_add(delay),
            });
        }
        debug!(
            step = index,
            generation = self.generation,
            target = step.label(),
            "Step activated"
        );
    }

    fn step_forward(&mut self, from: usize, reason: TourAdvanceReason) -> TourEvent {
        if from + 1 >= self.steps.len() {
            return self.complete(from, reason);
        }
        self.activate(from + 1);
        self.emit(TourEvent::StepChanged {
            from,
            to: from + 1,
            reason,
        })
    }

    fn complete(&mut self, last: usize, reason: TourAdvanceReason) -> TourEvent {
        self.phase = TourPhase::Completed;
        self.reset();
        info!(step = last, "Tour completed");
        self.emit(TourEvent::Completed { last, reason })
    }

    fn run_settle(&mut self, ticket: SettleTicket, resolver: &mut dyn GeometryResolver) -> SettleOutcome {
        self.pending = None;
        let index = ticket.step;
        let selector = self
            .steps
            .get(index)
            .map(|step| step.target.clone())
            .unwrap_or_default();

        if let Some(rect) = resolver.resolve(&selector) {
            debug!(step = index, selector = %selector, "Target resolved");
            self.anchor = AnchorState::Resolved(rect);
            return SettleOutcome::Resolved(rect);
        }

        let error = TourError::TargetNotFound {
            step: index,
            selector,
        };
        if self.config.skip_unresolved {
            warn!(step = index, error = %error, "Skipping tour step");
            let event = self.step_forward(index, TourAdvanceReason::Skipped);
            SettleOutcome::Skipped { error, event }
        } else {
            warn!(step = index, error = %error, "Showing tour step unanchored");
            self.anchor = AnchorState::Missing;
            SettleOutcome::Unresolved(error)
        }
    }

    fn reset(&mut self) {
        self.steps.clear();
        self.anchor = AnchorState::Pending;
        self.pending = None;
        self.generation = self.generation.wrapping_add(1);
    }

    fn emit(&mut self, event: TourEvent) -> TourEvent {
        self.hooks.notify(&event);
        event
    }
}
