#![forbid(unsafe_code)]

//! Scoped host listeners.
//!
//! The controller never attaches listeners itself. It declares which ones
//! should be live via [`TourController::bindings`](crate::TourController::bindings),
//! and a [`BindingManager`] reconciles that declaration against what the host
//! has attached.
//!
//! # How it works
//!
//! 1. After every transition the host calls `reconcile(controller.bindings())`
//! 2. Bindings no longer declared are released (their guard is dropped)
//! 3. Newly declared bindings are attached through the [`ListenerHost`]
//! 4. Unchanged bindings stay attached
//!
//! Step-scoped bindings carry the activation generation in their id and are
//! held together in one step subscription. A step change releases the whole
//! previous subscription before the new one attaches, and a subscription is
//! only ever live in full.

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use crate::gate::GateTicket;

/// Stable identity of a declared binding.
pub type BindingId = u64;

const CANCEL_KEY_ID: BindingId = 0;

/// A listener the controller wants attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Binding {
    /// Document-level key listener (cancel and navigation keys). Lives while
    /// the tour is open.
    CancelKey,
    /// Viewport resize listener. Lives while a step's tooltip is visible.
    Resize { generation: u64 },
    /// Capturing primary-action listener on an interactive step's target.
    Target {
        generation: u64,
        selector: String,
        ticket: GateTicket,
    },
}

impl Binding {
    /// Identity used for deduplication across reconciles.
    #[must_use]
    pub fn id(&self) -> BindingId {
        match self {
            Self::CancelKey => CANCEL_KEY_ID,
            Self::Resize { generation } => generation.wrapping_mul(4).wrapping_add(1),
            Self::Target { generation, .. } => generation.wrapping_mul(4).wrapping_add(2),
        }
    }

    /// Step activation the binding is scoped to; `None` for tour-scoped
    /// bindings.
    #[must_use]
    pub const fn generation(&self) -> Option<u64> {
        match self {
            Self::CancelKey => None,
            Self::Resize { generation } | Self::Target { generation, .. } => Some(*generation),
        }
    }

    /// Short name for logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::CancelKey => "cancel-key",
            Self::Resize { .. } => "resize",
            Self::Target { .. } => "target",
        }
    }
}

/// Attaches host listeners on behalf of a [`BindingManager`].
pub trait ListenerHost {
    /// Handle that detaches the listener when dropped.
    type Guard;

    /// Attach the listener described by `binding`.
    ///
    /// Returns `None` if it could not be attached (for example the target
    /// element vanished); the manager retries on the next reconcile.
    fn attach(&mut self, binding: &Binding) -> Option<Self::Guard>;
}

struct ActiveBinding<G> {
    id: BindingId,
    kind: &'static str,
    _guard: G,
}

/// Guards for one step activation, attached and released as a unit.
struct StepSubscription<G> {
    generation: u64,
    /// Declared ids, in declaration order.
    ids: Vec<BindingId>,
    guards: Vec<ActiveBinding<G>>,
}

/// Counts from one reconcile pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileStats {
    pub attached: usize,
    pub released: usize,
    pub failed: usize,
}

/// Keeps the host's attached listeners in line with the declared bindings.
///
/// Tour-scoped bindings ([`Binding::CancelKey`]) are tracked one by one.
/// Step-scoped bindings live in a single step subscription: when the declared
/// step set changes, the old subscription is released before any guard of the
/// new one attaches, and if any guard fails to attach the whole new
/// subscription is dropped and retried on the next reconcile.
pub struct BindingManager<H: ListenerHost> {
    host: H,
    tour: Vec<ActiveBinding<H::Guard>>,
    step: Option<StepSubscription<H::Guard>>,
}

impl<H: ListenerHost> BindingManager<H> {
    pub fn new(host: H) -> Self {
        Self {
            host,
            tour: Vec::new(),
            step: None,
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Number of live bindings.
    pub fn len(&self) -> usize {
        self.tour.len() + self.step.as_ref().map_or(0, |s| s.guards.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether a binding with `id` is live.
    pub fn is_active(&self, id: BindingId) -> bool {
        self.tour.iter().any(|a| a.id == id)
            || self
                .step
                .as_ref()
                .is_some_and(|s| s.guards.iter().any(|a| a.id == id))
    }

    /// Generation of the live step subscription.
    pub fn step_generation(&self) -> Option<u64> {
        self.step.as_ref().map(|s| s.generation)
    }

    /// Update the set of live bindings.
    ///
    /// Releases run before attaches, so listeners of two different step
    /// activations are never live at the same time.
    pub fn reconcile(&mut self, bindings: &[Binding]) -> ReconcileStats {
        let mut stats = ReconcileStats::default();

        let mut tour_ids: Vec<BindingId> = Vec::new();
        let mut step_bindings: Vec<&Binding> = Vec::new();
        let mut step_ids: Vec<BindingId> = Vec::new();
        for binding in bindings {
            let id = binding.id();
            match binding.generation() {
                None if !tour_ids.contains(&id) => tour_ids.push(id),
                Some(_) if !step_ids.contains(&id) => {
                    step_ids.push(id);
                    step_bindings.push(binding);
                }
                _ => {}
            }
        }

        // Release.
        let before = self.tour.len();
        self.tour.retain(|active| {
            let keep = tour_ids.contains(&active.id);
            if !keep {
                tracing::debug!(binding_id = active.id, kind = active.kind, "Releasing binding");
            }
            keep
        });
        stats.released += before - self.tour.len();

        let step_changed = self.step.as_ref().map(|s| s.ids.as_slice()) != Some(step_ids.as_slice());
        if step_changed && let Some(old) = self.step.take() {
            stats.released += release_subscription(old);
        }

        // Attach.
        for binding in bindings.iter().filter(|b| b.generation().is_none()) {
            let id = binding.id();
            if self.tour.iter().any(|a| a.id == id) {
                continue;
            }
            match self.host.attach(binding) {
                Some(guard) => {
                    tracing::debug!(binding_id = id, kind = binding.kind(), "Attaching binding");
                    self.tour.push(ActiveBinding {
                        id,
                        kind: binding.kind(),
                        _guard: guard,
                    });
                    stats.attached += 1;
                }
                None => {
                    tracing::debug!(binding_id = id, kind = binding.kind(), "Binding attach failed");
                    stats.failed += 1;
                }
            }
        }

        if self.step.is_none() && !step_bindings.is_empty() {
            let generation = step_bindings[0].generation().unwrap_or_default();
            let mut guards = Vec::with_capacity(step_bindings.len());
            for binding in &step_bindings {
                let id = binding.id();
                let Some(guard) = self.host.attach(binding) else {
                    tracing::debug!(
                        binding_id = id,
                        kind = binding.kind(),
                        generation,
                        "Binding attach failed; dropping step subscription"
                    );
                    stats.failed += 1;
                    // Partial bundles are never kept.
                    drop(guards);
                    return stats;
                };
                guards.push(ActiveBinding {
                    id,
                    kind: binding.kind(),
                    _guard: guard,
                });
            }
            tracing::debug!(generation, bindings = guards.len(), "Attaching step subscription");
            stats.attached += guards.len();
            self.step = Some(StepSubscription {
                generation,
                ids: step_ids,
                guards,
            });
        }
        stats
    }

    /// Release every live binding.
    pub fn release_all(&mut self) {
        if let Some(step) = self.step.take() {
            release_subscription(step);
        }
        for active in self.tour.drain(..) {
            tracing::debug!(binding_id = active.id, kind = active.kind, "Releasing binding");
        }
    }
}

fn release_subscription<G>(subscription: StepSubscription<G>) -> usize {
    tracing::debug!(
        generation = subscription.generation,
        bindings = subscription.guards.len(),
        "Releasing step subscription"
    );
    subscription.guards.len()
}

impl<H: ListenerHost> Drop for BindingManager<H> {
    fn drop(&mut self) {
        self.release_all();
    }
}

impl<H: ListenerHost + std::fmt::Debug> std::fmt::Debug for BindingManager<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BindingManager")
            .field("host", &self.host)
            .field(
                "tour",
                &self.tour.iter().map(|a| (a.id, a.kind)).collect::<Vec<_>>(),
            )
            .field(
                "step",
                &self
                    .step
                    .as_ref()
                    .map(|s| (s.generation, s.guards.iter().map(|a| a.kind).collect::<Vec<_>>())),
            )
            .finish()
    }
}

// --- In-memory host ---

/// Host that records attachments instead of touching a real event system.
///
/// Used by scripted simulation and tests to observe listener lifetimes.
/// Clones share the same record.
#[derive(Debug, Clone, Default)]
pub struct RecordingHost {
    record: Rc<RefCell<Record>>,
}

#[derive(Debug, Default)]
struct Record {
    live: Vec<Binding>,
    attached_total: usize,
    unavailable: HashSet<String>,
}

impl RecordingHost {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse target bindings for `selector`, as if the element were gone.
    pub fn make_unavailable(&self, selector: impl Into<String>) {
        self.record.borrow_mut().unavailable.insert(selector.into());
    }

    /// Bindings currently attached.
    #[must_use]
    pub fn live(&self) -> Vec<Binding> {
        self.record.borrow().live.clone()
    }

    /// Total attachments made over the host's lifetime.
    #[must_use]
    pub fn attached_total(&self) -> usize {
        self.record.borrow().attached_total
    }
}

/// Guard returned by [`RecordingHost`]; removes its binding from the record
/// when dropped.
#[derive(Debug)]
pub struct RecordingGuard {
    id: BindingId,
    record: Rc<RefCell<Record>>,
}

impl Drop for RecordingGuard {
    fn drop(&mut self) {
        let id = self.id;
        self.record.borrow_mut().live.retain(|b| b.id() != id);
    }
}

impl ListenerHost for RecordingHost {
    type Guard = RecordingGuard;

    fn attach(&mut self, binding: &Binding) -> Option<RecordingGuard> {
        let mut record = self.record.borrow_mut();
        if let Binding::Target { selector, .. } = binding {
            if record.unavailable.contains(selector) {
                return None;
            }
        }
        record.live.push(binding.clone());
        record.attached_total += 1;
        Some(RecordingGuard {
            id: binding.id(),
            record: Rc::clone(&self.record),
        })
    }
}
