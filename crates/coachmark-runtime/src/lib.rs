#![forbid(unsafe_code)]

//! Runtime: step lifecycle, settle scheduling, and scoped listeners.
//!
//! # Role in Coachmark
//! `coachmark-runtime` owns the tour state machine. [`TourController`] walks
//! a sequence of [`Step`]s, defers each target lookup through a settle
//! ticket, skips steps whose target is missing, gates interactive steps on a
//! click inside the target, and exposes a [`TourView`] for rendering.
//!
//! # How it fits in the system
//! Geometry and input types come from `coachmark-core`; tooltip positions
//! come from `coachmark-layout`. Hosts supply a [`GeometryResolver`] and a
//! [`ListenerHost`], drive time with [`TourController::poll`], and keep their
//! listeners in step with [`TourController::bindings`] via a
//! [`BindingManager`].
//!
//! ```ignore
//! let mut tour = TourController::new(TourConfig::default());
//! tour.open(steps)?;
//! // each frame / timer tick:
//! tour.poll(clock.now_mono(), &mut resolver);
//! bindings.reconcile(&tour.bindings());
//! if let Some(view) = tour.view(5) { draw(&view); }
//! ```

pub mod binding;
pub mod config;
pub mod error;
pub mod gate;
pub mod resolver;
pub mod step;
pub mod tour;
pub mod view;

pub use binding::{Binding, BindingId, BindingManager, ListenerHost, ReconcileStats, RecordingHost};
pub use config::{KeyAction, KeyConfig, TourConfig};
#[cfg(feature = "config")]
pub use config::{steps_from_json_file, steps_from_json_str};
pub use error::{ConfigError, TourError};
pub use gate::{GateDecision, GateTicket, InteractionGate};
pub use resolver::{GeometryResolver, StaticResolver};
pub use step::Step;
pub use tour::{
    AnchorState, Dispatch, SettleOutcome, SettleTicket, TourAdvanceReason, TourController,
    TourEvent, TourHooks, TourPhase,
};
pub use view::{TourProgressStep, TourView};
