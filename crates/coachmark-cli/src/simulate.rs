//! Scripted tour replay against a static layout.
//!
//! Time is simulated with a [`DeterministicClock`], so a replay is fully
//! reproducible: settle tickets fire exactly when `wait` moves the clock past
//! their deadline.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Duration;

use clap::Args;
use coachmark_core::clock::{Clock, DeterministicClock};
use coachmark_core::event::{Event, PointerButton, PointerEvent, PointerEventKind};
use coachmark_core::geometry::{Point, Rect, Size};
use coachmark_layout::placement::Placement;
use coachmark_runtime::{
    AnchorState, BindingManager, RecordingHost, StaticResolver, Step, TourConfig, TourController,
    TourEvent, TourHooks, TourView, steps_from_json_file,
};
use serde::Serialize;
use serde_json::{Value, json};

use crate::cli::parse_size;
use crate::error::Result;
use crate::script::{ScriptLine, ScriptOp, parse_script};

#[derive(Debug, Clone, Args)]
pub struct SimulateArgs {
    /// JSON array of steps.
    #[arg(long)]
    pub steps: PathBuf,

    /// JSON object mapping selectors to {top, left, width, height}.
    #[arg(long)]
    pub layout: Option<PathBuf>,

    /// Script file: one input per line, or a JSON array of lines.
    #[arg(long)]
    pub script: PathBuf,

    /// Tour config (.toml or .json).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Viewport size as WIDTH,HEIGHT.
    #[arg(long, value_parser = parse_size, default_value = "1280,800")]
    pub viewport: Size,

    /// Progress strip length in the final view.
    #[arg(long = "progress-steps", default_value_t = 5)]
    pub progress_steps: usize,
}

/// Load a tour config, choosing the format by file extension.
pub fn load_config(path: &Path) -> Result<TourConfig> {
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    let config = if is_json {
        TourConfig::from_json_file(path)?
    } else {
        TourConfig::from_toml_file(path)?
    };
    Ok(config.validated()?)
}

/// Load a selector-to-bounds layout.
pub fn load_layout(path: &Path) -> Result<StaticResolver> {
    let text = std::fs::read_to_string(path)?;
    let rects: BTreeMap<String, Rect> = serde_json::from_str(&text)?;
    Ok(rects.into_iter().collect())
}

/// Output line for one script input.
#[derive(Debug, Clone, Serialize)]
pub struct StepRecord {
    pub t_ms: u64,
    pub line: usize,
    pub op: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consumed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub events: Vec<Value>,
    pub phase: &'static str,
    pub step: Option<usize>,
    pub anchor: Value,
    pub placement: Option<Placement>,
    pub listeners: Vec<&'static str>,
}

/// Closing summary.
#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub phase: &'static str,
    pub completed: u32,
    pub cancelled: u32,
    pub lookups: Vec<String>,
    pub listeners_attached: usize,
    pub view: Option<Value>,
}

pub struct Simulation {
    clock: DeterministicClock,
    tour: TourController,
    resolver: StaticResolver,
    host: RecordingHost,
    listeners: BindingManager<RecordingHost>,
    steps: Vec<Step>,
    events: Rc<RefCell<Vec<TourEvent>>>,
    completed: Rc<Cell<u32>>,
    cancelled: Rc<Cell<u32>>,
}

impl Simulation {
    pub fn new(config: TourConfig, steps: Vec<Step>, resolver: StaticResolver, viewport: Size) -> Self {
        let events = Rc::new(RefCell::new(Vec::new()));
        let completed = Rc::new(Cell::new(0));
        let cancelled = Rc::new(Cell::new(0));
        let hooks = TourHooks::default()
            .on_event({
                let events = Rc::clone(&events);
                move |event: &TourEvent| events.borrow_mut().push(event.clone())
            })
            .on_complete({
                let completed = Rc::clone(&completed);
                move || completed.set(completed.get() + 1)
            })
            .on_cancel({
                let cancelled = Rc::clone(&cancelled);
                move || cancelled.set(cancelled.get() + 1)
            });
        let mut tour = TourController::new(config).with_hooks(hooks);
        tour.set_viewport(viewport);

        let host = RecordingHost::new();
        Self {
            clock: DeterministicClock::new(),
            tour,
            resolver,
            listeners: BindingManager::new(host.clone()),
            host,
            steps,
            events,
            completed,
            cancelled,
        }
    }

    pub fn tour(&self) -> &TourController {
        &self.tour
    }

    pub fn resolver(&self) -> &StaticResolver {
        &self.resolver
    }

    /// Apply one scripted input and report the resulting state.
    pub fn apply(&mut self, line: &ScriptLine) -> StepRecord {
        let mut consumed = None;
        let mut error = None;
        let now = self.clock.now_mono();
        self.tour.set_now(now);

        match &line.op {
            ScriptOp::Open => {
                if let Err(err) = self.tour.open(self.steps.clone()) {
                    error = Some(err.to_string());
                }
            }
            ScriptOp::Next => {
                self.tour.advance();
            }
            ScriptOp::Prev => {
                self.tour.retreat();
            }
            ScriptOp::Jump(index) => {
                self.tour.jump_to(*index);
            }
            ScriptOp::Click { x, y } => {
                let pointer = PointerEvent::new(
                    PointerEventKind::Down(PointerButton::Primary),
                    Point::new(*x, *y),
                );
                consumed = Some(self.tour.handle_event(&Event::Pointer(pointer)).consumed);
            }
            ScriptOp::Key { event, .. } => {
                consumed = Some(self.tour.handle_event(&Event::Key(*event)).consumed);
            }
            ScriptOp::Wait(ms) => self.wait(Duration::from_millis(*ms)),
            ScriptOp::Resize(size) => {
                self.tour.handle_event(&Event::Resize(*size));
                self.tour.refresh_anchor(&mut self.resolver);
            }
            ScriptOp::Tooltip(size) => self.tour.set_tooltip_size(*size),
            ScriptOp::Remove(selector) => {
                self.resolver.remove(selector);
                self.host.make_unavailable(selector.clone());
            }
            ScriptOp::Close => {
                self.tour.request_close();
            }
            ScriptOp::Dismiss => {
                self.tour.dismiss();
            }
        }

        self.run_due();
        self.listeners.reconcile(&self.tour.bindings());

        let events: Vec<Value> = self.events.borrow_mut().drain(..).map(|e| event_json(&e)).collect();
        StepRecord {
            t_ms: millis(self.clock.now_mono()),
            line: line.line,
            op: line.op.name(),
            consumed,
            error,
            events,
            phase: self.tour.phase().as_str(),
            step: self.tour.step_index(),
            anchor: anchor_json(self.tour.anchor()),
            placement: self.tour.placement(),
            listeners: self.host.live().iter().map(|b| b.kind()).collect(),
        }
    }

    pub fn summary(&self, progress_steps: usize) -> Summary {
        Summary {
            phase: self.tour.phase().as_str(),
            completed: self.completed.get(),
            cancelled: self.cancelled.get(),
            lookups: self.resolver.lookups().to_vec(),
            listeners_attached: self.host.attached_total(),
            view: self.tour.view(progress_steps).as_ref().map(view_json),
        }
    }

    /// Move the clock forward, running each settle ticket at its own deadline.
    fn wait(&mut self, duration: Duration) {
        let target = self.clock.now_mono().saturating_add(duration);
        while let Some(due) = self.tour.next_deadline()
            && due <= target
        {
            if due > self.clock.now_mono() {
                self.clock.set(due);
            }
            if self.tour.poll(self.clock.now_mono(), &mut self.resolver).is_none() {
                break;
            }
        }
        self.clock.set(target);
    }

    fn run_due(&mut self) {
        let now = self.clock.now_mono();
        while self.tour.poll(now, &mut self.resolver).is_some() {}
    }
}

pub fn run_simulate(args: &SimulateArgs, out: &mut impl Write) -> Result<()> {
    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => TourConfig::default(),
    };
    let steps = steps_from_json_file(&args.steps)?;
    let resolver = match &args.layout {
        Some(path) => load_layout(path)?,
        None => StaticResolver::new(),
    };
    let script = parse_script(&std::fs::read_to_string(&args.script)?)?;
    tracing::info!(
        steps = steps.len(),
        inputs = script.len(),
        layout = args.layout.is_some(),
        "Starting simulation"
    );

    let mut simulation = Simulation::new(config, steps, resolver, args.viewport);
    for line in &script {
        let record = simulation.apply(line);
        serde_json::to_writer(&mut *out, &record)?;
        writeln!(out)?;
    }
    serde_json::to_writer(&mut *out, &json!({ "summary": simulation.summary(args.progress_steps) }))?;
    writeln!(out)?;
    Ok(())
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

fn anchor_json(anchor: AnchorState) -> Value {
    match anchor {
        AnchorState::Pending => json!("pending"),
        AnchorState::Unanchored => json!("unanchored"),
        AnchorState::Missing => json!("missing"),
        AnchorState::Resolved(rect) => json!({ "resolved": rect }),
    }
}

fn event_json(event: &TourEvent) -> Value {
    match event {
        TourEvent::Opened { steps } => json!({ "type": "opened", "steps": steps }),
        TourEvent::StepChanged { from, to, reason } => json!({
            "type": "step_changed",
            "from": from,
            "to": to,
            "reason": reason.as_str(),
        }),
        TourEvent::Completed { last, reason } => json!({
            "type": "completed",
            "last": last,
            "reason": reason.as_str(),
        }),
        TourEvent::Cancelled { at } => json!({ "type": "cancelled", "at": at }),
        TourEvent::Dismissed { at } => json!({ "type": "dismissed", "at": at }),
    }
}

fn view_json(view: &TourView<'_>) -> Value {
    json!({
        "step_index": view.step_index,
        "step_count": view.step_count,
        "progress": view.progress_label(),
        "title": view.title,
        "content": view.content,
        "interactive": view.interactive,
        "navigation_locked": view.navigation_locked,
        "is_first": view.is_first,
        "is_last": view.is_last,
        "highlight": view.highlight,
        "placement": view.placement,
        "tooltip": view.tooltip_rect(),
        "strip": view
            .steps
            .iter()
            .map(|s| json!({ "index": s.index, "title": s.title, "current": s.is_current }))
            .collect::<Vec<_>>(),
    })
}
