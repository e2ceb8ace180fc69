#![forbid(unsafe_code)]

//! Browser host: DOM geometry, scoped listeners, and timer-driven pumping.
//!
//! # Design
//!
//! DOM listeners never touch the controller directly. They normalize the
//! event, make the synchronous suppress decision (cancel keys, navigation
//! keys that will move the tour, and the primary click on an interactive
//! target), queue a [`DomSignal`], and schedule a zero-delay pump. The pump
//! runs outside any listener invocation, so releasing a listener guard can
//! never drop a closure while it executes.
//!
//! [`WebTour`] methods may be called from the render callback or from tour
//! hooks. While a pump holds the tour, such calls are queued as signals and
//! applied before the pump returns. Hooks run only after the tour is
//! released, so they can call back into the same `WebTour`.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::{Rc, Weak};

use coachmark_core::clock::{Clock, SystemClock};
use coachmark_core::event::{Event, KeyEvent, PointerButton};
use coachmark_core::geometry::{Rect, Size};
use coachmark_runtime::tour::DEFAULT_TOOLTIP_SIZE;
use coachmark_runtime::{
    Binding, BindingManager, GateTicket, GeometryResolver, KeyConfig, ListenerHost, SettleOutcome,
    Step, TourConfig, TourController, TourError, TourEvent, TourHooks, TourView,
};
use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use web_sys::{
    Document, EventTarget, KeyboardEvent, MouseEvent, ScrollIntoViewOptions, ScrollLogicalPosition,
    Window,
};

use crate::keys::{self, NavKeys};

// --- Geometry ---

/// Resolves selectors against the live document.
#[derive(Debug, Clone)]
pub struct DomResolver {
    document: Document,
    scroll: bool,
}

impl DomResolver {
    pub fn new(document: Document) -> Self {
        Self {
            document,
            scroll: true,
        }
    }

    /// Disable scrolling targets into view before measuring.
    #[must_use]
    pub fn without_scroll(mut self) -> Self {
        self.scroll = false;
        self
    }
}

impl GeometryResolver for DomResolver {
    fn resolve(&mut self, selector: &str) -> Option<Rect> {
        let element = match self.document.query_selector(selector) {
            Ok(Some(element)) => element,
            Ok(None) => return None,
            Err(_) => {
                tracing::debug!(selector, "Invalid selector");
                return None;
            }
        };
        if self.scroll {
            let options = ScrollIntoViewOptions::new();
            options.set_block(ScrollLogicalPosition::Center);
            options.set_inline(ScrollLogicalPosition::Center);
            element.scroll_into_view_with_scroll_into_view_options(&options);
        }
        let bounds = element.get_bounding_client_rect();
        Some(Rect::new(
            bounds.top(),
            bounds.left(),
            bounds.width(),
            bounds.height(),
        ))
    }
}

/// Current viewport size of `window`.
pub fn viewport_size(window: &Window) -> Option<Size> {
    let width = window.inner_width().ok()?.as_f64()?;
    let height = window.inner_height().ok()?.as_f64()?;
    Some(Size::new(width, height))
}

// --- Listeners ---

/// Work queued for the next pump.
#[derive(Debug, Clone, PartialEq)]
pub enum DomSignal {
    Key(KeyEvent),
    Resize(Size),
    TargetActivated(GateTicket),
    /// [`WebTour`] calls made while the tour was busy.
    Open(Vec<Step>),
    Next,
    Back,
    Close,
    Dismiss,
    TooltipSize(Size),
}

type SignalQueue = Rc<RefCell<VecDeque<DomSignal>>>;

/// An attached DOM listener. Detaches on drop.
pub struct DomListener {
    target: EventTarget,
    kind: &'static str,
    capture: bool,
    callback: Closure<dyn FnMut(web_sys::Event)>,
}

impl Drop for DomListener {
    fn drop(&mut self) {
        let _ = self.target.remove_event_listener_with_callback_and_bool(
            self.kind,
            self.callback.as_ref().unchecked_ref(),
            self.capture,
        );
    }
}

/// Attaches document, window, and target listeners for a tour.
pub struct DomListenerHost {
    window: Window,
    document: Document,
    keys: KeyConfig,
    queue: SignalQueue,
    wake: Rc<dyn Fn()>,
    nav: Rc<Cell<NavKeys>>,
}

impl DomListenerHost {
    /// A host whose listeners only queue signals; collect them with
    /// [`drain_signals`](Self::drain_signals).
    pub fn new(window: Window, document: Document, keys: KeyConfig) -> Self {
        Self {
            window,
            document,
            keys,
            queue: Rc::default(),
            wake: Rc::new(|| {}),
            nav: Rc::default(),
        }
    }

    #[must_use]
    fn with_wake(mut self, wake: Rc<dyn Fn()>) -> Self {
        self.wake = wake;
        self
    }

    /// Signals queued since the last drain.
    pub fn drain_signals(&self) -> Vec<DomSignal> {
        self.queue.borrow_mut().drain(..).collect()
    }

    /// Navigation keys the key listener should treat as handled.
    pub fn set_nav_keys(&self, nav: NavKeys) {
        self.nav.set(nav);
    }

    fn listen(
        &self,
        target: EventTarget,
        kind: &'static str,
        capture: bool,
        mut handler: impl FnMut(&web_sys::Event) -> Option<DomSignal> + 'static,
    ) -> Option<DomListener> {
        let queue = Rc::clone(&self.queue);
        let wake = Rc::clone(&self.wake);
        let callback = Closure::wrap(Box::new(move |event: web_sys::Event| {
            if let Some(signal) = handler(&event) {
                queue.borrow_mut().push_back(signal);
                wake();
            }
        }) as Box<dyn FnMut(web_sys::Event)>);

        match target.add_event_listener_with_callback_and_bool(
            kind,
            callback.as_ref().unchecked_ref(),
            capture,
        ) {
            Ok(()) => Some(DomListener {
                target,
                kind,
                capture,
                callback,
            }),
            Err(_) => {
                tracing::debug!(kind, "addEventListener failed");
                None
            }
        }
    }
}

impl ListenerHost for DomListenerHost {
    type Guard = DomListener;

    fn attach(&mut self, binding: &Binding) -> Option<DomListener> {
        match binding {
            Binding::CancelKey => {
                let keys = self.keys.clone();
                let nav = Rc::clone(&self.nav);
                self.listen(self.document.clone().into(), "keydown", false, move |event| {
                    let event = event.dyn_ref::<KeyboardEvent>()?;
                    let mods = keys::dom_modifiers(
                        event.shift_key(),
                        event.alt_key(),
                        event.ctrl_key(),
                        event.meta_key(),
                    );
                    let key = keys::dom_key_event(&event.key(), mods, event.repeat())?;
                    let action = keys.action_for(&key)?;
                    if nav.get().suppresses(action) {
                        event.prevent_default();
                        event.stop_propagation();
                    }
                    Some(DomSignal::Key(key))
                })
            }
            Binding::Resize { .. } => {
                let window = self.window.clone();
                self.listen(self.window.clone().into(), "resize", false, move |_| {
                    viewport_size(&window).map(DomSignal::Resize)
                })
            }
            Binding::Target {
                selector, ticket, ..
            } => {
                let element = self.document.query_selector(selector).ok()??;
                let ticket = *ticket;
                let mut fired = false;
                self.listen(element.into(), "click", true, move |event| {
                    if fired {
                        return None;
                    }
                    let button = event.dyn_ref::<MouseEvent>().map_or(0, MouseEvent::button);
                    if keys::dom_pointer_button(button) != Some(PointerButton::Primary) {
                        return None;
                    }
                    fired = true;
                    event.prevent_default();
                    event.stop_propagation();
                    Some(DomSignal::TargetActivated(ticket))
                })
            }
        }
    }
}

// --- Driver ---

type RenderFn = Box<dyn FnMut(Option<&TourView<'_>>)>;

struct Inner {
    clock: SystemClock,
    tour: TourController,
    resolver: DomResolver,
    listeners: BindingManager<DomListenerHost>,
    render: RenderFn,
}

impl Inner {
    fn apply(&mut self, signal: DomSignal) -> Result<Option<TourEvent>, TourError> {
        let now = self.clock.now_mono();
        self.tour.set_now(now);
        Ok(match signal {
            DomSignal::Key(key) => self.tour.handle_event(&Event::Key(key)).event,
            DomSignal::Resize(size) => {
                self.tour.handle_event(&Event::Resize(size));
                self.tour.refresh_anchor(&mut self.resolver);
                None
            }
            DomSignal::TargetActivated(ticket) => Some(self.tour.interactive_advance(ticket)?),
            DomSignal::Open(steps) => Some(self.tour.open(steps)?),
            DomSignal::Next => self.tour.advance(),
            DomSignal::Back => self.tour.retreat(),
            DomSignal::Close => self.tour.request_close(),
            DomSignal::Dismiss => self.tour.dismiss(),
            DomSignal::TooltipSize(size) => {
                self.tour.set_tooltip_size(size);
                None
            }
        })
    }
}

struct Driver {
    window: Window,
    inner: RefCell<Inner>,
    queue: SignalQueue,
    /// Events waiting for the host hooks.
    deferred: Rc<RefCell<VecDeque<TourEvent>>>,
    hooks: RefCell<TourHooks>,
    open: Cell<bool>,
    nav: Rc<Cell<NavKeys>>,
    tooltip: Cell<Size>,
    progress_steps: Cell<usize>,
}

impl Driver {
    /// Apply `signal` now, or queue it if a pump is running.
    fn call(self: &Rc<Self>, signal: DomSignal) -> Result<Option<TourEvent>, TourError> {
        let result = match self.inner.try_borrow_mut() {
            Ok(mut inner) => {
                self.drain(&mut inner);
                let result = inner.apply(signal);
                self.pump(&mut inner);
                result
            }
            Err(_) => {
                self.queue.borrow_mut().push_back(signal);
                schedule(&self.window, Rc::downgrade(self), 0);
                return Ok(None);
            }
        };
        self.flush_hooks();
        result
    }

    fn flush(self: &Rc<Self>) {
        if let Ok(mut inner) = self.inner.try_borrow_mut() {
            self.pump(&mut inner);
        }
        self.flush_hooks();
    }

    fn drain(&self, inner: &mut Inner) {
        loop {
            let Some(signal) = self.queue.borrow_mut().pop_front() else {
                return;
            };
            if let Err(err) = inner.apply(signal) {
                tracing::debug!(%err, "Ignoring queued signal");
            }
        }
    }

    fn pump(self: &Rc<Self>, inner: &mut Inner) {
        // Render may queue more work; settle it before handing back.
        loop {
            self.drain(inner);

            let now = inner.clock.now_mono();
            if let Some(SettleOutcome::Skipped { event, .. }) =
                inner.tour.poll(now, &mut inner.resolver)
            {
                tracing::debug!(?event, "Advanced past unresolved step");
            }

            inner.listeners.reconcile(&inner.tour.bindings());
            self.open.set(inner.tour.is_open());
            self.nav.set(NavKeys::for_tour(&inner.tour));

            let view = inner.tour.view(self.progress_steps.get());
            (inner.render)(view.as_ref());

            if self.queue.borrow().is_empty() {
                if let Some(due) = inner.tour.next_deadline() {
                    let delay = due.saturating_sub(now);
                    schedule(
                        &self.window,
                        Rc::downgrade(self),
                        i32::try_from(delay.as_millis()).unwrap_or(i32::MAX),
                    );
                }
                return;
            }
        }
    }

    /// Deliver deferred events to the host hooks. A hook that calls back
    /// into the tour leaves its events for this loop.
    fn flush_hooks(&self) {
        loop {
            let Ok(mut hooks) = self.hooks.try_borrow_mut() else {
                return;
            };
            let Some(event) = self.deferred.borrow_mut().pop_front() else {
                return;
            };
            hooks.notify(&event);
        }
    }
}

fn schedule(window: &Window, driver: Weak<Driver>, delay_ms: i32) {
    let callback = Closure::once_into_js(move || {
        if let Some(driver) = driver.upgrade() {
            driver.flush();
        }
    });
    if window
        .set_timeout_with_callback_and_timeout_and_arguments_0(callback.unchecked_ref(), delay_ms)
        .is_err()
    {
        tracing::debug!("setTimeout failed");
    }
}

/// A guided tour bound to the browser document.
///
/// Clones share the same tour. Every method may be called from the render
/// callback or a hook; while the tour is busy the call is queued and
/// returns no event.
#[derive(Clone)]
pub struct WebTour {
    driver: Rc<Driver>,
}

impl WebTour {
    /// Create a tour for the current window.
    ///
    /// `render` is called after every change with the view to draw, or
    /// `None` once the tour is closed.
    pub fn new(
        config: TourConfig,
        hooks: TourHooks,
        render: impl FnMut(Option<&TourView<'_>>) + 'static,
    ) -> Option<Self> {
        let window = web_sys::window()?;
        let document = window.document()?;
        let keys = config.keys.clone();

        let deferred: Rc<RefCell<VecDeque<TourEvent>>> = Rc::default();
        let relay = TourHooks::default().on_event({
            let deferred = Rc::clone(&deferred);
            move |event: &TourEvent| deferred.borrow_mut().push_back(event.clone())
        });
        let mut tour = TourController::new(config).with_hooks(relay);
        if let Some(size) = viewport_size(&window) {
            tour.set_viewport(size);
        }

        let driver = Rc::new_cyclic(|weak: &Weak<Driver>| {
            let wake = {
                let window = window.clone();
                let weak = weak.clone();
                Rc::new(move || schedule(&window, weak.clone(), 0)) as Rc<dyn Fn()>
            };
            let host = DomListenerHost::new(window.clone(), document.clone(), keys).with_wake(wake);
            let queue = Rc::clone(&host.queue);
            let nav = Rc::clone(&host.nav);
            Driver {
                window: window.clone(),
                inner: RefCell::new(Inner {
                    clock: SystemClock::new(),
                    tour,
                    resolver: DomResolver::new(document.clone()),
                    listeners: BindingManager::new(host),
                    render: Box::new(render),
                }),
                queue,
                deferred,
                hooks: RefCell::new(hooks),
                open: Cell::new(false),
                nav,
                tooltip: Cell::new(DEFAULT_TOOLTIP_SIZE),
                progress_steps: Cell::new(5),
            }
        });
        Some(Self { driver })
    }

    /// Open the tour and draw its first step.
    pub fn open(&self, steps: Vec<Step>) -> Result<Option<TourEvent>, TourError> {
        self.driver.call(DomSignal::Open(steps))
    }

    /// Next step (the "next"/"finish" control).
    pub fn next(&self) -> Option<TourEvent> {
        self.control(DomSignal::Next)
    }

    /// Previous step (the "back" control).
    pub fn back(&self) -> Option<TourEvent> {
        self.control(DomSignal::Back)
    }

    /// User-initiated close (the close control).
    pub fn close(&self) -> Option<TourEvent> {
        self.control(DomSignal::Close)
    }

    /// Host-initiated close without callbacks.
    pub fn dismiss(&self) -> Option<TourEvent> {
        self.control(DomSignal::Dismiss)
    }

    /// Report the rendered tooltip size so placement can use it.
    pub fn set_tooltip_size(&self, size: Size) {
        if self.driver.tooltip.replace(size) == size {
            return;
        }
        let _ = self.control(DomSignal::TooltipSize(size));
    }

    /// Number of progress entries passed to the renderer.
    pub fn set_progress_steps(&self, count: usize) {
        self.driver.progress_steps.set(count);
    }

    /// Whether a step was showing after the last pump.
    pub fn is_open(&self) -> bool {
        self.driver.open.get()
    }

    /// Apply queued work and deliver pending hooks now instead of on the
    /// next timer tick.
    pub fn flush(&self) {
        self.driver.flush();
    }

    fn control(&self, signal: DomSignal) -> Option<TourEvent> {
        match self.driver.call(signal) {
            Ok(event) => event,
            Err(err) => {
                tracing::debug!(%err, "Tour call rejected");
                None
            }
        }
    }
}
