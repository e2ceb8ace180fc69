#![cfg(target_arch = "wasm32")]
#![forbid(unsafe_code)]

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use coachmark_core::geometry::{Rect, Size};
use coachmark_runtime::{
    Binding, GateTicket, GeometryResolver, KeyConfig, ListenerHost, StaticResolver, Step,
    TourConfig, TourController, TourEvent, TourHooks,
};
use coachmark_web::{DomListenerHost, DomResolver, DomSignal, NavKeys, WebTour};
use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use wasm_bindgen_test::{wasm_bindgen_test, wasm_bindgen_test_configure};
use web_sys::{
    Document, Element, HtmlElement, KeyboardEvent, KeyboardEventInit, MouseEvent, MouseEventInit,
    Window,
};

wasm_bindgen_test_configure!(run_in_browser);

fn window() -> Window {
    web_sys::window().expect("window")
}

fn document() -> Document {
    window().document().expect("document")
}

fn body() -> HtmlElement {
    document().body().expect("body")
}

fn element(tag: &str, id: &str, parent: &Element) -> Element {
    let el = document().create_element(tag).expect("create element");
    el.set_id(id);
    el.set_text_content(Some(id));
    parent.append_child(&el).expect("append");
    el
}

/// A parent `<div>` with a `<button>` inside, plus a bubbling click counter on
/// the parent.
struct Fixture {
    parent: Element,
    parent_clicks: Rc<Cell<u32>>,
    _listener: Closure<dyn FnMut(web_sys::Event)>,
}

impl Fixture {
    fn new(prefix: &str) -> Self {
        let parent = element("div", &format!("{prefix}-parent"), &body());
        element("button", &format!("{prefix}-button"), &parent);
        let parent_clicks = Rc::new(Cell::new(0));
        let listener = {
            let clicks = Rc::clone(&parent_clicks);
            Closure::wrap(Box::new(move |_: web_sys::Event| clicks.set(clicks.get() + 1))
                as Box<dyn FnMut(web_sys::Event)>)
        };
        parent
            .add_event_listener_with_callback("click", listener.as_ref().unchecked_ref())
            .expect("parent listener");
        Self {
            parent,
            parent_clicks,
            _listener: listener,
        }
    }
}

impl Drop for Fixture {
    fn drop(&mut self) {
        self.parent.remove();
    }
}

/// Dispatch a click on `selector`; returns whether its default was prevented.
fn click(selector: &str, button: i16) -> bool {
    let target = document()
        .query_selector(selector)
        .expect("selector")
        .expect("element");
    let init = MouseEventInit::new();
    init.set_bubbles(true);
    init.set_cancelable(true);
    init.set_button(button);
    let event = MouseEvent::new_with_mouse_event_init_dict("click", &init).expect("event");
    target.dispatch_event(&event).expect("dispatch");
    event.default_prevented()
}

/// Dispatch a keydown on the document; returns whether its default was
/// prevented.
fn keydown(key: &str) -> bool {
    let init = KeyboardEventInit::new();
    init.set_key(key);
    init.set_bubbles(true);
    init.set_cancelable(true);
    let event = KeyboardEvent::new_with_keyboard_event_init_dict("keydown", &init).expect("event");
    document().dispatch_event(&event).expect("dispatch");
    event.default_prevented()
}

fn host() -> DomListenerHost {
    DomListenerHost::new(window(), document(), KeyConfig::default())
}

/// The target binding of an interactive step on `selector`, as the tour
/// would declare it once the step has settled.
fn target_binding(selector: &str) -> (Binding, GateTicket) {
    let mut tour = TourController::new(TourConfig::default());
    tour.open(vec![Step::new(selector, "tour.try").interactive(true)])
        .expect("open");
    let mut resolver = StaticResolver::new().with(selector, Rect::new(10.0, 10.0, 80.0, 30.0));
    tour.poll(Duration::from_secs(1), &mut resolver);
    let binding = tour
        .bindings()
        .into_iter()
        .find(|b| matches!(b, Binding::Target { .. }))
        .expect("target binding");
    let Binding::Target { ticket, .. } = &binding else {
        unreachable!()
    };
    let ticket = *ticket;
    (binding, ticket)
}

#[wasm_bindgen_test]
fn resolver_measures_present_targets_only() {
    let fixture = Fixture::new("cm-resolve");
    let mut resolver = DomResolver::new(document()).without_scroll();

    let rect = resolver
        .resolve("#cm-resolve-button")
        .expect("present target resolves");
    assert!(rect.width > 0.0);
    assert!(rect.height > 0.0);

    assert_eq!(resolver.resolve("#cm-resolve-absent"), None);
    assert_eq!(resolver.resolve("[[not a selector"), None);
    drop(fixture);
}

#[wasm_bindgen_test]
fn target_click_is_captured_once() {
    let fixture = Fixture::new("cm-capture");
    let (binding, ticket) = target_binding("#cm-capture-button");
    let mut host = host();
    let guard = host.attach(&binding).expect("attach");

    assert!(click("#cm-capture-button", 0));
    assert_eq!(fixture.parent_clicks.get(), 0);
    assert_eq!(host.drain_signals(), vec![DomSignal::TargetActivated(ticket)]);

    // Second click passes through untouched.
    assert!(!click("#cm-capture-button", 0));
    assert_eq!(fixture.parent_clicks.get(), 1);
    assert!(host.drain_signals().is_empty());
    drop(guard);
}

#[wasm_bindgen_test]
fn non_primary_click_does_not_consume_the_gate() {
    let fixture = Fixture::new("cm-button");
    let (binding, ticket) = target_binding("#cm-button-button");
    let mut host = host();
    let _guard = host.attach(&binding).expect("attach");

    assert!(!click("#cm-button-button", 2));
    assert_eq!(fixture.parent_clicks.get(), 1);
    assert!(host.drain_signals().is_empty());

    assert!(click("#cm-button-button", 0));
    assert_eq!(host.drain_signals(), vec![DomSignal::TargetActivated(ticket)]);
}

#[wasm_bindgen_test]
fn dropped_guard_stops_delivery() {
    let fixture = Fixture::new("cm-drop");
    let (binding, _) = target_binding("#cm-drop-button");
    let mut host = host();
    let guard = host.attach(&binding).expect("attach");
    drop(guard);

    assert!(!click("#cm-drop-button", 0));
    assert_eq!(fixture.parent_clicks.get(), 1);
    assert!(host.drain_signals().is_empty());
}

#[wasm_bindgen_test]
fn navigation_keys_suppressed_only_when_they_navigate() {
    let mut host = host();
    let guard = host.attach(&Binding::CancelKey).expect("attach");

    assert!(!keydown("Enter"));
    assert_eq!(host.drain_signals().len(), 1);

    host.set_nav_keys(NavKeys {
        next: true,
        prev: false,
    });
    assert!(keydown("Enter"));
    assert!(!keydown("ArrowLeft"));
    assert!(keydown("Escape"));
    assert_eq!(host.drain_signals().len(), 3);

    drop(guard);
    assert!(!keydown("Escape"));
    assert!(host.drain_signals().is_empty());
}

#[wasm_bindgen_test]
fn render_can_report_tooltip_size() {
    let measured = Size::new(320.0, 140.0);
    let slot: Rc<RefCell<Option<WebTour>>> = Rc::default();
    let seen: Rc<RefCell<Vec<Size>>> = Rc::default();

    let tour = WebTour::new(TourConfig::default(), TourHooks::default(), {
        let slot = Rc::clone(&slot);
        let seen = Rc::clone(&seen);
        move |view| {
            let Some(view) = view else {
                return;
            };
            seen.borrow_mut().push(view.tooltip_size);
            if let Some(tour) = slot.borrow().as_ref() {
                tour.set_tooltip_size(measured);
            }
        }
    })
    .expect("tour");
    *slot.borrow_mut() = Some(tour.clone());

    let opened = tour
        .open(vec![Step::centered("tour.a"), Step::centered("tour.b")])
        .expect("open");
    assert_eq!(opened, Some(TourEvent::Opened { steps: 2 }));
    assert!(tour.is_open());
    assert_eq!(seen.borrow().last(), Some(&measured));

    tour.next();
    tour.flush();
    assert_eq!(seen.borrow().last(), Some(&measured));
    tour.dismiss();
    slot.borrow_mut().take();
}

#[wasm_bindgen_test]
fn hooks_can_call_back_into_the_tour() {
    let slot: Rc<RefCell<Option<WebTour>>> = Rc::default();
    let events: Rc<RefCell<Vec<TourEvent>>> = Rc::default();
    let open_after_complete: Rc<Cell<Option<bool>>> = Rc::default();

    let hooks = TourHooks::default()
        .on_complete({
            let slot = Rc::clone(&slot);
            let open_after_complete = Rc::clone(&open_after_complete);
            move || {
                if let Some(tour) = slot.borrow().as_ref() {
                    open_after_complete.set(Some(tour.is_open()));
                    assert_eq!(tour.dismiss(), None);
                }
            }
        })
        .on_event({
            let slot = Rc::clone(&slot);
            let events = Rc::clone(&events);
            move |event: &TourEvent| {
                events.borrow_mut().push(event.clone());
                if matches!(event, TourEvent::Opened { .. })
                    && let Some(tour) = slot.borrow().as_ref()
                {
                    tour.next();
                }
            }
        });
    let tour = WebTour::new(TourConfig::default(), hooks, |_| {}).expect("tour");
    *slot.borrow_mut() = Some(tour.clone());

    tour.open(vec![Step::centered("tour.a"), Step::centered("tour.b")])
        .expect("open");
    {
        let events = events.borrow();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0], TourEvent::Opened { steps: 2 });
        assert!(matches!(events[1], TourEvent::StepChanged { from: 0, to: 1, .. }));
    }

    assert!(matches!(tour.next(), Some(TourEvent::Completed { last: 1, .. })));
    assert_eq!(open_after_complete.get(), Some(false));
    assert!(!tour.is_open());
    slot.borrow_mut().take();
}
