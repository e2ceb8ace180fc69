#![no_main]

use std::time::Duration;

use coachmark_core::event::{Event, KeyCode, KeyEvent, PointerButton, PointerEvent, PointerEventKind};
use coachmark_core::geometry::{Point, Rect, Size};
use coachmark_runtime::{BindingManager, RecordingHost, StaticResolver, Step, TourConfig, TourController};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // First byte: step count (1..=8) and skip policy.
    let Some((&head, ops)) = data.split_first() else {
        return;
    };
    let count = usize::from(head % 8) + 1;
    let config = TourConfig::default().skip_unresolved(head & 0x80 == 0);
    let steps: Vec<Step> = (0..count)
        .map(|i| match i % 3 {
            0 => Step::centered(format!("s{i}")),
            1 => Step::new(format!("#t{i}"), format!("s{i}")).interactive(i % 2 == 1),
            _ => Step::new("#absent", format!("s{i}")),
        })
        .collect();
    let mut resolver: StaticResolver = (0..count)
        .map(|i| (format!("#t{i}"), Rect::new(100.0, 100.0, 80.0, 40.0)))
        .collect();

    let host = RecordingHost::new();
    let mut listeners = BindingManager::new(host.clone());
    let mut tour = TourController::new(config);
    let mut now = Duration::ZERO;

    for &op in ops {
        match op % 10 {
            0 => {
                let _ = tour.open(steps.clone());
            }
            1 => {
                tour.advance();
            }
            2 => {
                tour.retreat();
            }
            3 => {
                tour.jump_to(usize::from(op >> 4));
            }
            4 => {
                now += Duration::from_millis(u64::from(op >> 2));
                tour.poll(now, &mut resolver);
            }
            5 => {
                let pointer = PointerEvent::new(
                    PointerEventKind::Down(PointerButton::Primary),
                    Point::new(140.0, 120.0),
                );
                tour.handle_event(&Event::Pointer(pointer));
            }
            6 => {
                tour.handle_event(&Event::Key(KeyEvent::new(KeyCode::Escape)));
            }
            7 => {
                tour.handle_event(&Event::Resize(Size::new(f64::from(op) * 8.0, 600.0)));
            }
            8 => {
                tour.request_close();
            }
            _ => {
                tour.dismiss();
            }
        }
        listeners.reconcile(&tour.bindings());

        match tour.step_index() {
            Some(index) => assert!(index < count),
            None => assert!(host.live().is_empty()),
        }
        if let Some(view) = tour.view(5) {
            assert_eq!(view.step_count, count);
            assert!(view.steps.iter().any(|s| s.is_current));
        }
    }
});
