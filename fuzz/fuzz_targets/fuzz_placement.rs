#![no_main]

use arbitrary::Arbitrary;
use coachmark_core::geometry::{Rect, Size};
use coachmark_layout::{PlacementConfig, Side, place_with};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct Input {
    anchor: Option<(i16, i16, u16, u16)>,
    tooltip: (u16, u16),
    viewport: (u16, u16),
    side: u8,
    gap: u8,
    margin: u8,
}

fuzz_target!(|input: Input| {
    let side = match input.side % 5 {
        0 => Side::Top,
        1 => Side::Bottom,
        2 => Side::Left,
        3 => Side::Right,
        _ => Side::Center,
    };
    let anchor = input.anchor.map(|(top, left, width, height)| {
        Rect::new(f64::from(top), f64::from(left), f64::from(width), f64::from(height))
    });
    let tooltip = Size::new(f64::from(input.tooltip.0), f64::from(input.tooltip.1));
    let viewport = Size::new(f64::from(input.viewport.0), f64::from(input.viewport.1));
    let config = PlacementConfig::default()
        .gap(f64::from(input.gap))
        .margin(f64::from(input.margin));

    let placement = place_with(&config, anchor, tooltip, side, viewport);

    // Clamping: never above/left of the margin, and never past the far
    // margin unless the tooltip does not fit at all.
    let margin = config.margin;
    assert!(placement.tooltip_top.is_finite());
    assert!(placement.tooltip_left.is_finite());
    assert!(placement.tooltip_top >= margin);
    assert!(placement.tooltip_left >= margin);
    let max_top = (viewport.height - tooltip.height - margin).max(margin);
    let max_left = (viewport.width - tooltip.width - margin).max(margin);
    assert!(placement.tooltip_top <= max_top);
    assert!(placement.tooltip_left <= max_left);

    if anchor.is_none() || side == Side::Center {
        assert_eq!(placement.side, Side::Center);
        assert!(placement.arrow.is_none());
    } else {
        assert!(placement.side == side || placement.side == side.opposite());
        assert!(placement.arrow.is_some());
    }
});
