#![forbid(unsafe_code)]

//! Tooltip placement around an anchor rectangle.
//!
//! # Invariants
//!
//! 1. The returned top-left always lies in `[margin, viewport - tooltip - margin]`
//!    on both axes. When the tooltip is too large for that range the bounds
//!    collapse to `margin`.
//! 2. Candidates are tried in a fixed order: the preferred side, then its
//!    opposite. The first candidate whose clamped position stays clear of the
//!    anchor wins; if none does, the last clamped trial is used.
//! 3. The arrow stays at least one arrow-width inside the tooltip edge, or
//!    sits at the midpoint when the edge is shorter than two arrows.
//! 4. Placement is a pure function of its inputs. Nothing is cached.
//!
//! # Example
//!
//! ```
//! use coachmark_core::geometry::{Rect, Size};
//! use coachmark_layout::placement::{Side, place};
//!
//! let anchor = Rect::new(100.0, 100.0, 50.0, 50.0);
//! let placed = place(
//!     Some(anchor),
//!     Size::new(200.0, 100.0),
//!     Side::Bottom,
//!     Size::new(800.0, 600.0),
//! );
//! assert_eq!(placed.tooltip_top, 166.0);
//! assert_eq!(placed.tooltip_left, 25.0);
//! ```

use std::fmt;
use std::str::FromStr;

use coachmark_core::geometry::{Rect, Size};

/// Default distance between the anchor edge and the tooltip.
pub const DEFAULT_GAP: f64 = 16.0;
/// Default minimum distance between the tooltip and the viewport edge.
pub const DEFAULT_MARGIN: f64 = 16.0;
/// Default arrow width.
pub const DEFAULT_ARROW_SIZE: f64 = 8.0;

/// Side of the anchor the tooltip is placed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "lowercase")
)]
pub enum Side {
    /// Above the anchor.
    Top,
    /// Below the anchor.
    #[default]
    Bottom,
    /// Left of the anchor.
    Left,
    /// Right of the anchor.
    Right,
    /// Centred in the viewport, ignoring the anchor.
    Center,
}

impl Side {
    /// The side across the anchor. `Center` is its own opposite.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Top => Self::Bottom,
            Self::Bottom => Self::Top,
            Self::Left => Self::Right,
            Self::Right => Self::Left,
            Self::Center => Self::Center,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Top => "top",
            Self::Bottom => "bottom",
            Self::Left => "left",
            Self::Right => "right",
            Self::Center => "center",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Side {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "top" => Ok(Self::Top),
            "bottom" => Ok(Self::Bottom),
            "left" => Ok(Self::Left),
            "right" => Ok(Self::Right),
            "center" | "centre" => Ok(Self::Center),
            other => Err(format!("unknown side: {other}")),
        }
    }
}

/// Placement tunables.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct PlacementConfig {
    /// Distance between the anchor edge and the tooltip.
    pub gap: f64,
    /// Minimum distance between the tooltip and the viewport edge.
    pub margin: f64,
    /// Arrow width along the tooltip edge.
    pub arrow_size: f64,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            gap: DEFAULT_GAP,
            margin: DEFAULT_MARGIN,
            arrow_size: DEFAULT_ARROW_SIZE,
        }
    }
}

impl PlacementConfig {
    /// Set the anchor gap.
    #[must_use]
    pub fn gap(mut self, gap: f64) -> Self {
        self.gap = gap;
        self
    }

    /// Set the viewport margin.
    #[must_use]
    pub fn margin(mut self, margin: f64) -> Self {
        self.margin = margin;
        self
    }

    /// Set the arrow size.
    #[must_use]
    pub fn arrow_size(mut self, arrow_size: f64) -> Self {
        self.arrow_size = arrow_size;
        self
    }

    /// Validate all parameters. An empty list means the config is valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        for (name, value) in [
            ("gap", self.gap),
            ("margin", self.margin),
            ("arrow_size", self.arrow_size),
        ] {
            if !value.is_finite() || value < 0.0 {
                errors.push(format!("placement.{name} must be finite and >= 0, got {value}"));
            }
        }
        errors
    }
}

/// Arrow (pointer) drawn on the tooltip edge facing the anchor.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Arrow {
    /// Tooltip edge the arrow sits on.
    pub edge: Side,
    /// Distance from the start of that edge (left for top/bottom, top for left/right).
    pub offset: f64,
}

/// Computed tooltip layout.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Placement {
    pub tooltip_top: f64,
    pub tooltip_left: f64,
    /// Side that was finally used. `Center` when no anchor applies.
    pub side: Side,
    /// `None` when the arrow is suppressed.
    pub arrow: Option<Arrow>,
    /// Whether the chosen trial kept the tooltip clear of the anchor
    /// (false for the best-effort fallback).
    pub clear_of_anchor: bool,
}

impl Placement {
    /// Tooltip bounds for a tooltip of the given size.
    #[must_use]
    pub fn rect(&self, tooltip: Size) -> Rect {
        Rect::new(
            self.tooltip_top,
            self.tooltip_left,
            tooltip.width,
            tooltip.height,
        )
    }
}

/// One candidate side evaluated against the anchor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Trial {
    pub side: Side,
    /// Clamped top.
    pub top: f64,
    /// Clamped left.
    pub left: f64,
    /// Whether the clamped position still lies on `side` of the anchor.
    pub acceptable: bool,
}

/// Ordered candidate sides for a preferred side.
#[must_use]
pub const fn candidates(preferred: Side) -> [Side; 2] {
    [preferred, preferred.opposite()]
}

/// Pick the first acceptable trial, or the last one evaluated.
///
/// Trials are pulled lazily, so sides after the winner are never computed.
pub fn select<I>(trials: I) -> Option<Trial>
where
    I: IntoIterator<Item = Trial>,
{
    let mut last = None;
    for trial in trials {
        if trial.acceptable {
            return Some(trial);
        }
        last = Some(trial);
    }
    last
}

/// Clamp one coordinate into `[margin, viewport - extent - margin]`.
///
/// The upper bound never drops below `margin`, so an oversized tooltip pins
/// to the margin. NaN input pins to the margin as well.
#[must_use]
pub fn clamp_axis(value: f64, viewport: f64, extent: f64, margin: f64) -> f64 {
    let min = margin;
    let max = (viewport - extent - margin).max(min);
    value.max(min).min(max)
}

/// Place with the default configuration.
#[must_use]
pub fn place(anchor: Option<Rect>, tooltip: Size, preferred: Side, viewport: Size) -> Placement {
    place_with(&PlacementConfig::default(), anchor, tooltip, preferred, viewport)
}

/// Place a tooltip of `tooltip` size next to `anchor` inside `viewport`.
#[must_use]
pub fn place_with(
    config: &PlacementConfig,
    anchor: Option<Rect>,
    tooltip: Size,
    preferred: Side,
    viewport: Size,
) -> Placement {
    let anchor = match anchor {
        Some(anchor) if preferred != Side::Center => anchor,
        _ => return centered(config, tooltip, viewport),
    };

    let trials = candidates(preferred)
        .into_iter()
        .map(|side| trial(config, &anchor, tooltip, side, viewport));

    // Two candidates are always evaluated, so `select` cannot come back empty.
    let Some(chosen) = select(trials) else {
        return centered(config, tooltip, viewport);
    };

    Placement {
        tooltip_top: chosen.top,
        tooltip_left: chosen.left,
        side: chosen.side,
        arrow: Some(arrow_for(config, chosen, &anchor, tooltip)),
        clear_of_anchor: chosen.acceptable,
    }
}

fn centered(config: &PlacementConfig, tooltip: Size, viewport: Size) -> Placement {
    let top = (viewport.height - tooltip.height) / 2.0;
    let left = (viewport.width - tooltip.width) / 2.0;
    Placement {
        tooltip_top: clamp_axis(top, viewport.height, tooltip.height, config.margin),
        tooltip_left: clamp_axis(left, viewport.width, tooltip.width, config.margin),
        side: Side::Center,
        arrow: None,
        clear_of_anchor: true,
    }
}

fn trial(config: &PlacementConfig, anchor: &Rect, tooltip: Size, side: Side, viewport: Size) -> Trial {
    let gap = config.gap;
    let (top, left) = match side {
        Side::Bottom => (
            anchor.bottom() + gap,
            anchor.center_x() - tooltip.width / 2.0,
        ),
        Side::Top => (
            anchor.top - gap - tooltip.height,
            anchor.center_x() - tooltip.width / 2.0,
        ),
        Side::Right => (
            anchor.center_y() - tooltip.height / 2.0,
            anchor.right() + gap,
        ),
        Side::Left => (
            anchor.center_y() - tooltip.height / 2.0,
            anchor.left - gap - tooltip.width,
        ),
        Side::Center => (
            (viewport.height - tooltip.height) / 2.0,
            (viewport.width - tooltip.width) / 2.0,
        ),
    };

    let top = clamp_axis(top, viewport.height, tooltip.height, config.margin);
    let left = clamp_axis(left, viewport.width, tooltip.width, config.margin);

    let acceptable = match side {
        Side::Bottom => top >= anchor.bottom(),
        Side::Top => top + tooltip.height <= anchor.top,
        Side::Right => left >= anchor.right(),
        Side::Left => left + tooltip.width <= anchor.left,
        Side::Center => true,
    };

    Trial {
        side,
        top,
        left,
        acceptable,
    }
}

fn arrow_for(config: &PlacementConfig, chosen: Trial, anchor: &Rect, tooltip: Size) -> Arrow {
    let size = config.arrow_size;
    match chosen.side {
        Side::Bottom | Side::Top | Side::Center => Arrow {
            edge: chosen.side.opposite(),
            offset: clamp_arrow(anchor.center_x() - chosen.left, tooltip.width, size),
        },
        Side::Right | Side::Left => Arrow {
            edge: chosen.side.opposite(),
            offset: clamp_arrow(anchor.center_y() - chosen.top, tooltip.height, size),
        },
    }
}

fn clamp_arrow(offset: f64, edge_len: f64, arrow: f64) -> f64 {
    let lo = arrow;
    let hi = edge_len - arrow;
    if hi < lo {
        return edge_len / 2.0;
    }
    offset.max(lo).min(hi)
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIEWPORT: Size = Size {
        width: 800.0,
        height: 600.0,
    };
    const TOOLTIP: Size = Size {
        width: 200.0,
        height: 100.0,
    };

    fn anchor(top: f64, left: f64, width: f64, height: f64) -> Option<Rect> {
        Some(Rect::new(top, left, width, height))
    }

    // ── Side helpers ─────────────────────────────────────────────────────

    #[test]
    fn opposite_pairs() {
        assert_eq!(Side::Top.opposite(), Side::Bottom);
        assert_eq!(Side::Bottom.opposite(), Side::Top);
        assert_eq!(Side::Left.opposite(), Side::Right);
        assert_eq!(Side::Right.opposite(), Side::Left);
        assert_eq!(Side::Center.opposite(), Side::Center);
    }

    #[test]
    fn side_parses_and_displays() {
        for side in [Side::Top, Side::Bottom, Side::Left, Side::Right, Side::Center] {
            assert_eq!(side.to_string().parse::<Side>(), Ok(side));
        }
        assert_eq!("Centre".parse::<Side>(), Ok(Side::Center));
        assert!("diagonal".parse::<Side>().is_err());
    }

    // ── Candidate evaluator ──────────────────────────────────────────────

    fn t(side: Side, acceptable: bool) -> Trial {
        Trial {
            side,
            top: 0.0,
            left: 0.0,
            acceptable,
        }
    }

    #[test]
    fn select_prefers_first_acceptable() {
        let picked = select([t(Side::Top, true), t(Side::Bottom, true)]).unwrap();
        assert_eq!(picked.side, Side::Top);
    }

    #[test]
    fn select_falls_through_to_opposite() {
        let picked = select([t(Side::Top, false), t(Side::Bottom, true)]).unwrap();
        assert_eq!(picked.side, Side::Bottom);
    }

    #[test]
    fn select_uses_last_when_none_acceptable() {
        let picked = select([t(Side::Left, false), t(Side::Right, false)]).unwrap();
        assert_eq!(picked.side, Side::Right);
        assert!(!picked.acceptable);
    }

    #[test]
    fn select_empty_is_none() {
        assert!(select(std::iter::empty::<Trial>()).is_none());
    }

    #[test]
    fn select_stops_pulling_after_winner() {
        let mut pulled = 0;
        let trials = [t(Side::Top, true), t(Side::Bottom, true)]
            .into_iter()
            .inspect(|_| pulled += 1);
        let _ = select(trials);
        assert_eq!(pulled, 1);
    }

    // ── Placement ────────────────────────────────────────────────────────

    #[test]
    fn bottom_reference_case() {
        let placed = place(anchor(100.0, 100.0, 50.0, 50.0), TOOLTIP, Side::Bottom, VIEWPORT);
        assert_eq!(placed.tooltip_top, 166.0);
        assert_eq!(placed.tooltip_left, 25.0);
        assert_eq!(placed.side, Side::Bottom);
        assert!(placed.clear_of_anchor);
        let arrow = placed.arrow.expect("arrow");
        assert_eq!(arrow.edge, Side::Top);
        assert_eq!(arrow.offset, 100.0);
    }

    #[test]
    fn left_edge_is_clamped_to_margin() {
        let placed = place(anchor(100.0, 0.0, 20.0, 20.0), TOOLTIP, Side::Bottom, VIEWPORT);
        assert_eq!(placed.tooltip_left, DEFAULT_MARGIN);
        // Anchor centre is at x=10, arrow must stay one arrow-width inside.
        assert_eq!(placed.arrow.unwrap().offset, DEFAULT_ARROW_SIZE);
    }

    #[test]
    fn top_flips_to_bottom_near_viewport_top() {
        let placed = place(anchor(20.0, 300.0, 50.0, 40.0), TOOLTIP, Side::Top, VIEWPORT);
        assert_eq!(placed.side, Side::Bottom);
        assert_eq!(placed.tooltip_top, 76.0);
        assert_eq!(placed.arrow.unwrap().edge, Side::Top);
    }

    #[test]
    fn bottom_flips_to_top_near_viewport_bottom() {
        let placed = place(anchor(540.0, 300.0, 50.0, 40.0), TOOLTIP, Side::Bottom, VIEWPORT);
        assert_eq!(placed.side, Side::Top);
        assert_eq!(placed.tooltip_top, 540.0 - 16.0 - 100.0);
    }

    #[test]
    fn right_flips_to_left_near_viewport_right() {
        let placed = place(anchor(200.0, 700.0, 60.0, 40.0), TOOLTIP, Side::Right, VIEWPORT);
        assert_eq!(placed.side, Side::Left);
        assert_eq!(placed.tooltip_left, 700.0 - 16.0 - 200.0);
        assert_eq!(placed.tooltip_top, 170.0);
        let arrow = placed.arrow.unwrap();
        assert_eq!(arrow.edge, Side::Right);
        assert_eq!(arrow.offset, 50.0);
    }

    #[test]
    fn left_preferred_fits() {
        let placed = place(anchor(200.0, 400.0, 60.0, 40.0), TOOLTIP, Side::Left, VIEWPORT);
        assert_eq!(placed.side, Side::Left);
        assert_eq!(placed.tooltip_left, 184.0);
    }

    #[test]
    fn neither_side_fits_uses_last_trial() {
        // Anchor covers nearly the whole viewport height.
        let placed = place(anchor(10.0, 300.0, 50.0, 580.0), TOOLTIP, Side::Bottom, VIEWPORT);
        assert_eq!(placed.side, Side::Top);
        assert!(!placed.clear_of_anchor);
        assert_eq!(placed.tooltip_top, DEFAULT_MARGIN);
    }

    #[test]
    fn center_side_ignores_anchor() {
        let placed = place(anchor(100.0, 100.0, 50.0, 50.0), TOOLTIP, Side::Center, VIEWPORT);
        assert_eq!(placed.side, Side::Center);
        assert_eq!(placed.tooltip_top, 250.0);
        assert_eq!(placed.tooltip_left, 300.0);
        assert!(placed.arrow.is_none());
    }

    #[test]
    fn missing_anchor_centers() {
        let placed = place(None, TOOLTIP, Side::Bottom, VIEWPORT);
        assert_eq!(placed.side, Side::Center);
        assert!(placed.arrow.is_none());
    }

    #[test]
    fn oversized_tooltip_collapses_to_margin() {
        let huge = Size::new(2000.0, 1000.0);
        let placed = place(anchor(100.0, 100.0, 50.0, 50.0), huge, Side::Bottom, VIEWPORT);
        assert_eq!(placed.tooltip_left, DEFAULT_MARGIN);
        assert_eq!(placed.tooltip_top, DEFAULT_MARGIN);

        let centered = place(None, huge, Side::Center, VIEWPORT);
        assert_eq!(centered.tooltip_left, DEFAULT_MARGIN);
        assert_eq!(centered.tooltip_top, DEFAULT_MARGIN);
    }

    #[test]
    fn tiny_tooltip_arrow_sits_at_midpoint() {
        let tiny = Size::new(10.0, 10.0);
        let placed = place(anchor(100.0, 100.0, 50.0, 50.0), tiny, Side::Bottom, VIEWPORT);
        assert_eq!(placed.arrow.unwrap().offset, 5.0);
    }

    #[test]
    fn custom_gap_is_respected() {
        let config = PlacementConfig::default().gap(4.0);
        let placed = place_with(
            &config,
            anchor(100.0, 100.0, 50.0, 50.0),
            TOOLTIP,
            Side::Bottom,
            VIEWPORT,
        );
        assert_eq!(placed.tooltip_top, 154.0);
    }

    #[test]
    fn clamp_axis_nan_pins_to_margin() {
        assert_eq!(clamp_axis(f64::NAN, 600.0, 100.0, 16.0), 16.0);
    }

    #[test]
    fn config_validation() {
        assert!(PlacementConfig::default().validate().is_empty());
        let bad = PlacementConfig::default().gap(-1.0).margin(f64::INFINITY);
        assert_eq!(bad.validate().len(), 2);
    }

    #[test]
    fn placement_rect_uses_tooltip_size() {
        let placed = place(anchor(100.0, 100.0, 50.0, 50.0), TOOLTIP, Side::Bottom, VIEWPORT);
        assert_eq!(placed.rect(TOOLTIP), Rect::new(166.0, 25.0, 200.0, 100.0));
    }
}
