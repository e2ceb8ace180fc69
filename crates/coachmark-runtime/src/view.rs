#![forbid(unsafe_code)]

//! Render-ready snapshot of an open tour.
//!
//! Hosts draw the overlay from a [`TourView`] and nothing else: the dimmed
//! backdrop with an optional cut-out, the tooltip at its computed position,
//! the arrow, and the navigation controls.

use coachmark_core::geometry::{Rect, Size};
use coachmark_layout::placement::Placement;

use crate::step::Step;

/// One entry of the progress strip.
#[derive(Debug, Clone, PartialEq)]
pub struct TourProgressStep<'a> {
    pub index: usize,
    pub title: &'a str,
    pub is_current: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TourView<'a> {
    pub step_index: usize,
    pub step_count: usize,
    pub step: &'a Step,
    pub title: &'a str,
    pub content: &'a str,
    /// Progression requires acting on the target.
    pub interactive: bool,
    /// Next/back controls are disabled.
    pub navigation_locked: bool,
    pub is_first: bool,
    pub is_last: bool,
    /// Cut-out in the backdrop (anchor inflated by the highlight padding).
    /// `None` means a uniform dim.
    pub highlight: Option<Rect>,
    /// `None` while the target is still settling; the tooltip is hidden.
    pub placement: Option<Placement>,
    pub tooltip_size: Size,
    pub viewport: Size,
    pub steps: Vec<TourProgressStep<'a>>,
}

impl TourView<'_> {
    /// Whether the tooltip should be drawn.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.placement.is_some()
    }

    /// Tooltip bounds, once placed.
    #[must_use]
    pub fn tooltip_rect(&self) -> Option<Rect> {
        self.placement.map(|p| p.rect(self.tooltip_size))
    }

    /// One-based position, e.g. `"2 / 5"`.
    #[must_use]
    pub fn progress_label(&self) -> String {
        format!("{} / {}", self.step_index + 1, self.step_count)
    }

    /// Whether the "back" control is offered.
    #[must_use]
    pub fn can_go_back(&self) -> bool {
        !self.is_first && !self.navigation_locked
    }

    /// Whether the "next"/"finish" control is offered.
    #[must_use]
    pub fn can_go_next(&self) -> bool {
        !self.navigation_locked
    }
}

/// Window of progress entries around `current`, starting one step behind.
pub(crate) fn progress_window(
    steps: &[Step],
    current: usize,
    max_steps: usize,
) -> Vec<TourProgressStep<'_>> {
    let window = max_steps.max(1);
    let start = current
        .saturating_sub(1)
        .min(steps.len().saturating_sub(window))
        .max((current + 1).saturating_sub(window));
    let end = (start + window).min(steps.len());
    steps[start..end]
        .iter()
        .enumerate()
        .map(|(offset, step)| {
            let index = start + offset;
            TourProgressStep {
                index,
                title: step.title.as_str(),
                is_current: index == current,
            }
        })
        .collect()
}
