#![forbid(unsafe_code)]

//! Placement solver for tour tooltips.
//!
//! Given an anchor rectangle, a tooltip size, a preferred side, and the
//! viewport, [`placement::place`] returns where the tooltip goes and where its
//! arrow points. The solver is pure: it never touches the DOM or any clock, so
//! hosts call it on every render pass and every resize.

pub mod placement;

pub use placement::{
    Arrow, DEFAULT_ARROW_SIZE, DEFAULT_GAP, DEFAULT_MARGIN, Placement, PlacementConfig, Side,
    Trial, candidates, clamp_axis, place, place_with, select,
};
