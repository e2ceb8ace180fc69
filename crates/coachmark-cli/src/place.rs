use std::io::Write;

use clap::Args;
use coachmark_core::geometry::{Rect, Size};
use coachmark_layout::placement::{self, Placement, PlacementConfig};
use coachmark_layout::{DEFAULT_ARROW_SIZE, DEFAULT_GAP, DEFAULT_MARGIN, Side};
use serde::Serialize;

use crate::cli::{parse_rect, parse_size};
use crate::error::{CliError, Result};

#[derive(Debug, Clone, Args)]
pub struct PlaceArgs {
    /// Anchor bounds as TOP,LEFT,WIDTH,HEIGHT. Omit to centre.
    #[arg(long, value_parser = parse_rect)]
    pub anchor: Option<Rect>,

    /// Tooltip size as WIDTH,HEIGHT.
    #[arg(long, value_parser = parse_size, default_value = "320,160")]
    pub tooltip: Size,

    /// Preferred side (top, bottom, left, right, center).
    #[arg(long, default_value = "bottom")]
    pub side: Side,

    /// Viewport size as WIDTH,HEIGHT.
    #[arg(long, value_parser = parse_size, default_value = "1280,800")]
    pub viewport: Size,

    #[arg(long, default_value_t = DEFAULT_GAP)]
    pub gap: f64,

    #[arg(long, default_value_t = DEFAULT_MARGIN)]
    pub margin: f64,

    #[arg(long = "arrow-size", default_value_t = DEFAULT_ARROW_SIZE)]
    pub arrow_size: f64,
}

#[derive(Debug, Serialize)]
pub struct PlaceReport {
    pub placement: Placement,
    /// Tooltip bounds at the computed position.
    pub tooltip: Rect,
}

pub fn compute_placement(args: &PlaceArgs) -> Result<PlaceReport> {
    let config = PlacementConfig::default()
        .gap(args.gap)
        .margin(args.margin)
        .arrow_size(args.arrow_size);
    let errors = config.validate();
    if !errors.is_empty() {
        return Err(CliError::invalid(errors.join("; ")));
    }

    let placement = placement::place_with(&config, args.anchor, args.tooltip, args.side, args.viewport);
    tracing::debug!(
        side = %placement.side,
        top = placement.tooltip_top,
        left = placement.tooltip_left,
        clear = placement.clear_of_anchor,
        "Computed placement"
    );
    Ok(PlaceReport {
        placement,
        tooltip: placement.rect(args.tooltip),
    })
}

pub fn run_place(args: &PlaceArgs, out: &mut impl Write) -> Result<()> {
    let report = compute_placement(args)?;
    serde_json::to_writer(&mut *out, &report)?;
    writeln!(out)?;
    Ok(())
}
