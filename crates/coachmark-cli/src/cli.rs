use std::io::Write;

use clap::{Parser, Subcommand};
use coachmark_core::geometry::{Rect, Size};
use coachmark_core::logging::{self, LogFormat};

use crate::error::{CliError, Result};
use crate::place::{PlaceArgs, run_place};
use crate::simulate::{SimulateArgs, run_simulate};

#[derive(Debug, Parser)]
#[command(
    name = "coachmark",
    about = "Inspect tooltip placement and replay guided tours against a static layout",
    version
)]
pub struct Cli {
    /// Log output format on stderr (pretty or json).
    #[arg(long = "log-format", global = true, default_value = "pretty")]
    pub log_format: LogFormat,

    /// Default log filter when COACHMARK_LOG is unset.
    #[arg(long = "log-level", global = true, default_value = "warn")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Compute a tooltip placement and print it as JSON.
    Place(PlaceArgs),

    /// Run a scripted tour and print one JSON line per input.
    Simulate(SimulateArgs),
}

pub fn run_from_env() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.log_format, &cli.log_level).map_err(|e| CliError::Logging {
        message: e.to_string(),
    })?;
    run(cli)
}

pub fn run(cli: Cli) -> Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match cli.command {
        Commands::Place(args) => run_place(&args, &mut out),
        Commands::Simulate(args) => run_simulate(&args, &mut out),
    }?;
    out.flush()?;
    Ok(())
}

fn parse_numbers<const N: usize>(s: &str) -> std::result::Result<[f64; N], String> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    if parts.len() != N {
        return Err(format!("expected {N} comma-separated numbers, got `{s}`"));
    }
    let mut values = [0.0; N];
    for (slot, part) in values.iter_mut().zip(parts) {
        let value: f64 = part
            .parse()
            .map_err(|_| format!("not a number: `{part}`"))?;
        if !value.is_finite() {
            return Err(format!("not a finite number: `{part}`"));
        }
        *slot = value;
    }
    Ok(values)
}

/// Parse `W,H`.
pub fn parse_size(s: &str) -> std::result::Result<Size, String> {
    let [width, height] = parse_numbers::<2>(s)?;
    Ok(Size::new(width, height))
}

/// Parse `TOP,LEFT,WIDTH,HEIGHT`.
pub fn parse_rect(s: &str) -> std::result::Result<Rect, String> {
    let [top, left, width, height] = parse_numbers::<4>(s)?;
    Ok(Rect::new(top, left, width, height))
}
