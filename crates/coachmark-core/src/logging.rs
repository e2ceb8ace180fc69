#![forbid(unsafe_code)]

//! Structured logging glue.
//!
//! Library code logs through the `tracing` macros re-exported here. Binaries
//! and harnesses opt into a subscriber with the `tracing-json` feature:
//!
//! ```ignore
//! coachmark_core::logging::init(LogFormat::Json, "info")?;
//! ```
//!
//! The filter is read from `COACHMARK_LOG` (same syntax as `RUST_LOG`) and
//! falls back to the supplied default directive. Output goes to stderr so it
//! never interleaves with machine-readable stdout.

pub use tracing::{
    debug, debug_span, error, error_span, info, info_span, trace, trace_span, warn, warn_span,
};

/// Environment variable holding the log filter directives.
pub const LOG_ENV: &str = "COACHMARK_LOG";

/// Output format for [`init`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable compact lines.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown log format: {other}")),
        }
    }
}

/// Install a global subscriber.
///
/// Fails if a global subscriber is already installed.
#[cfg(feature = "tracing-json")]
pub fn init(
    format: LogFormat,
    default_directive: &str,
) -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_new(default_directive))?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true);

    match format {
        LogFormat::Pretty => builder.compact().try_init(),
        LogFormat::Json => builder.json().try_init(),
    }
}
