#![forbid(unsafe_code)]

//! `coachmark` command-line tool.
//!
//! `place` runs the placement solver on explicit geometry. `simulate` drives
//! a [`TourController`](coachmark_runtime::TourController) against a static
//! layout with a scripted input sequence and prints one JSON line per input.

pub mod cli;
pub mod error;
pub mod place;
pub mod script;
pub mod simulate;

pub use cli::{run, run_from_env};
pub use error::{CliError, Result};
