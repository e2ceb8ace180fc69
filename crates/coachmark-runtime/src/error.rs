#![forbid(unsafe_code)]

//! Error taxonomy for the tour runtime.
//!
//! None of these are fatal to the host. Transition APIs report them so hosts
//! can log or ignore them; the tour itself degrades by skipping or closing.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, TourError>;

#[derive(Debug, Error)]
pub enum TourError {
    /// The step's selector matched nothing. Recovered by skipping the step.
    #[error("tour target not found for step {step}: {selector:?}")]
    TargetNotFound { step: usize, selector: String },

    /// `open` was called with zero steps. Nothing is shown.
    #[error("tour has no steps")]
    EmptyTour,

    /// `open` was called while a tour is already showing.
    #[error("tour is already open at step {step}")]
    AlreadyOpen { step: usize },

    /// A deferred callback arrived for a step activation that is no longer
    /// current. Expected under normal operation and discarded.
    #[error("stale callback for step {step} (generation {generation})")]
    StaleCallback { step: usize, generation: u64 },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl TourError {
    /// Whether the error is routine (expected during normal operation).
    #[must_use]
    pub fn is_benign(&self) -> bool {
        matches!(
            self,
            Self::StaleCallback { .. } | Self::EmptyTour | Self::AlreadyOpen { .. }
        )
    }
}

/// Errors that can occur when loading tour configuration or step files.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{format} parse error: {message}")]
    Parse {
        format: &'static str,
        message: String,
    },

    #[error("validation errors: {}", .0.join("; "))]
    Validation(Vec<String>),
}

impl ConfigError {
    #[must_use]
    pub fn parse(format: &'static str, error: impl std::fmt::Display) -> Self {
        Self::Parse {
            format,
            message: error.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        let err = TourError::TargetNotFound {
            step: 2,
            selector: "#missing".into(),
        };
        assert_eq!(
            err.to_string(),
            "tour target not found for step 2: \"#missing\""
        );
        assert_eq!(TourError::EmptyTour.to_string(), "tour has no steps");
    }

    #[test]
    fn validation_joins_messages() {
        let err = ConfigError::Validation(vec!["a".into(), "b".into()]);
        assert_eq!(err.to_string(), "validation errors: a; b");
    }

    #[test]
    fn config_error_converts_into_tour_error() {
        let err: TourError = ConfigError::parse("TOML", "bad key").into();
        assert_eq!(err.to_string(), "TOML parse error: bad key");
        assert!(!err.is_benign());
    }

    #[test]
    fn benign_classification() {
        assert!(
            TourError::StaleCallback {
                step: 0,
                generation: 1
            }
            .is_benign()
        );
        assert!(TourError::EmptyTour.is_benign());
        assert!(
            !TourError::TargetNotFound {
                step: 0,
                selector: String::new()
            }
            .is_benign()
        );
    }
}
