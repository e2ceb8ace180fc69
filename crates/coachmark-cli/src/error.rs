use thiserror::Error;

use coachmark_runtime::{ConfigError, TourError};

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("tour error: {0}")]
    Tour(#[from] TourError),

    #[error("invalid argument: {message}")]
    InvalidArgument { message: String },

    #[error("script line {line}: {message}")]
    Script { line: usize, message: String },

    #[error("logging setup failed: {message}")]
    Logging { message: String },
}

impl CliError {
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::InvalidArgument { .. } | Self::Script { .. } => 2,
            _ => 1,
        }
    }

    #[must_use]
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn script(line: usize, message: impl Into<String>) -> Self {
        Self::Script {
            line,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::CliError;

    #[test]
    fn usage_errors_exit_with_two() {
        assert_eq!(CliError::invalid("bad").exit_code(), 2);
        assert_eq!(CliError::script(3, "unknown op").exit_code(), 2);
    }

    #[test]
    fn script_error_names_the_line() {
        let error = CliError::script(7, "unknown op `fly`");
        assert_eq!(error.to_string(), "script line 7: unknown op `fly`");
    }

    #[test]
    fn io_errors_exit_with_one() {
        let error = CliError::from(std::io::Error::other("disk"));
        assert_eq!(error.exit_code(), 1);
    }
}
