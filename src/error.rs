//! Errors that stop a run before any network traffic happens.
//!
//! Everything past setup is fail-soft and travels as `Box<dyn Error>` inside
//! the individual steps; only the conditions below end the process.

use thiserror::Error;

/// Largest accepted `lookback_days`, roughly a century.
pub const MAX_LOOKBACK_DAYS: i64 = 36_500;

#[derive(Error, Debug)]
pub enum SetupError {
    #[error("{name} is missing; set it in the environment or pass --{flag}")]
    MissingSecret {
        name: &'static str,
        flag: &'static str,
    },

    #[error("Could not read config file {path}: {source}")]
    ConfigRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not parse config file {path}: {source}")]
    ConfigParse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Prompt template must contain the {{news}} placeholder")]
    PromptWithoutPlaceholder,

    #[error("UTC offset of {0} minutes is out of range")]
    InvalidOffset(i32),

    #[error("Lookback of {0} days is out of range (0..={max})", max = MAX_LOOKBACK_DAYS)]
    InvalidLookback(i64),
}

impl SetupError {
    /// Secrets are checked first; callers use this to report them distinctly.
    pub fn is_missing_secret(&self) -> bool {
        matches!(self, SetupError::MissingSecret { .. })
    }
}
