//! Error handling for the knit CLI.
//!
//! Library errors convert into [`CliError`] with `?`; `main` turns the final
//! error into a [`miette::Report`] with [`cli_error_to_miette`].

use knit_config::ConfigError;
use knit_matrix::MatrixError;
use miette::Report;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Could not derive the build matrix: {0}")]
    Matrix(#[from] MatrixError),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Custom(String),
}

/// Context helpers for results that convert into [`CliError`].
pub trait ResultExt<T> {
    /// Append a `Hint:` line to the error message.
    fn with_hint(self, hint: impl std::fmt::Display) -> Result<T>;
}

impl<T, E: Into<CliError>> ResultExt<T> for std::result::Result<T, E> {
    fn with_hint(self, hint: impl std::fmt::Display) -> Result<T> {
        self.map_err(|e| {
            let err: CliError = e.into();
            CliError::Custom(format!("{}\n\nHint: {}", err, hint))
        })
    }
}

/// Convert a [`CliError`] into a report for `main`.
pub fn cli_error_to_miette(err: CliError) -> Report {
    match err {
        CliError::Config(ConfigError::ManifestNotFound(dir)) => miette::miette!(
            help = "Run knit from a package root or pass the root as an argument",
            "package.json not found in {}",
            dir.display()
        ),
        CliError::Matrix(MatrixError::InvalidPattern { pattern, reason }) => miette::miette!(
            help = "Export patterns may contain at most one `*`",
            "Invalid export pattern `{}`: {}",
            pattern,
            reason
        ),
        other => miette::miette!("{}", other),
    }
}
