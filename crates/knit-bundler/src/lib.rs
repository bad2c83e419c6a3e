#![cfg_attr(docsrs, feature(doc_cfg))]

//! # knit-bundler
//!
//! Runs a [`BuildMatrix`](knit_matrix::BuildMatrix) through Rolldown.
//!
//! Every task is an isolated Rolldown build with a [`KnitPlugin`] installed.
//! The plugin consults the shared [`ResolutionPolicy`](knit_matrix::ResolutionPolicy)
//! so imports that belong to another task's output are externalized and
//! rewritten instead of being bundled twice. Tasks run concurrently; a failing
//! task never stops the others, and [`dispatch`] folds every outcome into a
//! [`BuildSummary`].
//!
//! ```no_run
//! use knit_bundler::{DispatchOptions, dispatch};
//! use knit_config::Project;
//! use knit_matrix::{MatrixOptions, build_matrix};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let project = Project::load(".")?;
//! let matrix = build_matrix(&project, &MatrixOptions::default()).await?;
//! let summary = dispatch(&matrix, &project.root, &DispatchOptions::default()).await;
//! std::process::exit(summary.exit_code().into());
//! # }
//! ```

use std::path::{Path, PathBuf};

use rolldown_error::BatchedBuildDiagnostic;

pub mod diagnostics;
pub mod dispatch;
pub mod output;
pub mod plugin;
pub mod runner;

// Logging utilities (optional, enabled with "logging" feature)
#[cfg(feature = "logging")]
#[cfg_attr(docsrs, doc(cfg(feature = "logging")))]
pub mod logging;

#[cfg(feature = "logging")]
#[cfg_attr(docsrs, doc(cfg(feature = "logging")))]
pub use logging::{LogLevel, init_logging};

pub use diagnostics::{BuildSummary, Diagnostic, Severity, TaskOutcome};
pub use dispatch::{DispatchOptions, dispatch};
pub use plugin::KnitPlugin;
pub use runner::{bundler_options, run_task};

/// Error types for knit-bundler operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Error from Rolldown bundler.
    #[error("Rolldown bundler error: {}", format_bundler_error(.0))]
    Bundler(Vec<Diagnostic>),

    /// Output path escapes the output directory.
    #[error("Invalid output path: {0}")]
    InvalidOutputPath(String),

    /// File write operation failed.
    #[error("Failed to write {}: {source}", path.display())]
    WriteFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A task panicked or was cancelled.
    #[error("Task failed unexpectedly: {0}")]
    TaskPanicked(String),
}

/// Result type alias for knit-bundler operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a bundler error from a Rolldown error batch. Locations are
    /// reported relative to `cwd`.
    pub fn from_rolldown_batch(batch: &BatchedBuildDiagnostic, cwd: &Path) -> Self {
        Error::Bundler(diagnostics::extract_from_rolldown(batch, cwd))
    }

    pub(crate) fn write_failure(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::WriteFailure {
            path: path.into(),
            source,
        }
    }
}

fn format_bundler_error(diagnostics: &[Diagnostic]) -> String {
    match diagnostics {
        [] => "Unknown bundler error".to_string(),
        [single] => single.to_string(),
        many => format!(
            "{} errors: {}",
            many.len(),
            many.iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; ")
        ),
    }
}

impl miette::Diagnostic for Error {
    fn code(&self) -> Option<Box<dyn std::fmt::Display + '_>> {
        Some(Box::new(match self {
            Error::Bundler(_) => "BUNDLER_ERROR",
            Error::InvalidOutputPath(_) => "INVALID_OUTPUT_PATH",
            Error::WriteFailure { .. } => "WRITE_FAILURE",
            Error::TaskPanicked(_) => "TASK_PANICKED",
        }))
    }

    fn severity(&self) -> Option<miette::Severity> {
        Some(miette::Severity::Error)
    }

    fn help(&self) -> Option<Box<dyn std::fmt::Display + '_>> {
        match self {
            Error::InvalidOutputPath(path) => Some(Box::new(format!(
                "The output path '{}' is invalid. \
                 Outputs must stay inside compilerOptions.outDir.",
                path
            ))),
            Error::WriteFailure { .. } => Some(Box::new(
                "Failed to write file. Check disk space and permissions.",
            )),
            Error::Bundler(diagnostics) if diagnostics.len() > 1 => Some(Box::new(
                "Multiple bundler errors occurred. See details below.",
            )),
            _ => None,
        }
    }
}
