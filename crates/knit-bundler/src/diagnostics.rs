//! Diagnostic extraction and aggregation.
//!
//! Rolldown reports problems as batches of [`BuildDiagnostic`]. We flatten
//! them into located [`Diagnostic`] values, drop the known-benign ones, and fold
//! every task's [`TaskOutcome`] into a single [`BuildSummary`] that decides the
//! exit status.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use rolldown_error::{BuildDiagnostic, DiagnosticOptions};
use serde::Serialize;

/// Messages that are noise for library builds: dynamic `require`/`import`
/// calls the bundler cannot follow statically.
const BENIGN_PATTERNS: &[&str] = &[
    "will not be bundled",
    "is not a string literal",
    "Indirect calls to \"require\"",
    "dynamic import cannot be analyzed",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

impl From<rolldown_error::Severity> for Severity {
    fn from(severity: rolldown_error::Severity) -> Self {
        match severity {
            rolldown_error::Severity::Error => Severity::Error,
            rolldown_error::Severity::Warning => Severity::Warning,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub file: Option<String>,
    pub line: Option<u32>,
    /// 1-based.
    pub column: Option<u32>,
    pub message: String,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            file: None,
            line: None,
            column: None,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// Convert one Rolldown diagnostic. File paths are made relative to
    /// `options.cwd`.
    pub fn from_rolldown(diagnostic: &BuildDiagnostic, options: &DiagnosticOptions) -> Self {
        let mut converted = Self {
            severity: diagnostic.severity().into(),
            ..Self::error(diagnostic.to_string())
        };

        match diagnostic.to_diagnostic_with(options).get_primary_location() {
            Some((file, line, column, _)) => {
                converted.file = Some(file);
                converted.line = u32::try_from(line).ok();
                converted.column = u32::try_from(column + 1).ok();
            }
            None => converted.file = diagnostic.id().map(|id| options.stabilize_path(id)),
        }
        converted
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.file, self.line, self.column) {
            (Some(file), Some(line), Some(column)) => {
                write!(f, "{file}:{line}:{column}: {}", self.message)
            }
            (Some(file), _, _) => write!(f, "{file}: {}", self.message),
            _ => f.write_str(&self.message),
        }
    }
}

pub fn is_benign(message: &str) -> bool {
    BENIGN_PATTERNS.iter().any(|pattern| message.contains(pattern))
}

/// Flatten a batch of Rolldown errors or warnings into diagnostics, dropping
/// benign ones.
pub fn extract_from_rolldown(batch: &[BuildDiagnostic], cwd: &Path) -> Vec<Diagnostic> {
    let options = DiagnosticOptions {
        cwd: cwd.to_path_buf(),
    };
    batch
        .iter()
        .map(|diagnostic| Diagnostic::from_rolldown(diagnostic, &options))
        .filter(|d| !is_benign(&d.message))
        .collect()
}

/// Result of running one build task.
#[derive(Debug, Clone, Serialize)]
pub struct TaskOutcome {
    pub label: String,
    pub output_file: PathBuf,
    pub diagnostics: Vec<Diagnostic>,
    pub duration: Duration,
}

impl TaskOutcome {
    pub fn failed(
        label: impl Into<String>,
        output_file: PathBuf,
        message: impl Into<String>,
    ) -> Self {
        Self {
            label: label.into(),
            output_file,
            diagnostics: vec![Diagnostic::error(message)],
            duration: Duration::ZERO,
        }
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.is_error()).count()
    }

    pub fn warning_count(&self) -> usize {
        self.diagnostics.len() - self.error_count()
    }

    pub fn is_success(&self) -> bool {
        self.error_count() == 0
    }
}

/// Aggregate of every task's outcome.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BuildSummary {
    pub outcomes: Vec<TaskOutcome>,
    pub errors: usize,
    pub warnings: usize,
}

impl BuildSummary {
    pub fn push(&mut self, outcome: TaskOutcome) {
        self.errors += outcome.error_count();
        self.warnings += outcome.warning_count();
        self.outcomes.push(outcome);
    }

    pub fn task_count(&self) -> usize {
        self.outcomes.len()
    }

    pub fn failed_tasks(&self) -> impl Iterator<Item = &TaskOutcome> {
        self.outcomes.iter().filter(|o| !o.is_success())
    }

    pub fn is_success(&self) -> bool {
        self.errors == 0
    }

    /// 0 on success, otherwise the error count clamped to 255.
    pub fn exit_code(&self) -> u8 {
        self.errors.min(u8::MAX as usize) as u8
    }
}

impl FromIterator<TaskOutcome> for BuildSummary {
    fn from_iter<I: IntoIterator<Item = TaskOutcome>>(iter: I) -> Self {
        iter.into_iter().fold(Self::default(), |mut summary, outcome| {
            summary.push(outcome);
            summary
        })
    }
}
