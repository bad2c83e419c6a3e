//! Errors raised while deriving the build matrix.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, MatrixError>;

#[derive(Debug, Error)]
pub enum MatrixError {
    #[error(transparent)]
    Config(#[from] knit_config::ConfigError),

    #[error("invalid export pattern `{pattern}`: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("source expansion failed: {0}")]
    Expansion(String),
}

impl MatrixError {
    pub(crate) fn invalid_pattern(pattern: &str, reason: impl Into<String>) -> Self {
        Self::InvalidPattern {
            pattern: pattern.to_string(),
            reason: reason.into(),
        }
    }
}

/// A bare import names a package that `package.json` does not declare.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "`{specifier}` imports package `{package}`, which is not listed in dependencies, peerDependencies, optionalDependencies or devDependencies"
)]
pub struct UndeclaredDependencyError {
    pub package: String,
    pub specifier: String,
}
