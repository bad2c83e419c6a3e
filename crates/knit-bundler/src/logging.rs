//! Subscriber setup for binaries built on knit.
//!
//! Only available with the `logging` feature. Library users get plain
//! `tracing` events and install their own subscriber.

use std::sync::Once;

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

static INIT: Once = Once::new();

/// Crates whose events follow the chosen level.
const KNIT_CRATES: &[&str] = &["knit_cli", "knit_bundler", "knit_matrix", "knit_config"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogLevel {
    /// Errors only, from every crate.
    Quiet,
    /// Per-task `source -> target` lines. `RUST_LOG` takes precedence.
    #[default]
    Info,
    /// Expansion and resolution decisions.
    Debug,
}

impl LogLevel {
    /// Level for the `--verbose`/`--quiet` flags. `verbose` wins.
    pub fn from_flags(verbose: bool, quiet: bool) -> Self {
        match (verbose, quiet) {
            (true, _) => LogLevel::Debug,
            (false, true) => LogLevel::Quiet,
            (false, false) => LogLevel::Info,
        }
    }

    fn filter(self) -> EnvFilter {
        match self {
            LogLevel::Quiet => EnvFilter::new("error"),
            LogLevel::Info => EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(crate_directives("info"))),
            LogLevel::Debug => EnvFilter::new(crate_directives("debug")),
        }
    }
}

fn crate_directives(level: &str) -> String {
    KNIT_CRATES
        .iter()
        .map(|krate| format!("{krate}={level}"))
        .collect::<Vec<_>>()
        .join(",")
}

/// Install a global stderr subscriber at `level`. Only the first call in a
/// process has an effect.
///
/// ```rust,no_run
/// use knit_bundler::logging::{LogLevel, init_logging};
///
/// init_logging(LogLevel::from_flags(false, false), true);
/// ```
pub fn init_logging(level: LogLevel, ansi: bool) {
    INIT.call_once(|| {
        tracing_subscriber::registry()
            .with(level.filter())
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(false)
                    .with_ansi(ansi)
                    .without_time()
                    .compact(),
            )
            .init();
    });
}
