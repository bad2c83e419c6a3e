//! Logging setup for the knit CLI.
//!
//! Verbosity comes from the global flags, falling back to `RUST_LOG` and then
//! to `info` for the knit crates. Logs go to stderr so that `knit plan --json`
//! keeps stdout clean.
//!
//! ```rust,no_run
//! use knit_cli::logger::init_logger;
//!
//! init_logger(false, false, false);
//! tracing::info!("src/index.ts -> dist/index.mjs");
//! ```

use knit_bundler::{LogLevel, init_logging};

/// Install the global subscriber. Call once, before any logging.
///
/// `verbose` wins over `quiet`; clap already rejects passing both.
pub fn init_logger(verbose: bool, quiet: bool, no_color: bool) {
    init_logging(
        LogLevel::from_flags(verbose, quiet),
        !no_color && crate::ui::should_use_color(),
    );
}
