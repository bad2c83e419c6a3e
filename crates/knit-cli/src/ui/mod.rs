//! Terminal output: status lines, durations and a spinner.
//!
//! Everything here writes to stderr; stdout is reserved for `knit plan`.

mod format;
mod messages;
mod spinner;

pub use format::{format_duration, print_build_summary};
pub use messages::{error, success, warning};
pub use spinner::Spinner;

/// Whether colors should be used on stderr.
///
/// `NO_COLOR` wins over `FORCE_COLOR`; otherwise colors follow the terminal.
pub fn should_use_color() -> bool {
    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }
    if std::env::var_os("FORCE_COLOR").is_some() {
        return true;
    }
    console::user_attended_stderr()
}

/// Apply color detection to `console` styling on stderr. `--no-color`
/// always disables it.
pub fn init_colors(no_color: bool) {
    console::set_colors_enabled_stderr(!no_color && should_use_color());
}
