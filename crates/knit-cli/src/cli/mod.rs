//! Command-line interface definition.
//!
//! - `knit build` - compile every entry point the manifest declares
//! - `knit plan` - print the derived build matrix

mod commands;
mod validation;

use clap::Parser;

pub use commands::{BuildArgs, Command, PlanArgs};
pub use validation::parse_key_val;

#[derive(Parser, Debug)]
#[command(
    name = "knit",
    version,
    about = "Build every entry point a package.json declares",
    long_about = "knit reads the main, module, types, exports and bin fields of package.json,\n\
                  maps each output back to its source file and compiles one bundle per output.\n\
                  Imports between entries are rewritten to point at the sibling output."
)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only print errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}
