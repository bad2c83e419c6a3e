//! knit command-line interface.
//!
//! `knit build` derives the build matrix of a package from its `package.json`
//! and compiles every task; `knit plan` prints the matrix without building.

pub mod cli;
pub mod commands;
pub mod error;
pub mod logger;
pub mod ui;

pub use error::{CliError, Result, ResultExt};
