//! Subcommands and their arguments.

use std::path::PathBuf;

use clap::{Args, Subcommand};

use super::validation::{parse_key_val, parse_parallelism};

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compile every entry point declared in package.json
    Build(BuildArgs),

    /// Print the derived build matrix without building
    Plan(PlanArgs),
}

#[derive(Args, Debug, Clone)]
pub struct BuildArgs {
    /// Package root containing package.json
    #[arg(value_name = "ROOT", default_value = ".")]
    pub root: PathBuf,

    /// Minify the output
    #[arg(short, long)]
    pub minify: bool,

    /// Inline `process.env.KEY` as the given value (repeatable)
    #[arg(short, long = "env", value_name = "KEY=VALUE", value_parser = parse_key_val)]
    pub env: Vec<(String, String)>,

    /// Maximum number of tasks built at once [default: min(cpus, 8)]
    #[arg(short = 'j', long, value_name = "N", value_parser = parse_parallelism)]
    pub max_parallel: Option<usize>,

    /// Empty the output directory before building
    #[arg(long)]
    pub clean: bool,
}

#[derive(Args, Debug, Clone)]
pub struct PlanArgs {
    /// Package root containing package.json
    #[arg(value_name = "ROOT", default_value = ".")]
    pub root: PathBuf,

    /// Print the matrix as JSON
    #[arg(long)]
    pub json: bool,

    /// Plan minified tasks
    #[arg(short, long)]
    pub minify: bool,

    /// Inline `process.env.KEY` as the given value (repeatable)
    #[arg(short, long = "env", value_name = "KEY=VALUE", value_parser = parse_key_val)]
    pub env: Vec<(String, String)>,
}
