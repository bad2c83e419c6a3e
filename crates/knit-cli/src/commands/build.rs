//! `knit build`.

use std::process::ExitCode;
use std::time::Instant;

use knit_bundler::{DispatchOptions, dispatch};
use knit_config::SettingsOverrides;

use super::{env_overrides, load_matrix, utils};
use crate::cli::BuildArgs;
use crate::error::Result;
use crate::ui;

pub async fn execute(args: BuildArgs) -> Result<ExitCode> {
    let started = Instant::now();
    let overrides = SettingsOverrides {
        minify: args.minify.then_some(true),
        env: env_overrides(&args.env),
        max_parallel: args.max_parallel,
        clean: args.clean.then_some(true),
    };

    let spinner = ui::Spinner::new("Reading package.json...");
    let loaded = load_matrix(&args.root, &overrides).await;
    spinner.clear();
    let (project, settings, matrix) = loaded?;

    if matrix.is_empty() && matrix.declarations.is_empty() {
        ui::warning("package.json declares no entry points with a matching source");
        return Ok(ExitCode::SUCCESS);
    }

    if settings.clean {
        let out_dir = project.out_dir();
        utils::clean_output_dir(&project.root, &out_dir)?;
        tracing::debug!(out_dir = %out_dir.display(), "cleaned output directory");
    }

    let options = DispatchOptions {
        max_parallel: settings.max_parallel,
    };
    let summary = dispatch(&matrix, &project.root, &options).await;

    ui::print_build_summary(&summary, started.elapsed());
    Ok(ExitCode::from(summary.exit_code()))
}
