//! Running a single build task.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use knit_matrix::{BuildTask, ModuleFormat, Platform, ResolutionPolicy};
use rolldown::{
    BundlerBuilder as RolldownBundlerBuilder, BundlerOptions, InputItem, OutputFormat,
    RawMinifyOptions, SourceMapType,
};
use rolldown_common::{BundlerTransformOptions, Either};
use rolldown_plugin::__inner::SharedPluginable;
use tracing::{error, info, warn};

use crate::diagnostics::{self, Diagnostic, Severity, TaskOutcome};
use crate::output;
use crate::plugin::KnitPlugin;
use crate::{Error, Result};

/// Rolldown options for one task.
///
/// Source maps are generated hidden; the writer attaches them to the task's
/// own output file name. Environment substitutions go through Rolldown's
/// `define`, which only replaces whole expressions and never touches string
/// contents.
pub fn bundler_options(task: &BuildTask, cwd: &Path) -> BundlerOptions {
    BundlerOptions {
        input: Some(vec![InputItem {
            name: Some(task.entry_name.clone()),
            import: task.entry.to_string_lossy().into_owned(),
        }]),
        cwd: Some(cwd.to_path_buf()),
        format: Some(match task.format {
            ModuleFormat::Esm => OutputFormat::Esm,
            ModuleFormat::Cjs => OutputFormat::Cjs,
        }),
        platform: Some(match task.platform {
            Platform::Node => rolldown::Platform::Node,
            Platform::Browser => rolldown::Platform::Browser,
            Platform::Neutral => rolldown::Platform::Neutral,
        }),
        sourcemap: task.sourcemap.then_some(SourceMapType::Hidden),
        minify: task.minify.then(|| RawMinifyOptions::from(true)),
        define: (!task.define.is_empty()).then(|| task.define.iter().cloned().collect()),
        transform: Some(BundlerTransformOptions {
            target: Some(Either::Left(task.target.clone())),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Bundle one task and write its output. Returns the non-fatal warnings.
async fn bundle(
    task: Arc<BuildTask>,
    policy: Arc<ResolutionPolicy>,
    cwd: PathBuf,
) -> Result<Vec<Diagnostic>> {
    let plugin = KnitPlugin::new(Arc::clone(&task), policy);
    let copies = plugin.declaration_copies();
    let plugins: Vec<SharedPluginable> = vec![Arc::new(plugin)];

    let (warnings, files) = {
        let mut bundler = RolldownBundlerBuilder::default()
            .with_options(bundler_options(&task, &cwd))
            .with_plugins(plugins)
            .build()
            .map_err(|e| Error::from_rolldown_batch(&e, &cwd))?;

        let bundle = bundler
            .generate()
            .await
            .map_err(|e| Error::from_rolldown_batch(&e, &cwd))?;

        let warnings = diagnostics::extract_from_rolldown(&bundle.warnings, &cwd);
        (warnings, output::plan_task_output(&task, &bundle)?)
    };

    let copies = std::mem::take(&mut *copies.lock());
    let out_dir = task.out_dir.clone();
    tokio::task::spawn_blocking(move || {
        let mut files = files;
        output::plan_declaration_copies(&out_dir, &copies, &mut files)?;
        output::write_files_atomic(&files)
    })
    .await
    .map_err(|e| Error::TaskPanicked(e.to_string()))??;

    Ok(warnings)
}

/// Run one task to completion. Never fails: every problem ends up in the
/// outcome's diagnostics.
pub async fn run_task(
    task: Arc<BuildTask>,
    policy: Arc<ResolutionPolicy>,
    cwd: PathBuf,
) -> TaskOutcome {
    let label = task.label();
    let started = Instant::now();
    info!("{}", label);

    let diagnostics = match bundle(Arc::clone(&task), policy, cwd).await {
        Ok(warnings) => warnings,
        Err(Error::Bundler(diagnostics)) if !diagnostics.is_empty() => diagnostics,
        Err(e) => vec![Diagnostic::error(e.to_string())],
    };

    for diagnostic in &diagnostics {
        match diagnostic.severity {
            Severity::Error => error!(task = %label, "{}", diagnostic),
            Severity::Warning => warn!(task = %label, "{}", diagnostic),
        }
    }

    TaskOutcome {
        label,
        output_file: task.output_file.clone(),
        diagnostics,
        duration: started.elapsed(),
    }
}
