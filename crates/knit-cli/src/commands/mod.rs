//! Command implementations.

mod build;
mod plan;
pub mod utils;

pub use build::execute as build_execute;
pub use plan::execute as plan_execute;

use indexmap::IndexMap;
use knit_config::{BuildSettings, Project, SettingsOverrides};
use knit_matrix::{BuildMatrix, MatrixOptions, build_matrix};
use std::path::Path;

use crate::error::{Result, ResultExt};

/// Load the project and settings at `root` and derive its matrix.
///
/// Shared by `build` and `plan` so both see the same tasks.
pub(crate) async fn load_matrix(
    root: &Path,
    overrides: &SettingsOverrides,
) -> Result<(Project, BuildSettings, BuildMatrix)> {
    let root = utils::resolve_path(root, &utils::get_cwd()?);
    let project = Project::load(&root)?;
    let settings = BuildSettings::load(&project.root, overrides)
        .with_hint(format!("Check {} and KNIT_* variables", knit_config::SETTINGS_FILE))?;
    let matrix = build_matrix(&project, &MatrixOptions::from(&settings)).await?;
    Ok((project, settings, matrix))
}

pub(crate) fn env_overrides(pairs: &[(String, String)]) -> IndexMap<String, String> {
    pairs.iter().cloned().collect()
}
