//! Shared helpers for command implementations.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{CliError, Result};

pub fn resolve_path(path: &Path, cwd: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    }
}

pub fn get_cwd() -> Result<PathBuf> {
    std::env::current_dir().map_err(|e| {
        CliError::Io(std::io::Error::new(
            e.kind(),
            format!("Failed to get current directory: {}", e),
        ))
    })
}

/// Remove everything inside `out_dir`, keeping the directory itself.
///
/// Refuses to touch an output directory that is the package root or
/// contains it.
pub fn clean_output_dir(root: &Path, out_dir: &Path) -> Result<()> {
    if !out_dir.exists() {
        return Ok(());
    }
    if !out_dir.is_dir() {
        return Err(CliError::InvalidArgument(format!(
            "Output path exists but is not a directory: {}",
            out_dir.display()
        )));
    }
    if root.canonicalize()?.starts_with(out_dir.canonicalize()?) {
        return Err(CliError::InvalidArgument(format!(
            "Refusing to clean {}: it contains the package root",
            out_dir.display()
        )));
    }

    for entry in fs::read_dir(out_dir)? {
        let path = entry?.path();
        if path.is_dir() {
            fs::remove_dir_all(&path)?;
        } else {
            fs::remove_file(&path)?;
        }
    }
    Ok(())
}
