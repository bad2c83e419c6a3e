//! Shared fixtures for knit-matrix tests.

#![allow(dead_code)]

use std::fs;
use std::path::Path;

use knit_config::Project;
use knit_matrix::{BuildMatrix, BuildTask, MatrixOptions, build_matrix};
use tempfile::TempDir;

/// Write `files` (path, contents) under a fresh temp dir.
pub fn create_package(files: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().expect("temp dir");
    for (path, contents) in files {
        let full = dir.path().join(path);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).expect("create parent");
        }
        fs::write(&full, contents).unwrap_or_else(|e| panic!("write {path}: {e}"));
    }
    dir
}

pub fn load(dir: &TempDir) -> Project {
    Project::load(dir.path()).expect("load project")
}

pub async fn matrix_for(dir: &TempDir) -> BuildMatrix {
    build_matrix(&load(dir), &MatrixOptions::default())
        .await
        .expect("build matrix")
}

/// Output paths relative to the package root, `/`-separated.
pub fn outputs(dir: &TempDir, matrix: &BuildMatrix) -> Vec<String> {
    matrix
        .tasks
        .iter()
        .map(|task| relative(dir.path(), &task.output_file))
        .collect()
}

pub fn relative(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .expect("path under root")
        .to_string_lossy()
        .replace('\\', "/")
}

pub fn task_for<'m>(dir: &TempDir, matrix: &'m BuildMatrix, output: &str) -> &'m BuildTask {
    matrix
        .tasks
        .iter()
        .find(|task| relative(dir.path(), &task.output_file) == output)
        .unwrap_or_else(|| panic!("no task for {output}: {:?}", outputs(dir, matrix)))
}
