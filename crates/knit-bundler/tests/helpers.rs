//! Shared fixtures for knit-bundler tests.

#![allow(dead_code)]

use std::fs;

use knit_bundler::{BuildSummary, DispatchOptions, dispatch};
use knit_config::Project;
use knit_matrix::{MatrixOptions, build_matrix};
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

pub async fn build_with(dir: &TempDir, options: MatrixOptions) -> BuildSummary {
    let project = Project::load(dir.path()).expect("load project");
    let matrix = build_matrix(&project, &options).await.expect("build matrix");
    dispatch(&matrix, &project.root, &DispatchOptions::default()).await
}

pub async fn build(dir: &TempDir) -> BuildSummary {
    build_with(dir, MatrixOptions::default()).await
}

pub fn read(dir: &TempDir, path: &str) -> String {
    fs::read_to_string(dir.path().join(path)).unwrap_or_else(|e| panic!("read {path}: {e}"))
}
