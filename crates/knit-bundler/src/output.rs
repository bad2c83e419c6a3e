//! Writing task output to disk.
//!
//! Rolldown names chunks after the entry name with a `.js` extension, but each
//! task has a fixed output file (`index.cjs`, `index.mjs`, ...). The entry
//! chunk is therefore written to the task's `output_file`; other chunks and
//! assets keep their Rolldown names under the output directory.
//!
//! Writes go to a temporary sibling first and are renamed into place once
//! every file of the task has been written, so a failed task leaves no
//! partial output.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use knit_matrix::BuildTask;
use path_clean::PathClean;
use rolldown::BundleOutput;
use rolldown_common::Output;

use crate::{Error, Result};

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// One file to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedFile {
    pub path: PathBuf,
    pub contents: Vec<u8>,
    pub executable: bool,
}

/// Map a task's bundle onto files under its output directory.
///
/// Source maps are taken from the chunks and re-emitted next to the file they
/// describe, with a `sourceMappingURL` comment appended to the code.
pub fn plan_task_output(task: &BuildTask, bundle: &BundleOutput) -> Result<Vec<PlannedFile>> {
    let out_dir = task.out_dir.clean();
    let mut files = Vec::new();

    for item in &bundle.assets {
        match item {
            Output::Chunk(chunk) => {
                let path = if chunk.is_entry {
                    ensure_within(&out_dir, &task.output_file)?
                } else {
                    validate_output_path(&out_dir, chunk.filename.as_str())?
                };

                let mut code = chunk.code.clone();
                if let Some(map) = chunk.map.as_ref().filter(|_| task.sourcemap) {
                    let map_path = with_suffix(&path, ".map");
                    let map_name = map_path
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_default();
                    if !code.ends_with('\n') {
                        code.push('\n');
                    }
                    code.push_str(&format!("//# sourceMappingURL={map_name}\n"));
                    files.push(PlannedFile {
                        path: map_path,
                        contents: map.to_json_string().into_bytes(),
                        executable: false,
                    });
                }

                files.push(PlannedFile {
                    path,
                    contents: code.into_bytes(),
                    executable: chunk.is_entry && task.executable,
                });
            }
            Output::Asset(asset) => {
                let filename = asset.filename.as_str();
                // Maps are re-emitted from their chunks above.
                if filename.ends_with(".map") {
                    continue;
                }
                files.push(PlannedFile {
                    path: validate_output_path(&out_dir, filename)?,
                    contents: asset.source.as_bytes().to_vec(),
                    executable: false,
                });
            }
        }
    }

    Ok(files)
}

/// Add verbatim copies of declaration sources to `files`.
///
/// Targets outside `out_dir` are rejected.
pub fn plan_declaration_copies(
    out_dir: &Path,
    copies: &[(PathBuf, PathBuf)],
    files: &mut Vec<PlannedFile>,
) -> Result<()> {
    let out_dir = out_dir.clean();
    for (source, target) in copies {
        let target = ensure_within(&out_dir, target)?;
        if files.iter().any(|f| f.path == target) {
            continue;
        }
        let contents = fs::read(source).map_err(|e| Error::write_failure(source, e))?;
        files.push(PlannedFile {
            path: target,
            contents,
            executable: false,
        });
    }
    Ok(())
}

/// Write `files`, all or nothing.
pub fn write_files_atomic(files: &[PlannedFile]) -> Result<()> {
    let mut temp_files: Vec<(PathBuf, &PlannedFile)> = Vec::new();

    for file in files {
        if let Some(parent) = file.path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                cleanup_temp_files(&temp_files);
                return Err(Error::write_failure(parent, e));
            }
        }

        let temp_path = temp_path_for(&file.path);
        if let Err(e) = fs::write(&temp_path, &file.contents) {
            cleanup_temp_files(&temp_files);
            return Err(Error::write_failure(&temp_path, e));
        }
        temp_files.push((temp_path, file));
    }

    for (temp_path, file) in &temp_files {
        if let Err(e) = fs::rename(temp_path, &file.path) {
            cleanup_temp_files(&temp_files);
            return Err(Error::write_failure(&file.path, e));
        }
        if file.executable {
            mark_executable(&file.path)?;
        }
    }

    Ok(())
}

#[cfg(unix)]
fn mark_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(0o755))
        .map_err(|e| Error::write_failure(path, e))
}

#[cfg(not(unix))]
fn mark_executable(_path: &Path) -> Result<()> {
    Ok(())
}

fn cleanup_temp_files(temp_files: &[(PathBuf, &PlannedFile)]) {
    for (temp_path, _) in temp_files {
        if temp_path.exists() {
            if let Err(e) = fs::remove_file(temp_path) {
                tracing::warn!(
                    "Failed to clean up temporary file '{}': {}",
                    temp_path.display(),
                    e
                );
            }
        }
    }
}

/// Unique sibling of `path`. Concurrent tasks may copy the same declaration
/// file, so temp names must not collide.
fn temp_path_for(path: &Path) -> PathBuf {
    let n = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
    with_suffix(path, &format!(".{}.{n}.tmp", std::process::id()))
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

/// `base_dir/filename`, rejecting names that escape `base_dir`.
fn validate_output_path(base_dir: &Path, filename: &str) -> Result<PathBuf> {
    if filename.contains('\0') {
        return Err(Error::InvalidOutputPath(
            "Filename contains null byte".to_string(),
        ));
    }
    let full_path = base_dir.join(Path::new(filename).clean()).clean();
    ensure_within(base_dir, &full_path)
}

fn ensure_within(base_dir: &Path, path: &Path) -> Result<PathBuf> {
    let cleaned = path.clean();
    if !cleaned.starts_with(base_dir) {
        return Err(Error::InvalidOutputPath(format!(
            "Path '{}' escapes output directory '{}'",
            path.display(),
            base_dir.display()
        )));
    }
    Ok(cleaned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn planned(path: PathBuf, contents: &str) -> PlannedFile {
        PlannedFile {
            path,
            contents: contents.as_bytes().to_vec(),
            executable: false,
        }
    }

    #[test]
    fn test_validate_output_path_nested() {
        let base = Path::new("/tmp/output");
        assert_eq!(
            validate_output_path(base, "chunks/shared.js").unwrap(),
            Path::new("/tmp/output/chunks/shared.js")
        );
    }

    #[test]
    fn test_validate_output_path_traversal() {
        let base = Path::new("/tmp/output");
        assert!(validate_output_path(base, "../../../etc/passwd").is_err());
        assert!(validate_output_path(base, "a/../../b.js").is_err());
        assert!(validate_output_path(base, "bad\0name.js").is_err());
    }

    #[test]
    fn temp_names_do_not_collide() {
        let path = Path::new("/o/index.mjs");
        let first = temp_path_for(path);
        assert!(first.to_string_lossy().starts_with("/o/index.mjs."));
        assert!(first.to_string_lossy().ends_with(".tmp"));
        assert_ne!(first, temp_path_for(path));
    }

    #[test]
    fn writes_nested_files_and_leaves_no_temps() {
        let dir = TempDir::new().unwrap();
        let files = vec![
            planned(dir.path().join("lib/index.mjs"), "export {}"),
            planned(dir.path().join("lib/utils/a.mjs"), "export const a = 1"),
        ];

        write_files_atomic(&files).unwrap();

        assert_eq!(
            fs::read_to_string(dir.path().join("lib/utils/a.mjs")).unwrap(),
            "export const a = 1"
        );
        let leftovers: Vec<_> = fs::read_dir(dir.path().join("lib"))
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn executables_get_exec_bits() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let mut file = planned(dir.path().join("cli.js"), "#!/usr/bin/env node\n");
        file.executable = true;
        write_files_atomic(&[file]).unwrap();

        let mode = fs::metadata(dir.path().join("cli.js"))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o111, 0o111);
    }

    #[test]
    fn declaration_copies_stay_in_out_dir() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("src/types.d.ts");
        fs::create_dir_all(source.parent().unwrap()).unwrap();
        fs::write(&source, "export type A = string;").unwrap();
        let out_dir = dir.path().join("dist");

        let mut files = Vec::new();
        plan_declaration_copies(
            &out_dir,
            &[
                (source.clone(), out_dir.join("types.d.ts")),
                (source.clone(), out_dir.join("types.d.ts")),
            ],
            &mut files,
        )
        .unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].contents, b"export type A = string;");

        let escaping = [(source, dir.path().join("elsewhere.d.ts"))];
        assert!(plan_declaration_copies(&out_dir, &escaping, &mut files).is_err());
    }
}
