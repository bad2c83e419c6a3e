//! Filesystem expansion of source patterns.

use std::path::{Path, PathBuf};

use glob::{MatchOptions, Pattern};

use crate::error::{MatrixError, Result};

/// Declaration extensions, longest first.
pub const DECLARATION_EXTENSIONS: &[&str] = &[".d.mts", ".d.cts", ".d.ts"];

/// Output extensions that map to bundled code.
pub const CODE_OUTPUT_EXTENSIONS: &[&str] = &[".mjs", ".cjs", ".js"];

pub fn is_declaration_file(path: &str) -> bool {
    DECLARATION_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}

/// Declaration extension paired with a code extension (`.mjs` -> `.d.mts`).
pub fn declaration_extension_for(code_extension: &str) -> Option<&'static str> {
    match code_extension {
        ".mjs" | ".mts" => Some(".d.mts"),
        ".cjs" | ".cts" => Some(".d.cts"),
        ".js" | ".jsx" | ".ts" | ".tsx" => Some(".d.ts"),
        _ => None,
    }
}

/// Turn an output-relative pattern stem into a glob.
///
/// Literal segments are escaped. A `*` that starts a path component becomes
/// `**/*` so subpath patterns match nested files; a `*` inside a component
/// stays a single-component wildcard.
pub fn stem_to_glob(stem: &str) -> Result<String> {
    let mut parts = stem.split('*');
    let head = parts.next().unwrap_or_default();
    let Some(tail) = parts.next() else {
        return Ok(Pattern::escape(stem));
    };
    if parts.next().is_some() {
        return Err(MatrixError::invalid_pattern(
            stem,
            "at most one `*` is supported",
        ));
    }

    let wildcard = if head.is_empty() || head.ends_with('/') {
        "**/*"
    } else {
        "*"
    };
    Ok(format!(
        "{}{}{}",
        Pattern::escape(head),
        wildcard,
        Pattern::escape(tail)
    ))
}

/// Files under `base` matching `pattern`, sorted.
///
/// Runs on the blocking pool; directory walks can be slow on large trees.
pub async fn expand(base: PathBuf, pattern: String) -> Result<Vec<PathBuf>> {
    tokio::task::spawn_blocking(move || glob_files(&base, &pattern))
        .await
        .map_err(|e| MatrixError::Expansion(e.to_string()))?
}

fn glob_files(base: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    let full_pattern = format!(
        "{}/{}",
        Pattern::escape(&base.to_string_lossy()),
        pattern
    );
    let options = MatchOptions {
        case_sensitive: true,
        require_literal_separator: true,
        require_literal_leading_dot: true,
    };

    let mut results = Vec::new();
    let paths = glob::glob_with(&full_pattern, options)
        .map_err(|e| MatrixError::invalid_pattern(pattern, e.to_string()))?;
    for entry in paths {
        match entry {
            Ok(path) if path.is_file() => results.push(path),
            Ok(_) => {}
            Err(e) => tracing::warn!("glob error: {}", e),
        }
    }

    results.sort();
    results.dedup();
    Ok(results)
}

/// `path` relative to `base` with `/` separators.
pub fn relative_slash_path(base: &Path, path: &Path) -> Option<String> {
    let relative = pathdiff::diff_paths(path, base)?;
    let parts: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    Some(parts.join("/"))
}

/// Relative import specifier from `from_dir` to `target`: `/` separators and
/// always starting with `./` or `../`.
pub fn relative_specifier(from_dir: &Path, target: &Path) -> String {
    let relative = relative_slash_path(from_dir, target)
        .unwrap_or_else(|| target.to_string_lossy().replace('\\', "/"));
    if relative.starts_with("../") || relative.starts_with("./") {
        relative
    } else {
        format!("./{relative}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn literal_stems_are_escaped() {
        assert_eq!(stem_to_glob("index").unwrap(), "index");
        assert_eq!(stem_to_glob("a[b]").unwrap(), "a[[]b[]]");
    }

    #[test]
    fn component_wildcard_recurses() {
        assert_eq!(stem_to_glob("*").unwrap(), "**/*");
        assert_eq!(stem_to_glob("utils/*").unwrap(), "utils/**/*");
        assert_eq!(stem_to_glob("utils/*-impl").unwrap(), "utils/**/*-impl");
    }

    #[test]
    fn inner_wildcard_stays_in_component() {
        assert_eq!(stem_to_glob("utils/prefix-*").unwrap(), "utils/prefix-*");
    }

    #[test]
    fn rejects_two_wildcards() {
        assert!(stem_to_glob("*/*").is_err());
    }

    #[test]
    fn specifiers_always_start_with_dot() {
        assert_eq!(
            relative_specifier(Path::new("/p/dist"), Path::new("/p/dist/a.js")),
            "./a.js"
        );
        assert_eq!(
            relative_specifier(Path::new("/p/dist/sub"), Path::new("/p/dist/a.js")),
            "../a.js"
        );
        assert_eq!(
            relative_specifier(Path::new("/p/dist"), Path::new("/p/dist/x/y.mjs")),
            "./x/y.mjs"
        );
    }

    #[test]
    fn declaration_pairs() {
        assert_eq!(declaration_extension_for(".mjs"), Some(".d.mts"));
        assert_eq!(declaration_extension_for(".js"), Some(".d.ts"));
        assert_eq!(declaration_extension_for(".json"), None);
        assert!(is_declaration_file("types/index.d.cts"));
        assert!(!is_declaration_file("index.ts"));
    }

    #[tokio::test]
    async fn expands_nested_matches_sorted() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("nested/deeper")).unwrap();
        fs::write(dir.path().join("b.ts"), "").unwrap();
        fs::write(dir.path().join("a.ts"), "").unwrap();
        fs::write(dir.path().join("nested/deeper/c.ts"), "").unwrap();
        fs::write(dir.path().join("nested/readme.md"), "").unwrap();

        let files = expand(dir.path().to_path_buf(), "**/*.ts".to_string())
            .await
            .unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| relative_slash_path(dir.path(), p).unwrap())
            .collect();
        assert_eq!(names, ["a.ts", "b.ts", "nested/deeper/c.ts"]);
    }
}
