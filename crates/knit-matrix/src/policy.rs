//! Cross-task import resolution.
//!
//! Every task bundles one entry point, but the package usually has several.
//! When a task imports a module that another task also produces, the import
//! is externalized and pointed at that task's output instead of being inlined
//! a second time. Bare imports go through the [`DependencyClassifier`].

use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};

use knit_config::Project;
use path_clean::PathClean;
use regex::Regex;

use crate::deps::{Decision, DependencyClassifier};
use crate::error::UndeclaredDependencyError;
use crate::registry::{ExportRegistry, RegistrySlot};
use crate::source::{self, declaration_extension_for, is_declaration_file};
use crate::task::{BuildTask, ModuleFormat};

static PACKAGE_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:@[a-zA-Z0-9_.~-][a-zA-Z0-9_.~-]*/)?[a-zA-Z0-9_~-][a-zA-Z0-9_.~-]*(?:/.*)?$")
        .expect("package name pattern is valid")
});

const HASHBANG: &str = "#!/usr/bin/env node\n";

/// What the bundler should do with an import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Keep the import as-is under this id.
    External(String),
    /// Inline the module into the current task.
    Bundle,
    /// No opinion; fall through to ordinary resolution.
    Defer,
}

pub fn is_relative(specifier: &str) -> bool {
    specifier == "."
        || specifier == ".."
        || specifier.starts_with("./")
        || specifier.starts_with("../")
}

/// Shared, read-only policy consulted by every task's resolver.
#[derive(Debug, Clone)]
pub struct ResolutionPolicy {
    classifier: DependencyClassifier,
    registry: Arc<ExportRegistry>,
    root_dir: PathBuf,
    out_dir: PathBuf,
    source_extensions: Vec<&'static str>,
}

impl ResolutionPolicy {
    pub fn new(project: &Project, registry: Arc<ExportRegistry>) -> Self {
        Self {
            classifier: DependencyClassifier::from_manifest(&project.manifest),
            registry,
            root_dir: project.root_dir().clean(),
            out_dir: project.out_dir().clean(),
            source_extensions: project.tsconfig.source_extensions(),
        }
    }

    pub fn registry(&self) -> &ExportRegistry {
        &self.registry
    }

    pub fn classifier(&self) -> &DependencyClassifier {
        &self.classifier
    }

    /// Decide a non-relative specifier.
    pub fn classify_external(
        &self,
        specifier: &str,
    ) -> Result<Resolution, UndeclaredDependencyError> {
        if is_relative(specifier) || Path::new(specifier).is_absolute() {
            return Ok(Resolution::Defer);
        }
        if !specifier.starts_with("node:") && !PACKAGE_NAME.is_match(specifier) {
            return Ok(Resolution::Defer);
        }

        Ok(match self.classifier.classify(specifier)? {
            Some(Decision::External) => Resolution::External(specifier.to_string()),
            Some(Decision::Bundled) => Resolution::Bundle,
            None => Resolution::Defer,
        })
    }

    /// Decide a relative specifier imported from `importer` inside `task`.
    pub fn rewrite_relative(
        &self,
        task: &BuildTask,
        importer: &Path,
        specifier: &str,
    ) -> Resolution {
        let base = importer.parent().unwrap_or(Path::new("")).join(specifier).clean();

        let Some(resolved) = self.resolve_static(&base) else {
            return self.rewrite_declaration_import(task, &base);
        };

        if resolved == task.entry || !self.registry.has_code_output(&resolved) {
            return Resolution::Bundle;
        }

        if task.format == ModuleFormat::Cjs {
            return Resolution::External(specifier.to_string());
        }

        let target = self
            .registry
            .get(&resolved, RegistrySlot::Platform(task.platform))
            .or_else(|| self.registry.get(&resolved, RegistrySlot::Default));
        match target {
            Some(output) => Resolution::External(self.specifier_from_task(task, output)),
            None => Resolution::Bundle,
        }
    }

    /// Literal path, extension substitution, appended source extensions,
    /// then `index` files.
    pub fn resolve_static(&self, base: &Path) -> Option<PathBuf> {
        if base.is_file() {
            return Some(base.to_path_buf());
        }

        let base_str = base.to_string_lossy();
        let swaps: &[(&str, &[&str])] = &[
            (".js", &[".ts", ".tsx"]),
            (".jsx", &[".tsx"]),
            (".mjs", &[".mts"]),
            (".cjs", &[".cts"]),
        ];
        for (from, to) in swaps {
            if let Some(stem) = base_str.strip_suffix(from) {
                for ext in *to {
                    let candidate = PathBuf::from(format!("{stem}{ext}"));
                    if candidate.is_file() {
                        return Some(candidate);
                    }
                }
            }
        }

        for ext in &self.source_extensions {
            let candidate = PathBuf::from(format!("{base_str}{ext}"));
            if candidate.is_file() {
                return Some(candidate);
            }
        }

        self.source_extensions
            .iter()
            .map(|ext| base.join(format!("index{ext}")))
            .find(|candidate| candidate.is_file())
    }

    fn rewrite_declaration_import(&self, task: &BuildTask, base: &Path) -> Resolution {
        let Some(extension) = base.extension().and_then(|e| e.to_str()) else {
            return Resolution::Defer;
        };
        let Some(declaration_extension) = declaration_extension_for(&format!(".{extension}"))
        else {
            return Resolution::Defer;
        };

        let base_str = base.to_string_lossy();
        let stem = &base_str[..base_str.len() - extension.len() - 1];
        let declaration = PathBuf::from(format!("{stem}{declaration_extension}"));
        match self.registry.get(&declaration, RegistrySlot::Types) {
            Some(output) if declaration.is_file() => {
                Resolution::External(self.specifier_from_task(task, output))
            }
            _ => Resolution::Defer,
        }
    }

    fn specifier_from_task(&self, task: &BuildTask, output: &Path) -> String {
        let from = task.output_file.parent().unwrap_or(&task.out_dir);
        source::relative_specifier(from, output)
    }

    /// Declaration sources load as empty modules and are copied instead.
    pub fn is_declaration_source(&self, id: &str) -> bool {
        is_declaration_file(id)
    }

    /// Where a declaration source is copied, mirroring its path under `rootDir`.
    pub fn declaration_copy_target(&self, source: &Path) -> PathBuf {
        match source.strip_prefix(&self.root_dir) {
            Ok(relative) => self.out_dir.join(relative),
            Err(_) => self
                .out_dir
                .join(source.file_name().unwrap_or(source.as_os_str())),
        }
    }

    /// Prepend a node hashbang unless one is present.
    pub fn with_executable_marker(code: &str) -> Option<String> {
        if code.starts_with("#!") {
            None
        } else {
            Some(format!("{HASHBANG}{code}"))
        }
    }
}
