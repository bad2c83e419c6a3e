//! Export map resolution.
//!
//! Walks the manifest's entry fields (`main`, `module`, `types`, `exports`,
//! `bin`) and maps every output pattern back to the sources under `rootDir`
//! that produce it.
//!
//! The walk happens in two passes. [`collect_leaves`] is a plain recursive
//! visitor over [`ExportDeclaration`] that flattens the tree into leaves, each
//! carrying the [`Branch`] state accumulated on the way down. The leaves are
//! then expanded against the filesystem one at a time, in declaration order,
//! so that the first declaration producing an output file owns it.

use std::path::{Path, PathBuf};

use knit_config::{ExportDeclaration, Project};
use path_clean::PathClean;
use rustc_hash::FxHashMap;

use crate::error::{MatrixError, Result};
use crate::registry::{ExportRegistry, RegistryBuilder, RegistrySlot};
use crate::source::{
    self, CODE_OUTPUT_EXTENSIONS, DECLARATION_EXTENSIONS, declaration_extension_for,
    is_declaration_file,
};
use crate::task::{EntryTarget, ModuleFormat, Platform, ResolvedEntry};

/// State accumulated while descending through condition and subpath keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Branch {
    pub format: ModuleFormat,
    pub target: EntryTarget,
    pub subpath: String,
    pub executable: bool,
}

impl Branch {
    /// Starting state for a package: format from the manifest's `type`, node
    /// platform.
    pub fn preset(is_module: bool) -> Self {
        Self {
            format: if is_module {
                ModuleFormat::Esm
            } else {
                ModuleFormat::Cjs
            },
            target: EntryTarget::Platform(Platform::Node),
            subpath: ".".to_string(),
            executable: false,
        }
    }

    /// State for the child reached through `key`.
    pub fn descend(&self, key: &str) -> Self {
        let mut next = self.clone();
        match key {
            subpath if subpath.starts_with('.') => {
                next.subpath = join_subpath(&self.subpath, subpath);
            }
            "import" | "module" => next.format = ModuleFormat::Esm,
            "require" => next.format = ModuleFormat::Cjs,
            "types" | "typings" => next.target = EntryTarget::Declaration,
            other => {
                // declaration branches stay declaration-only
                if let Some(platform) = Platform::from_condition(other) {
                    if next.target != EntryTarget::Declaration {
                        next.target = EntryTarget::Platform(platform);
                    }
                }
            }
        }
        next
    }

    fn with_format(mut self, format: ModuleFormat) -> Self {
        self.format = format;
        self
    }

    fn declaration_only(mut self) -> Self {
        self.target = EntryTarget::Declaration;
        self
    }

    fn executable(mut self) -> Self {
        self.executable = true;
        self
    }
}

fn join_subpath(prefix: &str, key: &str) -> String {
    if key == "." {
        prefix.to_string()
    } else if prefix == "." {
        key.to_string()
    } else {
        format!("{}{}", prefix, key.trim_start_matches('.'))
    }
}

/// A literal output pattern plus the branch it was reached through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Leaf {
    pub pattern: String,
    pub branch: Branch,
}

/// Depth-first, declaration-order flattening of an export tree.
pub fn collect_leaves(declaration: &ExportDeclaration, branch: &Branch, leaves: &mut Vec<Leaf>) {
    match declaration {
        ExportDeclaration::Literal(pattern) => leaves.push(Leaf {
            pattern: pattern.clone(),
            branch: branch.clone(),
        }),
        ExportDeclaration::Fallbacks(alternatives) => {
            for alternative in alternatives {
                collect_leaves(alternative, branch, leaves);
            }
        }
        ExportDeclaration::Conditions(conditions) => {
            for (key, child) in conditions {
                collect_leaves(child, &branch.descend(key), leaves);
            }
        }
        ExportDeclaration::Excluded => {}
    }
}

/// Entries and registry produced by one expansion.
#[derive(Debug, Clone, Default)]
pub struct ResolvedExports {
    pub entries: Vec<ResolvedEntry>,
    pub registry: ExportRegistry,
}

pub struct ExportResolver<'a> {
    project: &'a Project,
    root_dir: PathBuf,
    out_dir: PathBuf,
    out_prefix: String,
    source_extensions: Vec<&'static str>,
}

impl<'a> ExportResolver<'a> {
    pub fn new(project: &'a Project) -> Self {
        let out_prefix = slash_path(&PathBuf::from(project.tsconfig.out_dir()).clean());
        Self {
            root_dir: project.root_dir().clean(),
            out_dir: project.out_dir().clean(),
            out_prefix,
            source_extensions: project.tsconfig.source_extensions(),
            project,
        }
    }

    /// Leaves in processing order: `main`, `module`, `types`, `exports`, the
    /// implicit `./package.json` passthrough, then `bin`.
    pub fn leaves(&self) -> Vec<Leaf> {
        let manifest = &self.project.manifest;
        let preset = Branch::preset(manifest.is_module());
        let mut leaves = Vec::new();

        if let Some(main) = &manifest.main {
            collect_leaves(&ExportDeclaration::Literal(main.clone()), &preset, &mut leaves);
        }
        if let Some(module) = &manifest.module {
            let branch = preset.clone().with_format(ModuleFormat::Esm);
            collect_leaves(&ExportDeclaration::Literal(module.clone()), &branch, &mut leaves);
        }
        if let Some(types) = manifest.types_entry() {
            let branch = preset.clone().declaration_only();
            collect_leaves(&ExportDeclaration::Literal(types.to_string()), &branch, &mut leaves);
        }
        match &manifest.exports {
            Some(exports) => collect_leaves(exports, &preset, &mut leaves),
            None => leaves.push(Leaf {
                pattern: "./package.json".to_string(),
                branch: preset.clone(),
            }),
        }
        if let Some(bin) = &manifest.bin {
            let branch = preset.clone().executable();
            for path in bin.paths() {
                collect_leaves(&ExportDeclaration::Literal(path.to_string()), &branch, &mut leaves);
            }
        }

        leaves
    }

    pub async fn resolve(&self) -> Result<ResolvedExports> {
        let mut expansion = Expansion::default();
        for leaf in self.leaves() {
            self.expand_leaf(&leaf, &mut expansion).await?;
        }
        Ok(ResolvedExports {
            entries: expansion.entries,
            registry: expansion.registry.freeze(),
        })
    }

    async fn expand_leaf(&self, leaf: &Leaf, expansion: &mut Expansion) -> Result<()> {
        let relative = normalize_pattern(&leaf.pattern)?;

        let Some(rest) = self.strip_out_prefix(relative) else {
            return self.expand_passthrough(relative, expansion).await;
        };
        let Some(shape) = OutputShape::classify(rest, &leaf.branch) else {
            return self.expand_passthrough(relative, expansion).await;
        };

        let stem = &rest[..rest.len() - shape.matched_extension.len()];
        let stem_glob = source::stem_to_glob(stem)?;

        let mut source_extensions = self.source_extensions.clone();
        // A hand-written declaration file owns the output before a `.ts` source.
        if shape.target == EntryTarget::Declaration {
            source_extensions.insert(0, shape.output_extension);
        }

        for source_extension in source_extensions {
            let is_declaration_source = is_declaration_file(source_extension);
            let matches = source::expand(
                self.root_dir.clone(),
                format!("{stem_glob}{source_extension}"),
            )
            .await?;

            for source_file in matches {
                let relative_source = source::relative_slash_path(&self.root_dir, &source_file);
                let Some(relative_source) = relative_source else {
                    continue;
                };
                if !is_declaration_source && is_declaration_file(&relative_source) {
                    continue;
                }
                let entry_name = relative_source
                    .strip_suffix(source_extension)
                    .unwrap_or(&relative_source)
                    .to_string();
                let output = self
                    .out_dir
                    .join(format!("{entry_name}{}", shape.output_extension));

                let entry = ResolvedEntry {
                    source: source_file,
                    output,
                    output_extension: shape.output_extension.to_string(),
                    format: shape.format,
                    target: shape.target,
                    subpath: leaf.branch.subpath.clone(),
                    entry_name,
                    executable: leaf.branch.executable,
                };
                expansion.record(entry);
            }
        }

        Ok(())
    }

    async fn expand_passthrough(&self, relative: &str, expansion: &mut Expansion) -> Result<()> {
        let pattern = source::stem_to_glob(relative)?;
        let matches = source::expand(self.project.root.clone(), pattern).await?;
        if matches.is_empty() {
            tracing::debug!(pattern = relative, "passthrough pattern matched no files");
        }
        for file in matches {
            tracing::debug!(file = %file.display(), "passthrough");
            expansion
                .registry
                .insert(&file, RegistrySlot::Default, &file, None);
        }
        Ok(())
    }

    fn strip_out_prefix<'p>(&self, relative: &'p str) -> Option<&'p str> {
        if self.out_prefix == "." || self.out_prefix.is_empty() {
            return Some(relative);
        }
        relative
            .strip_prefix(self.out_prefix.as_str())
            .and_then(|rest| rest.strip_prefix('/'))
    }
}

/// Extension, format and target derived from an output pattern's suffix.
struct OutputShape {
    matched_extension: &'static str,
    output_extension: &'static str,
    format: ModuleFormat,
    target: EntryTarget,
}

impl OutputShape {
    fn classify(rest: &str, branch: &Branch) -> Option<Self> {
        let declaration = DECLARATION_EXTENSIONS
            .iter()
            .copied()
            .find(|ext| rest.ends_with(ext));
        if let Some(ext) = declaration {
            return Some(Self {
                matched_extension: ext,
                output_extension: ext,
                format: branch.format,
                target: EntryTarget::Declaration,
            });
        }

        let ext = CODE_OUTPUT_EXTENSIONS
            .iter()
            .copied()
            .find(|ext| rest.ends_with(ext))?;
        let format = match ext {
            ".mjs" => ModuleFormat::Esm,
            ".cjs" => ModuleFormat::Cjs,
            _ => branch.format,
        };

        if branch.target == EntryTarget::Declaration {
            return Some(Self {
                matched_extension: ext,
                output_extension: declaration_extension_for(ext)?,
                format,
                target: EntryTarget::Declaration,
            });
        }

        Some(Self {
            matched_extension: ext,
            output_extension: ext,
            format,
            target: branch.target,
        })
    }
}

#[derive(Default)]
struct Expansion {
    entries: Vec<ResolvedEntry>,
    by_output: FxHashMap<PathBuf, usize>,
    registry: RegistryBuilder,
}

impl Expansion {
    fn record(&mut self, entry: ResolvedEntry) {
        if let Some(&existing) = self.by_output.get(&entry.output) {
            let owner = &mut self.entries[existing];
            tracing::debug!(
                output = %entry.output.display(),
                source = %entry.source.display(),
                owner = %owner.source.display(),
                "output already declared, skipping"
            );
            if entry.executable && !owner.executable {
                owner.executable = true;
            }
            return;
        }

        let format = match entry.target {
            EntryTarget::Declaration => None,
            EntryTarget::Platform(_) => Some(entry.format),
        };
        self.registry
            .insert(&entry.source, entry.target.into(), &entry.output, format);
        self.by_output.insert(entry.output.clone(), self.entries.len());
        self.entries.push(entry);
    }
}

/// Strip a leading `./`; reject targets escaping the package.
fn normalize_pattern(pattern: &str) -> Result<&str> {
    let trimmed = pattern.strip_prefix("./").unwrap_or(pattern);
    if trimmed.starts_with('/') || trimmed.starts_with("../") || trimmed.contains("/../") {
        return Err(MatrixError::invalid_pattern(
            pattern,
            "targets must stay inside the package",
        ));
    }
    Ok(trimmed)
}

fn slash_path(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;

    fn conditions(pairs: &[(&str, ExportDeclaration)]) -> ExportDeclaration {
        ExportDeclaration::Conditions(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect::<IndexMap<_, _>>(),
        )
    }

    fn literal(s: &str) -> ExportDeclaration {
        ExportDeclaration::Literal(s.to_string())
    }

    #[test]
    fn format_conditions_override_preset() {
        let preset = Branch::preset(false);
        assert_eq!(preset.descend("import").format, ModuleFormat::Esm);
        assert_eq!(preset.descend("module").format, ModuleFormat::Esm);
        assert_eq!(
            Branch::preset(true).descend("require").format,
            ModuleFormat::Cjs
        );
    }

    #[test]
    fn platform_conditions_override_preset() {
        let preset = Branch::preset(true);
        assert_eq!(
            preset.descend("browser").target,
            EntryTarget::Platform(Platform::Browser)
        );
        assert_eq!(
            preset.descend("default").target,
            EntryTarget::Platform(Platform::Node)
        );
    }

    #[test]
    fn declaration_branch_ignores_platforms() {
        let branch = Branch::preset(true).descend("types").descend("browser");
        assert_eq!(branch.target, EntryTarget::Declaration);
    }

    #[test]
    fn subpaths_accumulate() {
        let branch = Branch::preset(true).descend("./utils").descend("import");
        assert_eq!(branch.subpath, "./utils");
        assert_eq!(Branch::preset(true).descend(".").subpath, ".");
    }

    #[test]
    fn leaves_follow_declaration_order() {
        let tree = conditions(&[
            (
                ".",
                conditions(&[
                    ("types", literal("./dist/index.d.ts")),
                    ("require", literal("./dist/index.cjs")),
                    ("import", literal("./dist/index.mjs")),
                ]),
            ),
            ("./feature", ExportDeclaration::Fallbacks(vec![literal("./dist/feature.js")])),
            ("./private/*", ExportDeclaration::Excluded),
        ]);

        let mut leaves = Vec::new();
        collect_leaves(&tree, &Branch::preset(false), &mut leaves);

        let patterns: Vec<_> = leaves.iter().map(|l| l.pattern.as_str()).collect();
        assert_eq!(
            patterns,
            [
                "./dist/index.d.ts",
                "./dist/index.cjs",
                "./dist/index.mjs",
                "./dist/feature.js"
            ]
        );
        assert_eq!(leaves[0].branch.target, EntryTarget::Declaration);
        assert_eq!(leaves[3].branch.subpath, "./feature");
    }

    #[test]
    fn output_shape_from_extension() {
        let cjs_preset = Branch::preset(false);
        let shape = OutputShape::classify("index.mjs", &cjs_preset).unwrap();
        assert_eq!(shape.format, ModuleFormat::Esm);

        let shape = OutputShape::classify("index.js", &cjs_preset).unwrap();
        assert_eq!(shape.format, ModuleFormat::Cjs);

        let shape = OutputShape::classify("index.d.ts", &cjs_preset).unwrap();
        assert_eq!(shape.target, EntryTarget::Declaration);
        assert_eq!(shape.matched_extension, ".d.ts");

        let declaration = cjs_preset.clone().declaration_only();
        let shape = OutputShape::classify("index.mjs", &declaration).unwrap();
        assert_eq!(shape.output_extension, ".d.mts");

        assert!(OutputShape::classify("styles.css", &cjs_preset).is_none());
    }

    #[test]
    fn patterns_must_stay_in_package() {
        assert_eq!(normalize_pattern("./dist/a.js").unwrap(), "dist/a.js");
        assert_eq!(normalize_pattern("dist/a.js").unwrap(), "dist/a.js");
        assert!(normalize_pattern("../other/a.js").is_err());
        assert!(normalize_pattern("/abs/a.js").is_err());
    }
}
