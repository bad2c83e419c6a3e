//! Entry and task types produced by matrix expansion.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleFormat {
    Esm,
    Cjs,
}

impl ModuleFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModuleFormat::Esm => "esm",
            ModuleFormat::Cjs => "cjs",
        }
    }
}

impl fmt::Display for ModuleFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Node,
    Browser,
    Neutral,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Node => "node",
            Platform::Browser => "browser",
            Platform::Neutral => "neutral",
        }
    }

    /// Map a condition key onto a platform.
    pub fn from_condition(key: &str) -> Option<Self> {
        match key {
            "node" => Some(Platform::Node),
            "browser" => Some(Platform::Browser),
            "neutral" => Some(Platform::Neutral),
            _ => None,
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What an entry is built for: a runtime platform, or declarations only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryTarget {
    Platform(Platform),
    Declaration,
}

impl EntryTarget {
    pub fn platform(&self) -> Option<Platform> {
        match self {
            EntryTarget::Platform(platform) => Some(*platform),
            EntryTarget::Declaration => None,
        }
    }
}

/// One concrete (source, output) pair found while walking the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedEntry {
    pub source: PathBuf,
    pub output: PathBuf,
    pub output_extension: String,
    pub format: ModuleFormat,
    pub target: EntryTarget,
    pub subpath: String,
    pub entry_name: String,
    pub executable: bool,
}

/// A single bundler invocation. Immutable once the matrix is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildTask {
    /// Absolute path of the source entry point.
    pub entry: PathBuf,
    pub entry_name: String,
    pub out_dir: PathBuf,
    pub output_file: PathBuf,
    pub output_extension: String,
    pub format: ModuleFormat,
    pub platform: Platform,
    pub minify: bool,
    pub sourcemap: bool,
    /// Lower-cased compiler target, e.g. `es2020`.
    pub target: String,
    /// `(expression, replacement)` pairs, replacement already a JS literal.
    pub define: Vec<(String, String)>,
    /// Prepend a hashbang to the entry module.
    pub executable: bool,
}

impl BuildTask {
    /// `source -> output` label used in logs.
    pub fn label(&self) -> String {
        format!("{} -> {}", self.entry.display(), self.output_file.display())
    }
}
