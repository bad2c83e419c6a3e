//! Package root discovery and loading.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, Result};
use crate::manifest::Manifest;
use crate::tsconfig::TsConfig;

pub const MANIFEST_FILE: &str = "package.json";
pub const TSCONFIG_FILE: &str = "tsconfig.json";

/// A package root with its manifest and compiler configuration, read once.
#[derive(Debug, Clone)]
pub struct Project {
    pub root: PathBuf,
    pub manifest: Manifest,
    pub tsconfig: TsConfig,
}

impl Project {
    /// Read `package.json` (required) and `tsconfig.json` (optional) from `root`.
    pub fn load(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();

        let manifest_path = root.join(MANIFEST_FILE);
        if !manifest_path.is_file() {
            return Err(ConfigError::ManifestNotFound(root));
        }
        let content = fs::read_to_string(&manifest_path)?;
        let manifest: Manifest =
            serde_json::from_str(&content).map_err(|e| ConfigError::parse(&manifest_path, e))?;
        manifest.validate()?;

        let tsconfig_path = root.join(TSCONFIG_FILE);
        let tsconfig = if tsconfig_path.is_file() {
            let content = fs::read_to_string(&tsconfig_path)?;
            serde_json::from_str(&content).map_err(|e| ConfigError::parse(&tsconfig_path, e))?
        } else {
            tracing::debug!(root = %root.display(), "no tsconfig.json, using defaults");
            TsConfig::default()
        };

        Ok(Self {
            root,
            manifest,
            tsconfig,
        })
    }

    /// Absolute input root (`compilerOptions.rootDir`).
    pub fn root_dir(&self) -> PathBuf {
        self.root.join(self.tsconfig.root_dir())
    }

    /// Absolute output directory (`compilerOptions.outDir`).
    pub fn out_dir(&self) -> PathBuf {
        self.root.join(self.tsconfig.out_dir())
    }
}
