//! `package.json` model.
//!
//! Only the fields that drive the build matrix are modelled; everything else in
//! the manifest is ignored on deserialization.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Module system declared by the manifest's `type` field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageType {
    #[default]
    Commonjs,
    Module,
}

/// `bin` is either a single path (named after the package) or a map of command
/// names to paths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BinField {
    Single(String),
    Map(IndexMap<String, String>),
}

impl BinField {
    /// Declared paths in declaration order.
    pub fn paths(&self) -> Vec<&str> {
        match self {
            BinField::Single(path) => vec![path.as_str()],
            BinField::Map(map) => map.values().map(String::as_str).collect(),
        }
    }
}

/// A node of the `exports` tree.
///
/// Keys of a [`ExportDeclaration::Conditions`] map are either subpaths (starting
/// with `.`) or condition names; the map keeps declaration order because
/// first-declared-wins depends on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExportDeclaration {
    Literal(String),
    Fallbacks(Vec<ExportDeclaration>),
    Conditions(IndexMap<String, ExportDeclaration>),
    /// `null` target, used to hide a subpath.
    Excluded,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub version: String,

    #[serde(default, rename = "type")]
    pub package_type: PackageType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub types: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub typings: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bin: Option<BinField>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exports: Option<ExportDeclaration>,

    #[serde(default)]
    pub dependencies: IndexMap<String, String>,

    #[serde(default)]
    pub peer_dependencies: IndexMap<String, String>,

    #[serde(default)]
    pub optional_dependencies: IndexMap<String, String>,

    #[serde(default)]
    pub dev_dependencies: IndexMap<String, String>,
}

impl Manifest {
    /// Parse and validate manifest JSON.
    pub fn from_json(content: &str) -> Result<Self> {
        let manifest: Manifest = serde_json::from_str(content)
            .map_err(|e| ConfigError::parse("package.json", e))?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// `name` and `version` must be present and non-empty.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::MissingField("name"));
        }
        if self.version.trim().is_empty() {
            return Err(ConfigError::MissingField("version"));
        }
        Ok(())
    }

    pub fn is_module(&self) -> bool {
        self.package_type == PackageType::Module
    }

    /// Top-level declaration entry, `types` taking precedence over `typings`.
    pub fn types_entry(&self) -> Option<&str> {
        self.types.as_deref().or(self.typings.as_deref())
    }
}
