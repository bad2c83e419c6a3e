//! `tsconfig.json` model.
//!
//! The file is parsed as strict JSON. `extends` chains are not followed.

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

pub const DEFAULT_ROOT_DIR: &str = "src";
pub const DEFAULT_OUT_DIR: &str = "dist";
pub const DEFAULT_TARGET: &str = "es2020";

const TS_EXTENSIONS: &[&str] = &[".ts", ".tsx", ".mts", ".cts"];
const JS_EXTENSIONS: &[&str] = &[".js", ".jsx", ".mjs", ".cjs"];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TsConfig {
    #[serde(default)]
    pub compiler_options: CompilerOptions,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompilerOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_dir: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub out_dir: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub declaration: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_map: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_js: Option<bool>,
}

impl TsConfig {
    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content).map_err(|e| ConfigError::parse("tsconfig.json", e))
    }

    pub fn root_dir(&self) -> &str {
        self.compiler_options
            .root_dir
            .as_deref()
            .unwrap_or(DEFAULT_ROOT_DIR)
    }

    pub fn out_dir(&self) -> &str {
        self.compiler_options
            .out_dir
            .as_deref()
            .unwrap_or(DEFAULT_OUT_DIR)
    }

    /// Compiler target, lower-cased.
    pub fn target(&self) -> String {
        self.compiler_options
            .target
            .as_deref()
            .unwrap_or(DEFAULT_TARGET)
            .to_ascii_lowercase()
    }

    pub fn source_map(&self) -> bool {
        self.compiler_options.source_map.unwrap_or(false)
    }

    /// Extensions probed when mapping an output pattern back to sources.
    /// JavaScript sources are only considered with `allowJs`.
    pub fn source_extensions(&self) -> Vec<&'static str> {
        let mut extensions = TS_EXTENSIONS.to_vec();
        if self.compiler_options.allow_js.unwrap_or(false) {
            extensions.extend_from_slice(JS_EXTENSIONS);
        }
        extensions
    }
}
