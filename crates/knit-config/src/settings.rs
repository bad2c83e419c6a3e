//! Invocation settings shared by every task of a build.

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format as _, Serialized, Toml},
};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Optional settings file looked up in the package root.
pub const SETTINGS_FILE: &str = "knit.toml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildSettings {
    #[serde(default)]
    pub minify: bool,

    /// `KEY = VALUE` pairs substituted as `process.env.KEY`.
    #[serde(default)]
    pub env: IndexMap<String, String>,

    /// Upper bound on concurrently bundling tasks. `None` picks a default from
    /// the CPU count.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_parallel: Option<usize>,

    #[serde(default)]
    pub clean: bool,
}

/// Values given on the command line. Unset fields leave lower layers alone.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SettingsOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minify: Option<bool>,

    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub env: IndexMap<String, String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_parallel: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub clean: Option<bool>,
}

impl BuildSettings {
    /// Load settings for the package at `root`.
    /// Priority: overrides > `KNIT_*` environment > `knit.toml` > defaults
    pub fn load(root: &Path, overrides: &SettingsOverrides) -> Result<Self> {
        let mut figment = Figment::new().merge(Serialized::defaults(Self::default()));

        let settings_file = root.join(SETTINGS_FILE);
        if settings_file.is_file() {
            tracing::debug!(path = %settings_file.display(), "loading settings file");
            figment = figment.merge(Toml::file(settings_file));
        }

        figment = figment
            .merge(Env::prefixed("KNIT_").only(&["minify", "max_parallel", "clean", "env"]))
            .merge(Serialized::defaults(overrides));

        let settings: Self = figment
            .extract()
            .map_err(|e| ConfigError::InvalidSetting(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_parallel == Some(0) {
            return Err(ConfigError::InvalidSetting(
                "max_parallel must be at least 1".to_string(),
            ));
        }
        if let Some(key) = self.env.keys().find(|k| k.is_empty()) {
            return Err(ConfigError::InvalidSetting(format!(
                "empty environment key: {key:?}"
            )));
        }
        Ok(())
    }
}
