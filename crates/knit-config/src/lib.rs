//! Configuration model for knit.
//!
//! Three inputs feed a build:
//!
//! - `package.json`, modelled by [`Manifest`]
//! - `tsconfig.json`, modelled by [`TsConfig`] (only `compilerOptions` matters)
//! - invocation settings, modelled by [`BuildSettings`] and layered with figment
//!
//! [`Project::load`] reads the first two from a package root.

pub mod error;
pub mod manifest;
pub mod project;
pub mod settings;
pub mod tsconfig;

pub use error::{ConfigError, Result};
pub use manifest::{BinField, ExportDeclaration, Manifest, PackageType};
pub use project::{MANIFEST_FILE, Project, TSCONFIG_FILE};
pub use settings::{BuildSettings, SETTINGS_FILE, SettingsOverrides};
pub use tsconfig::{CompilerOptions, TsConfig};
