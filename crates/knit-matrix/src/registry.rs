//! Source-to-output registry shared by every task's resolver.
//!
//! The registry answers "if task T imports source file F, where does F's
//! compiled output live for T's platform?". It is filled during expansion and
//! frozen before any task starts bundling.

use std::fmt;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use serde::{Serialize, Serializer};

use crate::task::{EntryTarget, ModuleFormat, Platform};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegistrySlot {
    Platform(Platform),
    /// Declaration output.
    Types,
    /// Platform-independent file shipped as-is.
    Default,
}

impl RegistrySlot {
    pub fn as_str(&self) -> &'static str {
        match self {
            RegistrySlot::Platform(platform) => platform.as_str(),
            RegistrySlot::Types => "types",
            RegistrySlot::Default => "default",
        }
    }

    pub fn is_code(&self) -> bool {
        !matches!(self, RegistrySlot::Types)
    }
}

impl From<EntryTarget> for RegistrySlot {
    fn from(target: EntryTarget) -> Self {
        match target {
            EntryTarget::Platform(platform) => RegistrySlot::Platform(platform),
            EntryTarget::Declaration => RegistrySlot::Types,
        }
    }
}

impl fmt::Display for RegistrySlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for RegistrySlot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Frozen `source -> slot -> output` mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ExportRegistry {
    entries: IndexMap<PathBuf, IndexMap<RegistrySlot, PathBuf>>,
}

impl ExportRegistry {
    pub fn get(&self, source: &Path, slot: RegistrySlot) -> Option<&Path> {
        self.entries
            .get(source)
            .and_then(|slots| slots.get(&slot))
            .map(PathBuf::as_path)
    }

    pub fn slots(&self, source: &Path) -> Option<&IndexMap<RegistrySlot, PathBuf>> {
        self.entries.get(source)
    }

    /// Whether `source` has any code output (anything besides declarations).
    pub fn has_code_output(&self, source: &Path) -> bool {
        self.entries
            .get(source)
            .is_some_and(|slots| slots.keys().any(RegistrySlot::is_code))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PathBuf, &IndexMap<RegistrySlot, PathBuf>)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Mutable side of the registry, only alive during expansion.
///
/// A slot keeps the first output written to it, except that an ESM output
/// replaces a CommonJS one: cross-task rewriting only happens inside ESM tasks,
/// which must not be pointed at a CommonJS file.
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    registry: ExportRegistry,
    formats: FxHashMap<(PathBuf, RegistrySlot), ModuleFormat>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(
        &mut self,
        source: &Path,
        slot: RegistrySlot,
        output: &Path,
        format: Option<ModuleFormat>,
    ) {
        let slots = self
            .registry
            .entries
            .entry(source.to_path_buf())
            .or_default();
        let key = (source.to_path_buf(), slot);

        match slots.get(&slot) {
            None => {
                slots.insert(slot, output.to_path_buf());
                if let Some(format) = format {
                    self.formats.insert(key, format);
                }
            }
            Some(existing) => {
                let upgrade = format == Some(ModuleFormat::Esm)
                    && self.formats.get(&key) == Some(&ModuleFormat::Cjs);
                if upgrade {
                    tracing::debug!(
                        source = %source.display(),
                        slot = %slot,
                        from = %existing.display(),
                        to = %output.display(),
                        "preferring ESM output for registry slot"
                    );
                    slots.insert(slot, output.to_path_buf());
                    self.formats.insert(key, ModuleFormat::Esm);
                }
            }
        }
    }

    pub fn freeze(self) -> ExportRegistry {
        self.registry
    }
}
