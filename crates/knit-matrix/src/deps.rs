//! Dependency classification for bare imports.
//!
//! A bare import either stays external (the consumer installs the package) or
//! gets bundled into the output. The decision comes from where `package.json`
//! declares the package.

use std::path::Path;

use knit_config::Manifest;
use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::error::UndeclaredDependencyError;

/// Node.js built-in modules (`require('module').builtinModules`, top-level names).
const NODE_BUILTINS: &[&str] = &[
    "assert",
    "async_hooks",
    "buffer",
    "child_process",
    "cluster",
    "console",
    "constants",
    "crypto",
    "dgram",
    "diagnostics_channel",
    "dns",
    "domain",
    "events",
    "fs",
    "http",
    "http2",
    "https",
    "inspector",
    "module",
    "net",
    "os",
    "path",
    "perf_hooks",
    "process",
    "punycode",
    "querystring",
    "readline",
    "repl",
    "stream",
    "string_decoder",
    "sys",
    "timers",
    "tls",
    "trace_events",
    "tty",
    "url",
    "util",
    "v8",
    "vm",
    "wasi",
    "worker_threads",
    "zlib",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DependencyKind {
    Required,
    Peer,
    Optional,
    DevOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    External,
    Bundled,
}

/// Package name of a bare specifier: `@scope/name` for scoped packages, the
/// first segment otherwise.
pub fn package_name(specifier: &str) -> &str {
    let mut boundaries = specifier.match_indices('/').map(|(i, _)| i);
    let end = if specifier.starts_with('@') {
        boundaries.nth(1)
    } else {
        boundaries.next()
    };
    match end {
        Some(end) => &specifier[..end],
        None => specifier,
    }
}

/// `node:`-prefixed specifiers and Node.js built-ins, including subpaths such
/// as `fs/promises`.
pub fn is_builtin(specifier: &str) -> bool {
    specifier.starts_with("node:") || NODE_BUILTINS.contains(&package_name(specifier))
}

#[derive(Debug, Clone, Default)]
pub struct DependencyClassifier {
    own_name: String,
    declared: FxHashMap<String, Vec<DependencyKind>>,
}

impl DependencyClassifier {
    pub fn from_manifest(manifest: &Manifest) -> Self {
        let mut declared: FxHashMap<String, Vec<DependencyKind>> = FxHashMap::default();
        let kinds = [
            (&manifest.dependencies, DependencyKind::Required),
            (&manifest.peer_dependencies, DependencyKind::Peer),
            (&manifest.optional_dependencies, DependencyKind::Optional),
            (&manifest.dev_dependencies, DependencyKind::DevOnly),
        ];
        for (map, kind) in kinds {
            for name in map.keys() {
                declared.entry(name.clone()).or_default().push(kind);
            }
        }

        Self {
            own_name: manifest.name.clone(),
            declared,
        }
    }

    /// Kinds under which `package` is declared.
    pub fn kinds(&self, package: &str) -> &[DependencyKind] {
        self.declared.get(package).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Classify an import specifier.
    ///
    /// Returns `Ok(None)` for absolute paths, which are left to relative
    /// handling.
    pub fn classify(
        &self,
        specifier: &str,
    ) -> Result<Option<Decision>, UndeclaredDependencyError> {
        if Path::new(specifier).is_absolute() {
            return Ok(None);
        }
        if is_builtin(specifier) {
            return Ok(Some(Decision::External));
        }

        let package = package_name(specifier);
        if package == self.own_name {
            return Ok(Some(Decision::External));
        }

        match self.kinds(package) {
            [] => Err(UndeclaredDependencyError {
                package: package.to_string(),
                specifier: specifier.to_string(),
            }),
            kinds if kinds.iter().all(|k| *k == DependencyKind::DevOnly) => {
                Ok(Some(Decision::Bundled))
            }
            _ => Ok(Some(Decision::External)),
        }
    }
}
