//! Rolldown plugin that installs the cross-task resolution policy.
//!
//! One plugin instance is created per task. It shares the frozen
//! [`ResolutionPolicy`] with every other task and carries the task it belongs
//! to, so the same import can resolve differently in a browser ESM build and a
//! node CJS build of the same package.

use std::borrow::Cow;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use knit_matrix::{BuildTask, Resolution, ResolutionPolicy};
use parking_lot::Mutex;
use rolldown_common::{ModuleType, ResolvedExternal};
use rolldown_plugin::{
    HookLoadArgs, HookLoadOutput, HookLoadReturn, HookResolveIdArgs, HookResolveIdOutput,
    HookResolveIdReturn, HookUsage, Plugin, PluginContext,
};
use tracing::debug;

/// `(declaration source, copy destination)` pairs seen by the load hook.
pub type DeclarationCopies = Arc<Mutex<Vec<(PathBuf, PathBuf)>>>;

#[derive(Debug, Clone)]
pub struct KnitPlugin {
    task: Arc<BuildTask>,
    policy: Arc<ResolutionPolicy>,
    declaration_copies: DeclarationCopies,
}

impl KnitPlugin {
    pub fn new(task: Arc<BuildTask>, policy: Arc<ResolutionPolicy>) -> Self {
        Self {
            task,
            policy,
            declaration_copies: DeclarationCopies::default(),
        }
    }

    /// Shared handle to the declaration copies collected during the build.
    pub fn declaration_copies(&self) -> DeclarationCopies {
        Arc::clone(&self.declaration_copies)
    }

    fn resolve(&self, specifier: &str, importer: Option<&str>) -> anyhow::Result<Resolution> {
        // Entries and virtual modules go through ordinary resolution.
        let Some(importer) = importer.filter(|i| !i.starts_with('\0')) else {
            return Ok(Resolution::Defer);
        };

        if knit_matrix::policy::is_relative(specifier) {
            return Ok(self
                .policy
                .rewrite_relative(&self.task, Path::new(importer), specifier));
        }

        Ok(self.policy.classify_external(specifier)?)
    }
}

fn external(id: String) -> HookResolveIdOutput {
    HookResolveIdOutput {
        id: id.into(),
        external: Some(ResolvedExternal::Bool(true)),
        ..Default::default()
    }
}

impl Plugin for KnitPlugin {
    fn name(&self) -> Cow<'static, str> {
        "knit-cross-task".into()
    }

    fn register_hook_usage(&self) -> HookUsage {
        HookUsage::ResolveId | HookUsage::Load
    }

    fn resolve_id(
        &self,
        _ctx: &PluginContext,
        args: &HookResolveIdArgs<'_>,
    ) -> impl std::future::Future<Output = HookResolveIdReturn> + Send {
        let specifier = args.specifier.to_string();
        let resolution = self.resolve(&specifier, args.importer);

        async move {
            match resolution? {
                Resolution::External(id) => {
                    debug!(specifier = %specifier, external = %id, "externalized");
                    Ok(Some(external(id)))
                }
                Resolution::Bundle | Resolution::Defer => Ok(None),
            }
        }
    }

    fn load(
        &self,
        _ctx: &PluginContext,
        args: &HookLoadArgs<'_>,
    ) -> impl std::future::Future<Output = HookLoadReturn> + Send {
        let id = args.id.to_string();
        let task = Arc::clone(&self.task);
        let policy = Arc::clone(&self.policy);
        let copies = Arc::clone(&self.declaration_copies);

        async move {
            if policy.is_declaration_source(&id) {
                let source = PathBuf::from(&id);
                let target = policy.declaration_copy_target(&source);
                debug!(source = %source.display(), target = %target.display(), "declaration copy");
                copies.lock().push((source, target));
                return Ok(Some(HookLoadOutput {
                    code: String::new().into(),
                    module_type: Some(ModuleType::Js),
                    ..Default::default()
                }));
            }

            if !task.executable || Path::new(&id) != task.entry {
                return Ok(None);
            }

            let code = tokio::fs::read_to_string(&id)
                .await
                .with_context(|| format!("Failed to read entry: {}", id))?;
            let Some(code) = ResolutionPolicy::with_executable_marker(&code) else {
                return Ok(None);
            };

            Ok(Some(HookLoadOutput {
                code: code.into(),
                module_type: Some(infer_module_type(&id)),
                ..Default::default()
            }))
        }
    }
}

/// Infers module type from file extension
fn infer_module_type(id: &str) -> ModuleType {
    match Path::new(id).extension().and_then(|e| e.to_str()) {
        Some("tsx") => ModuleType::Tsx,
        Some("ts") | Some("mts") | Some("cts") => ModuleType::Ts,
        Some("jsx") => ModuleType::Jsx,
        _ => ModuleType::Js,
    }
}
