//! Build task matrix.

use std::sync::Arc;

use indexmap::IndexMap;
use knit_config::{BuildSettings, Project};
use serde::Serialize;

use crate::error::Result;
use crate::exports::ExportResolver;
use crate::policy::ResolutionPolicy;
use crate::registry::ExportRegistry;
use crate::task::{BuildTask, EntryTarget, ResolvedEntry};

/// Options applied uniformly to every task.
#[derive(Debug, Clone, Default)]
pub struct MatrixOptions {
    pub minify: bool,
    pub env: IndexMap<String, String>,
}

impl From<&BuildSettings> for MatrixOptions {
    fn from(settings: &BuildSettings) -> Self {
        Self {
            minify: settings.minify,
            env: settings.env.clone(),
        }
    }
}

impl MatrixOptions {
    /// `process.env.KEY` substitutions. `NODE_ENV` follows the minify flag
    /// unless set explicitly.
    pub fn define_pairs(&self) -> Vec<(String, String)> {
        let mut env = self.env.clone();
        if !env.contains_key("NODE_ENV") {
            let mode = if self.minify {
                "production"
            } else {
                "development"
            };
            env.insert("NODE_ENV".to_string(), mode.to_string());
        }

        env.iter()
            .map(|(key, value)| {
                (
                    format!("process.env.{key}"),
                    serde_json::Value::String(value.clone()).to_string(),
                )
            })
            .collect()
    }
}

/// Everything a build needs: tasks to dispatch and the shared policy.
#[derive(Debug, Clone, Serialize)]
pub struct BuildMatrix {
    pub tasks: Vec<BuildTask>,
    /// Declaration outputs; they populate the registry but are not bundled.
    pub declarations: Vec<ResolvedEntry>,
    pub registry: Arc<ExportRegistry>,
    #[serde(skip)]
    pub policy: Arc<ResolutionPolicy>,
}

impl BuildMatrix {
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

/// Expand the project's manifest into tasks and freeze the registry.
pub async fn build_matrix(project: &Project, options: &MatrixOptions) -> Result<BuildMatrix> {
    let resolved = ExportResolver::new(project).resolve().await?;

    let target = project.tsconfig.target();
    let sourcemap = project.tsconfig.source_map();
    let define = options.define_pairs();
    let out_dir = project.out_dir();

    let mut tasks = Vec::new();
    let mut declarations = Vec::new();
    for entry in resolved.entries {
        let EntryTarget::Platform(platform) = entry.target else {
            declarations.push(entry);
            continue;
        };
        tracing::debug!(
            source = %entry.source.display(),
            output = %entry.output.display(),
            format = %entry.format,
            platform = %platform,
            "task"
        );
        tasks.push(BuildTask {
            entry: entry.source,
            entry_name: entry.entry_name,
            out_dir: out_dir.clone(),
            output_file: entry.output,
            output_extension: entry.output_extension,
            format: entry.format,
            platform,
            minify: options.minify,
            sourcemap,
            target: target.clone(),
            define: define.clone(),
            executable: entry.executable,
        });
    }

    let registry = Arc::new(resolved.registry);
    let policy = Arc::new(ResolutionPolicy::new(project, Arc::clone(&registry)));
    tracing::debug!(
        tasks = tasks.len(),
        declarations = declarations.len(),
        sources = registry.len(),
        "build matrix ready"
    );

    Ok(BuildMatrix {
        tasks,
        declarations,
        registry,
        policy,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_env_follows_minify() {
        let options = MatrixOptions {
            minify: true,
            ..Default::default()
        };
        assert_eq!(
            options.define_pairs(),
            [("process.env.NODE_ENV".to_string(), "\"production\"".to_string())]
        );

        let options = MatrixOptions::default();
        assert_eq!(options.define_pairs()[0].1, "\"development\"");
    }

    #[test]
    fn explicit_node_env_wins() {
        let mut env = IndexMap::new();
        env.insert("NODE_ENV".to_string(), "test".to_string());
        env.insert("API".to_string(), "say \"hi\"".to_string());
        let options = MatrixOptions { minify: true, env };

        let pairs = options.define_pairs();
        assert_eq!(pairs[0], ("process.env.NODE_ENV".to_string(), "\"test\"".to_string()));
        assert_eq!(pairs[1], ("process.env.API".to_string(), r#""say \"hi\"""#.to_string()));
    }
}
