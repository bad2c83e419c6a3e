//! Concurrent task dispatch.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use knit_matrix::source::is_declaration_file;
use knit_matrix::{BuildMatrix, ResolvedEntry};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info};

use crate::diagnostics::{BuildSummary, TaskOutcome};
use crate::output::{self, PlannedFile};
use crate::runner::run_task;

#[derive(Debug, Clone, Default)]
pub struct DispatchOptions {
    /// Upper bound on concurrently running tasks. Defaults to
    /// `min(num_cpus, 8)`.
    pub max_parallel: Option<usize>,
}

impl DispatchOptions {
    pub fn max_parallel(&self) -> usize {
        self.max_parallel
            .unwrap_or_else(|| num_cpus::get().min(8))
            .max(1)
    }
}

/// Run every task of `matrix` and fold the outcomes.
///
/// Tasks are independent: a failure, or a panic, in one task is recorded
/// against that task and the others run to completion.
pub async fn dispatch(matrix: &BuildMatrix, cwd: &Path, options: &DispatchOptions) -> BuildSummary {
    let max_parallel = options.max_parallel();
    let semaphore = Arc::new(Semaphore::new(max_parallel));
    info!(
        tasks = matrix.tasks.len(),
        max_parallel, "dispatching build tasks"
    );

    let mut join_set = JoinSet::new();
    for (index, task) in matrix.tasks.iter().enumerate() {
        let task = Arc::new(task.clone());
        let policy = Arc::clone(&matrix.policy);
        let semaphore = Arc::clone(&semaphore);
        let cwd = cwd.to_path_buf();

        join_set.spawn(async move {
            let _permit = match semaphore.acquire_owned().await {
                Ok(permit) => permit,
                Err(e) => {
                    return (
                        index,
                        TaskOutcome::failed(task.label(), task.output_file.clone(), e.to_string()),
                    );
                }
            };
            (index, run_task(task, policy, cwd).await)
        });
    }

    let mut outcomes: Vec<Option<TaskOutcome>> = vec![None; matrix.tasks.len()];
    let mut join_failures = Vec::new();
    while let Some(result) = join_set.join_next().await {
        match result {
            Ok((index, outcome)) => outcomes[index] = Some(outcome),
            Err(e) => {
                error!("Build task panicked: {}", e);
                join_failures.push(e.to_string());
            }
        }
    }

    // A panicked task cannot report its index; pair the failures with the
    // tasks that produced no outcome.
    let mut join_failures = join_failures.into_iter();
    let mut summary: BuildSummary = outcomes
        .into_iter()
        .zip(&matrix.tasks)
        .map(|(outcome, task)| {
            outcome.unwrap_or_else(|| {
                let message = join_failures
                    .next()
                    .unwrap_or_else(|| "task did not complete".to_string());
                TaskOutcome::failed(task.label(), task.output_file.clone(), message)
            })
        })
        .collect();

    for outcome in copy_declaration_entries(&matrix.declarations).await {
        summary.push(outcome);
    }

    summary
}

/// Copy declaration-only entries whose source is itself a declaration file.
///
/// Declarations generated from `.ts` sources need a type checker and are not
/// emitted here.
async fn copy_declaration_entries(entries: &[ResolvedEntry]) -> Vec<TaskOutcome> {
    let copies: Vec<ResolvedEntry> = entries
        .iter()
        .filter(|entry| {
            let copyable = is_declaration_file(&entry.source.to_string_lossy());
            if !copyable {
                debug!(source = %entry.source.display(), "declaration has no declaration source");
            }
            copyable
        })
        .cloned()
        .collect();
    if copies.is_empty() {
        return Vec::new();
    }

    let result = tokio::task::spawn_blocking(move || {
        copies
            .into_iter()
            .map(|entry| {
                let started = Instant::now();
                let label = format!("{} -> {}", entry.source.display(), entry.output.display());
                info!("{}", label);
                let written = std::fs::read(&entry.source)
                    .map_err(|e| crate::Error::write_failure(&entry.source, e))
                    .and_then(|contents| {
                        output::write_files_atomic(&[PlannedFile {
                            path: entry.output.clone(),
                            contents,
                            executable: false,
                        }])
                    });
                match written {
                    Ok(()) => TaskOutcome {
                        label,
                        output_file: entry.output,
                        diagnostics: Vec::new(),
                        duration: started.elapsed(),
                    },
                    Err(e) => {
                        error!("{}", e);
                        TaskOutcome::failed(label, entry.output, e.to_string())
                    }
                }
            })
            .collect()
    })
    .await;

    match result {
        Ok(outcomes) => outcomes,
        Err(e) => {
            error!("Declaration copy panicked: {}", e);
            vec![TaskOutcome::failed("declarations", Default::default(), e.to_string())]
        }
    }
}
