//! `knit plan`: print the derived build matrix.

use std::io::Write;
use std::path::Path;
use std::process::ExitCode;

use knit_config::SettingsOverrides;
use knit_matrix::BuildMatrix;

use super::{env_overrides, load_matrix};
use crate::cli::PlanArgs;
use crate::error::Result;

pub async fn execute(args: PlanArgs) -> Result<ExitCode> {
    let overrides = SettingsOverrides {
        minify: args.minify.then_some(true),
        env: env_overrides(&args.env),
        ..Default::default()
    };
    let (project, _, matrix) = load_matrix(&args.root, &overrides).await?;

    let mut stdout = std::io::stdout().lock();
    if args.json {
        serde_json::to_writer_pretty(&mut stdout, &matrix)?;
        writeln!(stdout)?;
    } else {
        write_plan(&mut stdout, &matrix, &project.root)?;
    }
    Ok(ExitCode::SUCCESS)
}

fn relative(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}

fn write_plan(out: &mut impl Write, matrix: &BuildMatrix, root: &Path) -> std::io::Result<()> {
    writeln!(out, "tasks ({}):", matrix.tasks.len())?;
    for task in &matrix.tasks {
        let mut flags = vec![task.format.as_str(), task.platform.as_str()];
        if task.minify {
            flags.push("minify");
        }
        if task.sourcemap {
            flags.push("sourcemap");
        }
        if task.executable {
            flags.push("bin");
        }
        writeln!(
            out,
            "  {} -> {} [{}]",
            relative(&task.entry, root),
            relative(&task.output_file, root),
            flags.join(", ")
        )?;
    }

    if !matrix.declarations.is_empty() {
        writeln!(out, "declarations ({}):", matrix.declarations.len())?;
        for entry in &matrix.declarations {
            writeln!(
                out,
                "  {} -> {}",
                relative(&entry.source, root),
                relative(&entry.output, root)
            )?;
        }
    }

    writeln!(out, "registry ({}):", matrix.registry.len())?;
    for (source, slots) in matrix.registry.iter() {
        writeln!(out, "  {}", relative(source, root))?;
        for (slot, output) in slots {
            writeln!(out, "    {}: {}", slot, relative(output, root))?;
        }
    }
    Ok(())
}
