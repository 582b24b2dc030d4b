// src/main.rs

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands, TargetArgs};
use galley::recipe::{parse_manifest_file, validate_manifest};
use galley::{RecipeManifest, Settings, Workflow, WorkflowConfig};
use std::path::{Path, PathBuf};
use tracing::warn;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Cook {
            recipe,
            target,
            out,
            keep_workdir,
            tool,
        } => {
            let (manifest, recipe_dir) = load_recipe(&recipe)?;
            let config = WorkflowConfig {
                output_root: out,
                keep_workdir,
                tool_path: tool,
                progress: true,
                ..WorkflowConfig::default()
            };

            let mut workflow = prepare(manifest, recipe_dir, target, config)?;
            let cooked = workflow.run()?;

            println!(
                "Cooked {} {} -> {}",
                cooked.metadata.file_name,
                workflow.version(),
                cooked.package_dir.display()
            );
            Ok(())
        }

        Commands::Info { recipe, target } => {
            let (manifest, recipe_dir) = load_recipe(&recipe)?;
            let mut workflow =
                prepare(manifest, recipe_dir, target, WorkflowConfig::default())?;

            workflow.validate()?;
            workflow.configure()?;

            println!(
                "{}",
                serde_json::to_string_pretty(&workflow.package_info())?
            );
            Ok(())
        }
    }
}

fn load_recipe(path: &Path) -> Result<(RecipeManifest, PathBuf)> {
    let manifest = parse_manifest_file(path)?;
    for warning in validate_manifest(&manifest)? {
        warn!("{warning}");
    }

    let recipe_dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."))
        .to_path_buf();
    Ok((manifest, recipe_dir))
}

fn prepare(
    manifest: RecipeManifest,
    recipe_dir: PathBuf,
    target: TargetArgs,
    config: WorkflowConfig,
) -> Result<Workflow> {
    let settings = Settings::new(target.os, target.arch, target.compiler, target.build_type);
    let mut workflow = Workflow::new(manifest, recipe_dir, target.version, settings, config);

    for item in &target.options {
        let (name, value) = item
            .split_once('=')
            .with_context(|| format!("invalid option override `{item}` (expected name=value)"))?;
        workflow.set_option(name, value)?;
    }

    Ok(workflow)
}
