//! CLI execution and command dispatch logic.
//!
//! This module keeps [`main`](crate) minimal by providing a single entry
//! point that loads the root descriptor, resolves and flattens the
//! dependency tree, and hands the result to the requested output command.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use camino::Utf8Path;
use tracing::{debug, info};

use crate::cli::{Cli, Commands};
use crate::flatten::{self, StandardsPolicy};
use crate::manifest::{self, FsProjectSource};
use crate::project::Project;
use crate::resolve::{self, Resolved};
use crate::{emit, output};

/// Execute the parsed [`Cli`] commands.
///
/// # Errors
///
/// Returns an error if the descriptor cannot be loaded, resolution or
/// flattening fails, or the output file cannot be written.
pub fn run(cli: &Cli) -> Result<()> {
    if let Some(dir) = &cli.directory {
        std::env::set_current_dir(dir)
            .with_context(|| format!("change directory to {}", dir.display()))?;
    }
    let command = cli.command.clone().unwrap_or(Commands::Flatten);
    let resolved = resolve_tree(cli)?;
    match command {
        Commands::Flatten => {
            let flat = flatten_tree(cli, &resolved)?;
            output::print(&emit::render(&flat)).context("write build description")?;
            Ok(())
        }
        Commands::Emit { file, json } => {
            let flat = flatten_tree(cli, &resolved)?;
            let content = if json {
                let mut text = serde_json::to_string_pretty(&emit::to_json(&flat))
                    .context("serialise build description")?;
                text.push('\n');
                text
            } else {
                emit::render(&flat)
            };
            write_and_log(file.as_std_path(), &content)?;
            Ok(())
        }
        Commands::Graph => {
            output::print(&emit::render_graph(&resolved)).context("write dependency graph")?;
            Ok(())
        }
    }
}

/// Load the root descriptor and resolve the full dependency tree.
fn resolve_tree(cli: &Cli) -> Result<Resolved> {
    let root = load_root(&cli.file, cli.include_optional)?;
    debug!(
        root = %root.name,
        dependencies = root.dependencies.len(),
        "resolving project tree",
    );
    let base = cli
        .file
        .parent()
        .map_or_else(|| Utf8Path::new(".").to_owned(), Utf8Path::to_owned);
    let source = FsProjectSource::new(base, cli.include_optional);
    let resolved = resolve::resolve(root, &source)?;
    Ok(resolved)
}

/// Read and convert the root project descriptor.
fn load_root(file: &Utf8Path, include_optional: bool) -> Result<Project> {
    let root_manifest =
        manifest::load(file).with_context(|| format!("load root descriptor {file}"))?;
    Ok(manifest::into_project(root_manifest, include_optional))
}

/// Flatten a resolved tree under the CLI's standards policy.
fn flatten_tree(cli: &Cli, resolved: &Resolved) -> Result<Project> {
    let policy = if cli.strict_standards {
        StandardsPolicy::Strict
    } else {
        StandardsPolicy::RootWins
    };
    let flat = flatten::flatten(resolved, policy)?;
    Ok(flat)
}

/// Write `content` to `path` and log the file's location.
fn write_and_log(path: &Path, content: &str) -> Result<()> {
    fs::write(path, content)
        .with_context(|| format!("write build description to {}", path.display()))?;
    info!("Wrote build description to {}", path.display());
    Ok(())
}
