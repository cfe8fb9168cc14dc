//! Wires configuration, layout and lock tool into a run

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use envfreeze_core::{run, FreezeConfig, FreezeReport, Freezer, Layout, Locker, Plan};

use crate::cli::Cli;

/// Resolve the buildpack directory and effective configuration
///
/// # Errors
/// Fails on an unusable directory or invalid configuration.
pub fn prepare(cli: &Cli) -> anyhow::Result<(PathBuf, FreezeConfig)> {
    let dir = cli
        .buildpack_dir()
        .context("cannot determine working directory")?;
    let config = cli
        .resolve_config(&dir)
        .context("invalid configuration")?;
    Ok((dir, config))
}

/// Run against `dir` with the configured `conda-lock`
///
/// # Errors
/// Fails on the first error of any step.
pub fn execute(cli: &Cli) -> anyhow::Result<FreezeReport> {
    let (dir, config) = prepare(cli)?;
    let locker = config.locker();
    execute_with(&dir, &config, locker)
}

/// Run against `dir` with an explicit lock tool
///
/// # Errors
/// Fails if the source manifest is missing or on the first failing step.
pub fn execute_with<L: Locker>(
    dir: &Path,
    config: &FreezeConfig,
    locker: L,
) -> anyhow::Result<FreezeReport> {
    let layout = Layout::new(dir, &config.manifest);
    let source = layout.environment();
    if !source.is_file() {
        bail!("{} not found", source.display());
    }

    tracing::debug!(
        dir = %dir.display(),
        pythons = ?config.python_versions,
        platforms = ?config.platforms,
        "starting freeze"
    );

    let freezer = Freezer::new(layout, locker);
    run(&freezer, &Plan::from(config)).context("freeze failed")
}
