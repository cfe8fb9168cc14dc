//! Command-line surface

use std::path::{Path, PathBuf};

use clap::{ArgAction, Parser, ValueEnum};
use envfreeze_core::{is_python_version, ConfigError, FreezeConfig, Solver};
use tracing::level_filters::LevelFilter;

#[derive(Parser, Debug)]
#[command(name = "envfreeze", version)]
#[command(about = "Regenerate and freeze conda buildpack environments")]
pub struct Cli {
    /// Python versions (e.g. 3.9) and platforms (e.g. linux-64) to update and freeze
    #[arg(value_name = "PY|PLATFORM")]
    pub targets: Vec<String>,

    /// Buildpack directory holding environment.yml
    #[arg(long, value_name = "DIR")]
    pub dir: Option<PathBuf>,

    /// Config file, instead of <DIR>/envfreeze.toml
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Lock tool program
    #[arg(long, value_name = "PROGRAM")]
    pub conda_lock: Option<String>,

    /// Solver backend for the lock tool
    #[arg(long, value_enum)]
    pub solver: Option<SolverArg>,

    /// Python whose locks become the default lock files
    #[arg(long, value_name = "PY")]
    pub default_python: Option<String>,

    /// Print the run report as JSON
    #[arg(long)]
    pub json: bool,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// More logging (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum SolverArg {
    Mamba,
    Micromamba,
    Conda,
}

impl From<SolverArg> for Solver {
    fn from(value: SolverArg) -> Self {
        match value {
            SolverArg::Mamba => Self::Mamba,
            SolverArg::Micromamba => Self::Micromamba,
            SolverArg::Conda => Self::Conda,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

impl Cli {
    /// Log level implied by `-v`/`-q`
    #[must_use]
    pub fn level(&self) -> LevelFilter {
        if self.quiet {
            return LevelFilter::WARN;
        }
        match self.verbose {
            0 => LevelFilter::INFO,
            1 => LevelFilter::DEBUG,
            _ => LevelFilter::TRACE,
        }
    }

    /// Buildpack directory, defaulting to the working directory
    ///
    /// # Errors
    /// Fails if no `--dir` is given and the working directory is unavailable.
    pub fn buildpack_dir(&self) -> std::io::Result<PathBuf> {
        match &self.dir {
            Some(dir) => Ok(dir.clone()),
            None => std::env::current_dir(),
        }
    }

    /// Layer flags and positionals over file and environment configuration
    ///
    /// # Errors
    /// Fails if the config file or an override is invalid.
    pub fn resolve_config(&self, dir: &Path) -> Result<FreezeConfig, ConfigError> {
        let base = match &self.config {
            Some(path) => FreezeConfig::load(path)?,
            None => FreezeConfig::discover(dir)?,
        };
        let mut config = base.apply_env()?;

        let (pys, platforms) = split_targets(&self.targets);
        if !pys.is_empty() {
            config = config.with_python_versions(pys);
        }
        if !platforms.is_empty() {
            config = config.with_platforms(platforms);
        }
        if let Some(program) = &self.conda_lock {
            config = config.with_conda_lock(program);
        }
        if let Some(solver) = self.solver {
            config = config.with_solver(solver.into());
        }
        if let Some(py) = &self.default_python {
            config = config.with_default_python(py);
        }

        config.validate()?;
        Ok(config)
    }
}

/// Split positionals into python versions and platforms, keeping order
#[must_use]
pub fn split_targets(targets: &[String]) -> (Vec<String>, Vec<String>) {
    targets
        .iter()
        .cloned()
        .partition(|t| is_python_version(t))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("envfreeze").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn positionals_are_classified() {
        let targets: Vec<String> = ["3.9", "linux-64", "3.10", "osx-arm64"]
            .map(String::from)
            .to_vec();
        let (pys, platforms) = split_targets(&targets);
        assert_eq!(pys, vec!["3.9", "3.10"]);
        assert_eq!(platforms, vec!["linux-64", "osx-arm64"]);
    }

    #[test]
    fn verbosity_levels() {
        assert_eq!(parse(&[]).level(), LevelFilter::INFO);
        assert_eq!(parse(&["-v"]).level(), LevelFilter::DEBUG);
        assert_eq!(parse(&["-vvv"]).level(), LevelFilter::TRACE);
        assert_eq!(parse(&["-q"]).level(), LevelFilter::WARN);
    }

    #[test]
    fn quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["envfreeze", "-q", "-v"]).is_err());
    }

    #[test]
    fn flags_parse() {
        let cli = parse(&[
            "--dir",
            "/bp",
            "--solver",
            "micromamba",
            "--log-format",
            "json",
            "--json",
            "3.8",
        ]);
        assert_eq!(cli.dir, Some(PathBuf::from("/bp")));
        assert_eq!(cli.solver, Some(SolverArg::Micromamba));
        assert_eq!(cli.log_format, LogFormat::Json);
        assert!(cli.json);
        assert_eq!(cli.targets, vec!["3.8"]);
    }

    proptest! {
        #[test]
        fn split_is_a_partition(targets in proptest::collection::vec("[0-9a-z.-]{1,10}", 0..8)) {
            let (pys, platforms) = split_targets(&targets);
            prop_assert_eq!(pys.len() + platforms.len(), targets.len());
            prop_assert!(pys.iter().all(|p| is_python_version(p)));
            prop_assert!(platforms.iter().all(|p| !is_python_version(p)));
        }
    }
}
