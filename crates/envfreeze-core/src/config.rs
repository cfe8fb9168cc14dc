//! envfreeze configuration
//!
//! Layered, lowest precedence first: built-in defaults, an optional
//! `envfreeze.toml` in the buildpack directory, `ENVFREEZE_*` environment
//! variables, then whatever the caller applies through the `with_*`
//! builders (the CLI flags).

use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::locker::{CondaLock, Solver};

/// Config file looked up in the buildpack directory
pub const CONFIG_FILE: &str = "envfreeze.toml";

/// Overrides the lock tool program
pub const ENV_CONDA_LOCK: &str = "ENVFREEZE_CONDA_LOCK";

/// Overrides the solver
pub const ENV_SOLVER: &str = "ENVFREEZE_SOLVER";

static PYTHON_VERSION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+(\.\d+)*$").expect("static regex"));

/// Whether `s` looks like a python version (`3`, `3.10`, `3.10.4`)
#[must_use]
pub fn is_python_version(s: &str) -> bool {
    PYTHON_VERSION.is_match(s)
}

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FreezeConfig {
    /// Hand-edited source manifest inside the buildpack directory
    pub manifest: String,
    /// Python versions to regenerate and freeze
    pub python_versions: Vec<String>,
    /// Conda platforms to lock for
    pub platforms: Vec<String>,
    /// Python whose locks are also published as the default lock files
    pub default_python: String,
    /// Lock tool program
    pub conda_lock: String,
    /// Solver backend for the lock tool
    pub solver: Solver,
}

impl FreezeConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from a TOML file
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load `envfreeze.toml` from `dir` if present, defaults otherwise
    ///
    /// # Errors
    /// Returns an error if the file exists but is invalid.
    pub fn discover(dir: &Path) -> Result<Self, ConfigError> {
        let path = dir.join(CONFIG_FILE);
        if path.is_file() {
            tracing::debug!(path = %path.display(), "loading config file");
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Apply `ENVFREEZE_*` overrides from the process environment
    ///
    /// # Errors
    /// Returns an error if an override holds an invalid value.
    pub fn apply_env(self) -> Result<Self, ConfigError> {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    /// Apply `ENVFREEZE_*` overrides from `lookup`
    ///
    /// # Errors
    /// Returns an error if an override holds an invalid value.
    pub fn apply_env_from(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(program) = lookup(ENV_CONDA_LOCK).filter(|v| !v.is_empty()) {
            self.conda_lock = program;
        }
        if let Some(solver) = lookup(ENV_SOLVER).filter(|v| !v.is_empty()) {
            self.solver = solver.parse()?;
        }
        Ok(self)
    }

    /// With python versions
    #[inline]
    #[must_use]
    pub fn with_python_versions(mut self, versions: Vec<String>) -> Self {
        self.python_versions = versions;
        self
    }

    /// With platforms
    #[inline]
    #[must_use]
    pub fn with_platforms(mut self, platforms: Vec<String>) -> Self {
        self.platforms = platforms;
        self
    }

    /// With default python
    #[inline]
    #[must_use]
    pub fn with_default_python(mut self, py: impl Into<String>) -> Self {
        self.default_python = py.into();
        self
    }

    /// With lock tool program
    #[inline]
    #[must_use]
    pub fn with_conda_lock(mut self, program: impl Into<String>) -> Self {
        self.conda_lock = program.into();
        self
    }

    /// With solver
    #[inline]
    #[must_use]
    pub fn with_solver(mut self, solver: Solver) -> Self {
        self.solver = solver;
        self
    }

    /// Lock tool described by this configuration
    #[must_use]
    pub fn locker(&self) -> CondaLock {
        CondaLock::new(&self.conda_lock, self.solver)
    }

    /// Check versions, platforms and the manifest name are usable in file names
    ///
    /// # Errors
    /// Returns the first invalid setting found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.python_versions.is_empty() {
            return Err(ConfigError::Empty("python versions"));
        }
        if self.platforms.is_empty() {
            return Err(ConfigError::Empty("platforms"));
        }
        for py in self.python_versions.iter().chain([&self.default_python]) {
            if !is_python_version(py) {
                return Err(ConfigError::InvalidPython(py.clone()));
            }
        }
        if !is_plain_file_name(&self.manifest) || matches!(self.manifest.as_str(), "." | "..") {
            return Err(ConfigError::InvalidManifest(self.manifest.clone()));
        }
        for platform in &self.platforms {
            if !is_plain_file_name(platform) {
                return Err(ConfigError::InvalidPlatform(platform.clone()));
            }
        }
        Ok(())
    }
}

/// Usable as one component of a buildpack file name
fn is_plain_file_name(s: &str) -> bool {
    !s.is_empty()
        && !s
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '/' | '\\' | '{' | '}'))
}

impl Default for FreezeConfig {
    fn default() -> Self {
        Self {
            manifest: "environment.yml".to_string(),
            python_versions: ["3.7", "3.8", "3.9", "3.10"].map(String::from).to_vec(),
            platforms: ["linux-64", "linux-aarch64"].map(String::from).to_vec(),
            default_python: "3.7".to_string(),
            conda_lock: "conda-lock".to_string(),
            solver: Solver::Mamba,
        }
    }
}
