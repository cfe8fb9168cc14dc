//! Error types for envfreeze
//!
//! Every failure is fatal: the driver stops at the first error and the
//! binary exits non-zero. Variants carry the path or program involved so
//! the message is actionable on its own.

use std::path::PathBuf;
use std::process::ExitStatus;

/// Main envfreeze error type
#[derive(Debug, thiserror::Error)]
pub enum FreezeError {
    /// IO error on a buildpack file
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Manifest is not valid YAML
    #[error("invalid yaml in {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// Expected key is missing or has the wrong shape
    #[error("{path}: expected '{key}' to be a {expected}")]
    MissingKey {
        path: PathBuf,
        key: String,
        expected: &'static str,
    },

    /// No python entry among the manifest dependencies
    #[error("python dependency not found in {dependencies:?}")]
    PythonPinMissing {
        path: PathBuf,
        dependencies: Vec<String>,
    },

    /// Lock tool could not be started
    #[error("failed to execute {program}: {source}")]
    LockerSpawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Lock tool exited unsuccessfully
    #[error("{program} failed ({status}): {stderr}")]
    LockerFailed {
        program: String,
        status: ExitStatus,
        stderr: String,
    },

    /// Lock tool succeeded but left no output behind
    #[error("lock tool produced no output at {0}")]
    LockOutputMissing(PathBuf),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl FreezeError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create YAML error for path
    pub fn yaml_error(path: impl Into<PathBuf>, source: serde_yaml::Error) -> Self {
        Self::Yaml {
            path: path.into(),
            source,
        }
    }

    /// Create missing key error
    pub fn missing_key(
        path: impl Into<PathBuf>,
        key: impl Into<String>,
        expected: &'static str,
    ) -> Self {
        Self::MissingKey {
            path: path.into(),
            key: key.into(),
            expected,
        }
    }
}

/// Errors while loading or validating configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML
    #[error("invalid toml in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// Unknown solver name
    #[error("unknown solver '{0}', expected one of: mamba, micromamba, conda")]
    UnknownSolver(String),

    /// Invalid python version string
    #[error("invalid python version '{0}'")]
    InvalidPython(String),

    /// Source manifest is not a plain file name
    #[error("invalid manifest name '{0}'")]
    InvalidManifest(String),

    /// Invalid platform string
    #[error("invalid platform '{0}'")]
    InvalidPlatform(String),

    /// A required list is empty
    #[error("no {0} configured")]
    Empty(&'static str),
}

/// Result type alias for envfreeze operations
pub type FreezeResult<T> = Result<T, FreezeError>;
