//! Driver for the external lock tool
//!
//! [`Locker`] is the seam between envfreeze and the resolver. The real
//! implementation shells out to `conda-lock`; tests substitute a fake.

use std::fmt;
use std::path::PathBuf;
use std::process::Command;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, FreezeError, FreezeResult};

/// Placeholder the lock tool substitutes in `--filename-template`
pub const PLATFORM_PLACEHOLDER: &str = "{platform}";

const STDERR_TAIL_LINES: usize = 20;

/// One invocation of the lock tool
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockRequest {
    /// Manifest to resolve
    pub manifest: PathBuf,
    /// Target conda platform, e.g. `linux-64`
    pub platform: String,
    /// Output template containing [`PLATFORM_PLACEHOLDER`]
    pub filename_template: String,
}

impl LockRequest {
    /// Path the tool writes once the placeholder is filled in
    #[must_use]
    pub fn output_path(&self) -> PathBuf {
        PathBuf::from(
            self.filename_template
                .replace(PLATFORM_PLACEHOLDER, &self.platform),
        )
    }
}

/// Resolves a manifest into an explicit lock file
#[cfg_attr(test, mockall::automock)]
pub trait Locker {
    /// Run the resolver; on success the output exists at [`LockRequest::output_path`]
    ///
    /// # Errors
    /// Returns an error if the resolver cannot be run or fails.
    fn lock(&self, request: &LockRequest) -> FreezeResult<()>;
}

impl<L: Locker + ?Sized> Locker for &L {
    fn lock(&self, request: &LockRequest) -> FreezeResult<()> {
        (**self).lock(request)
    }
}

/// Solver backend passed to conda-lock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Solver {
    /// `--mamba`
    #[default]
    Mamba,
    /// `--micromamba`
    Micromamba,
    /// plain conda, no flag
    Conda,
}

impl Solver {
    fn flag(self) -> Option<&'static str> {
        match self {
            Self::Mamba => Some("--mamba"),
            Self::Micromamba => Some("--micromamba"),
            Self::Conda => None,
        }
    }
}

impl fmt::Display for Solver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Mamba => "mamba",
            Self::Micromamba => "micromamba",
            Self::Conda => "conda",
        })
    }
}

impl FromStr for Solver {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mamba" => Ok(Self::Mamba),
            "micromamba" => Ok(Self::Micromamba),
            "conda" => Ok(Self::Conda),
            other => Err(ConfigError::UnknownSolver(other.to_string())),
        }
    }
}

/// `conda-lock` run as a child process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CondaLock {
    program: String,
    solver: Solver,
}

impl CondaLock {
    /// Use `program` with the given solver
    #[must_use]
    pub fn new(program: impl Into<String>, solver: Solver) -> Self {
        Self {
            program: program.into(),
            solver,
        }
    }

    /// Program that will be executed
    #[inline]
    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Arguments for `request`, without the program name
    #[must_use]
    pub fn args(&self, request: &LockRequest) -> Vec<String> {
        let mut args = Vec::with_capacity(5);
        if let Some(flag) = self.solver.flag() {
            args.push(flag.to_string());
        }
        args.push("--kind=explicit".to_string());
        args.push(format!("--platform={}", request.platform));
        args.push(format!("--filename-template={}", request.filename_template));
        args.push(format!("--file={}", request.manifest.display()));
        args
    }
}

impl Default for CondaLock {
    fn default() -> Self {
        Self::new("conda-lock", Solver::default())
    }
}

impl Locker for CondaLock {
    fn lock(&self, request: &LockRequest) -> FreezeResult<()> {
        let args = self.args(request);
        tracing::debug!(program = %self.program, ?args, "running lock tool");

        let out = Command::new(&self.program)
            .args(&args)
            .output()
            .map_err(|source| FreezeError::LockerSpawn {
                program: self.program.clone(),
                source,
            })?;

        if !out.status.success() {
            return Err(FreezeError::LockerFailed {
                program: self.program.clone(),
                status: out.status,
                stderr: tail(&String::from_utf8_lossy(&out.stderr), STDERR_TAIL_LINES),
            });
        }
        Ok(())
    }
}

fn tail(text: &str, lines: usize) -> String {
    let all: Vec<&str> = text.trim_end().lines().collect();
    all[all.len().saturating_sub(lines)..].join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn request() -> LockRequest {
        LockRequest {
            manifest: PathBuf::from("/bp/environment.py-3.8.yml"),
            platform: "linux-64".to_string(),
            filename_template: "/bp/environment.py-3.8-linux-64.lock.{platform}".to_string(),
        }
    }

    #[test]
    fn conda_lock_arguments() {
        let args = CondaLock::default().args(&request());
        assert_eq!(
            args,
            vec![
                "--mamba",
                "--kind=explicit",
                "--platform=linux-64",
                "--filename-template=/bp/environment.py-3.8-linux-64.lock.{platform}",
                "--file=/bp/environment.py-3.8.yml",
            ]
        );
    }

    #[test]
    fn plain_conda_has_no_solver_flag() {
        let args = CondaLock::new("conda-lock", Solver::Conda).args(&request());
        assert_eq!(args[0], "--kind=explicit");
    }

    #[test]
    fn output_path_fills_placeholder() {
        assert_eq!(
            request().output_path(),
            PathBuf::from("/bp/environment.py-3.8-linux-64.lock.linux-64")
        );
    }

    #[test]
    fn solver_parsing() {
        assert_eq!("Micromamba".parse::<Solver>().unwrap(), Solver::Micromamba);
        assert_eq!(Solver::Conda.to_string(), "conda");
        assert!(matches!(
            "pip".parse::<Solver>(),
            Err(ConfigError::UnknownSolver(ref s)) if s == "pip"
        ));
    }

    #[test]
    fn missing_program_is_a_spawn_error() {
        let locker = CondaLock::new("envfreeze-no-such-lock-tool", Solver::Mamba);
        let err = locker.lock(&request()).unwrap_err();
        assert!(matches!(err, FreezeError::LockerSpawn { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn failing_program_reports_status() {
        let locker = CondaLock::new("false", Solver::Conda);
        let err = locker.lock(&request()).unwrap_err();
        assert!(matches!(err, FreezeError::LockerFailed { ref program, .. } if program == "false"));
    }

    #[cfg(unix)]
    fn script(dir: &tempfile::TempDir, body: &str) -> String {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.path().join("fake-conda-lock");
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path.display().to_string()
    }

    #[cfg(unix)]
    #[test]
    fn successful_run_writes_through_template() {
        let dir = tempfile::tempdir().unwrap();
        let program = script(
            &dir,
            r#"for a in "$@"; do case "$a" in --filename-template=*) t="${a#*=}";; --platform=*) p="${a#*=}";; esac; done
echo "@EXPLICIT" > "$(echo "$t" | sed "s/{platform}/$p/")""#,
        );
        let out = dir.path().join("environment.py-3.8-linux-64.lock");
        let request = LockRequest {
            manifest: dir.path().join("environment.py-3.8.yml"),
            platform: "linux-64".to_string(),
            filename_template: format!("{}.{{platform}}", out.display()),
        };

        CondaLock::new(program, Solver::Mamba).lock(&request).unwrap();

        assert_eq!(
            std::fs::read_to_string(request.output_path()).unwrap(),
            "@EXPLICIT\n"
        );
    }

    #[cfg(unix)]
    #[test]
    fn failure_keeps_stderr_tail() {
        let dir = tempfile::tempdir().unwrap();
        let program = script(
            &dir,
            "i=0; while [ $i -lt 30 ]; do echo \"noise $i\" >&2; i=$((i+1)); done\n\
             echo 'PackagesNotFoundError: nope' >&2\nexit 3",
        );

        let err = CondaLock::new(&program, Solver::Mamba)
            .lock(&request())
            .unwrap_err();

        match err {
            FreezeError::LockerFailed { program: p, status, stderr } => {
                assert_eq!(p, program);
                assert_eq!(status.code(), Some(3));
                let lines: Vec<&str> = stderr.lines().collect();
                assert_eq!(lines.len(), STDERR_TAIL_LINES);
                assert_eq!(lines[0], "noise 11");
                assert_eq!(lines.last(), Some(&"PackagesNotFoundError: nope"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn stderr_tail_keeps_last_lines() {
        assert_eq!(tail("a\nb\nc\n", 2), "b\nc");
        assert_eq!(tail("only", 5), "only");
    }
}
