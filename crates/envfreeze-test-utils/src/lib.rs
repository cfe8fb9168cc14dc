//! Testing utilities for envfreeze workspace
//!
//! Scratch buildpack directories and a lock tool stand-in.

#![allow(missing_docs)]

use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{TimeZone, Utc};
use envfreeze_core::{
    FixedClock, FreezeError, FreezeResult, Freezer, Layout, LockRequest, Locker,
};
use tempfile::TempDir;

pub const ENVIRONMENT_YML: &str = "\
# Base environment for the conda buildpack
channels:
  - conda-forge
dependencies:
  - python=3.7
  - ipywidgets==7.6.*
  - pip
  - pip:
      - nbgitpuller==1.0.*
";

pub const HAND_EDITED_LOCK: &str = "# pinned by hand for an ABI break\n@EXPLICIT\n";

/// Clock value used by [`Buildpack::freezer`]
pub fn fixed_clock() -> FixedClock {
    FixedClock(Utc.with_ymd_and_hms(2022, 1, 2, 3, 4, 5).unwrap())
}

/// Temporary buildpack directory seeded with an `environment.yml`
pub struct Buildpack {
    dir: TempDir,
}

impl Buildpack {
    pub fn new() -> Self {
        Self::with_environment(ENVIRONMENT_YML)
    }

    pub fn with_environment(text: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("environment.yml"), text).unwrap();
        Self { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn file(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.file(name);
        fs::write(&path, contents).unwrap();
        path
    }

    pub fn read(&self, name: &str) -> String {
        fs::read_to_string(self.file(name)).unwrap()
    }

    pub fn exists(&self, name: &str) -> bool {
        self.file(name).exists()
    }

    pub fn layout(&self) -> Layout {
        Layout::new(self.path(), "environment.yml")
    }

    pub fn freezer<L: Locker>(&self, locker: L) -> Freezer<L, FixedClock> {
        Freezer::new(self.layout(), locker).with_clock(fixed_clock())
    }
}

impl Default for Buildpack {
    fn default() -> Self {
        Self::new()
    }
}

/// What [`FakeLocker`] does when called
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FakeBehavior {
    /// Write an explicit lock naming the platform
    Write,
    /// Succeed without writing anything
    Silent,
    /// Fail as if the tool exited non-zero
    Fail,
}

/// Records lock requests and writes deterministic output
#[derive(Debug)]
pub struct FakeLocker {
    behavior: FakeBehavior,
    requests: RefCell<Vec<LockRequest>>,
}

impl FakeLocker {
    pub fn new() -> Self {
        Self::with_behavior(FakeBehavior::Write)
    }

    pub fn with_behavior(behavior: FakeBehavior) -> Self {
        Self {
            behavior,
            requests: RefCell::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<LockRequest> {
        self.requests.borrow().clone()
    }

    /// Lock body written for `platform`
    pub fn lock_body(platform: &str) -> String {
        format!("# platform: {platform}\n@EXPLICIT\nhttps://conda.anaconda.org/conda-forge/{platform}/python-3.7.12.tar.bz2\n")
    }
}

impl Default for FakeLocker {
    fn default() -> Self {
        Self::new()
    }
}

impl Locker for FakeLocker {
    fn lock(&self, request: &LockRequest) -> FreezeResult<()> {
        self.requests.borrow_mut().push(request.clone());
        match self.behavior {
            FakeBehavior::Write => {
                let out = request.output_path();
                fs::write(&out, Self::lock_body(&request.platform))
                    .map_err(|e| FreezeError::io_error(out, e))
            }
            FakeBehavior::Silent => Ok(()),
            FakeBehavior::Fail => Err(FreezeError::LockerSpawn {
                program: "fake-conda-lock".to_string(),
                source: std::io::Error::new(std::io::ErrorKind::Other, "resolver unavailable"),
            }),
        }
    }
}
