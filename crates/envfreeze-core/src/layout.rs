//! Buildpack file naming
//!
//! ```text
//! environment.yml                        hand-edited source
//! environment.py-3.8.yml                 per-python manifest
//! environment.py-3.8-linux-64.lock       per-python lock file
//! environment-linux-64.lock              default python lock file
//! ```

use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// File names inside a buildpack directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    root: PathBuf,
    manifest: String,
}

impl Layout {
    /// Layout rooted at `root` with the given source manifest name
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, manifest: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            manifest: manifest.into(),
        }
    }

    /// Buildpack directory
    #[inline]
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Hand-edited source manifest
    #[must_use]
    pub fn environment(&self) -> PathBuf {
        self.root.join(&self.manifest)
    }

    /// Manifest pinned to python `py`
    #[must_use]
    pub fn python_manifest(&self, py: &str) -> PathBuf {
        let name = match self.extension() {
            Some(ext) => format!("{}.py-{py}.{ext}", self.stem()),
            None => format!("{}.py-{py}", self.stem()),
        };
        self.root.join(name)
    }

    /// Lock file for python `py` on `platform`
    #[must_use]
    pub fn python_lock(&self, py: &str, platform: &str) -> PathBuf {
        self.root
            .join(format!("{}.py-{py}-{platform}.lock", self.stem()))
    }

    /// Lock file produced from the default python's manifest
    #[must_use]
    pub fn default_lock(&self, platform: &str) -> PathBuf {
        self.root.join(format!("{}-{platform}.lock", self.stem()))
    }

    fn stem(&self) -> String {
        Path::new(&self.manifest).file_stem().map_or_else(
            || self.manifest.clone(),
            |s| s.to_string_lossy().into_owned(),
        )
    }

    fn extension(&self) -> Option<String> {
        Path::new(&self.manifest)
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
    }

    /// Path shown in logs and headers: relative to the root when possible
    #[must_use]
    pub fn display(&self, path: &Path) -> String {
        path.strip_prefix(&self.root)
            .unwrap_or(path)
            .display()
            .to_string()
    }
}

/// Where the lock tool writes before the header is stamped on
#[must_use]
pub fn staging_for(lock: &Path, platform: &str) -> PathBuf {
    with_suffix(lock, &format!(".{platform}"))
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> Layout {
        Layout::new("/bp", "environment.yml")
    }

    #[test]
    fn python_manifest_name() {
        assert_eq!(
            layout().python_manifest("3.10"),
            PathBuf::from("/bp/environment.py-3.10.yml")
        );
    }

    #[test]
    fn python_lock_name() {
        assert_eq!(
            layout().python_lock("3.8", "linux-aarch64"),
            PathBuf::from("/bp/environment.py-3.8-linux-aarch64.lock")
        );
    }

    #[test]
    fn default_lock_name() {
        assert_eq!(
            layout().default_lock("linux-64"),
            PathBuf::from("/bp/environment-linux-64.lock")
        );
    }

    #[test]
    fn staging_appends_platform() {
        let lock = PathBuf::from("/bp/environment.py-3.8-linux-64.lock");
        assert_eq!(
            staging_for(&lock, "linux-64"),
            PathBuf::from("/bp/environment.py-3.8-linux-64.lock.linux-64")
        );
    }

    #[test]
    fn display_is_relative_to_root() {
        let l = layout();
        assert_eq!(l.display(&l.python_manifest("3.9")), "environment.py-3.9.yml");
        assert_eq!(l.display(Path::new("/elsewhere/x.yml")), "/elsewhere/x.yml");
    }

    #[test]
    fn manifest_without_extension() {
        let l = Layout::new("/bp", "env");
        assert_eq!(l.python_manifest("3.9"), PathBuf::from("/bp/env.py-3.9"));
        assert_eq!(l.default_lock("linux-64"), PathBuf::from("/bp/env-linux-64.lock"));
    }

    #[test]
    fn python_versions_get_distinct_locks() {
        for manifest in ["environment.yml", "env"] {
            let l = Layout::new("/bp", manifest);
            assert_ne!(
                l.python_lock("3.8", "linux-64"),
                l.python_lock("3.9", "linux-64")
            );
        }
        let l = Layout::new("/bp", "env");
        assert_eq!(
            l.python_lock("3.10", "linux-64"),
            PathBuf::from("/bp/env.py-3.10-linux-64.lock")
        );
    }
}
