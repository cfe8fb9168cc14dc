//! Regenerate, freeze and promote buildpack files
//!
//! Each operation checks the target's [`Ownership`] first and leaves
//! hand-edited files untouched.

use std::fs;
use std::path::Path;

use tracing::{debug, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::error::{FreezeError, FreezeResult};
use crate::layout::{staging_for, Layout};
use crate::locker::{LockRequest, Locker, PLATFORM_PLACEHOLDER};
use crate::manifest::Manifest;
use crate::marker::{inspect, GeneratedHeader, Ownership, StampKind};
use crate::report::Outcome;

/// Performs the file operations of a run against one buildpack directory
#[derive(Debug)]
pub struct Freezer<L, C = SystemClock> {
    layout: Layout,
    locker: L,
    clock: C,
}

impl<L: Locker> Freezer<L> {
    /// Freezer using the system clock
    #[must_use]
    pub fn new(layout: Layout, locker: L) -> Self {
        Self {
            layout,
            locker,
            clock: SystemClock,
        }
    }
}

impl<L: Locker, C: Clock> Freezer<L, C> {
    /// Replace the clock used for header timestamps
    #[must_use]
    pub fn with_clock<C2: Clock>(self, clock: C2) -> Freezer<L, C2> {
        Freezer {
            layout: self.layout,
            locker: self.locker,
            clock,
        }
    }

    /// Buildpack layout
    #[inline]
    #[must_use]
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Write `target` as the source manifest with python pinned to `py.*`.
    ///
    /// # Errors
    /// Fails if the source manifest is unreadable, has no python
    /// dependency, or the target cannot be written.
    pub fn set_python(&self, target: &Path, py: &str) -> FreezeResult<Outcome> {
        if inspect(target)? == Ownership::HandEdited {
            debug!(path = %target.display(), "not autogenerated, leaving manifest alone");
            return Ok(Outcome::Skipped);
        }

        let source = self.layout.environment();
        info!(
            "Regenerating {} from {}",
            self.layout.display(target),
            self.layout.display(&source)
        );

        let body = Manifest::load(&source)?.pin_python(py)?;
        let header = GeneratedHeader::new(
            self.layout.display(&source),
            StampKind::Generated,
            self.clock.now(),
        );
        write(target, &format!("{}{body}", header.render()))?;
        Ok(Outcome::Written)
    }

    /// Lock `manifest` for `platform` into `lock`.
    ///
    /// # Errors
    /// Fails if the lock tool fails or leaves no output, or on IO errors.
    pub fn freeze(&self, manifest: &Path, lock: &Path, platform: &str) -> FreezeResult<Outcome> {
        if inspect(lock)? == Ownership::HandEdited {
            warn!(
                "{} not autogenerated, not refreezing",
                self.layout.display(lock)
            );
            return Ok(Outcome::Skipped);
        }

        info!(
            "Freezing {} -> {}",
            self.layout.display(manifest),
            self.layout.display(lock)
        );

        let request = LockRequest {
            manifest: manifest.to_path_buf(),
            platform: platform.to_string(),
            filename_template: format!("{}.{PLATFORM_PLACEHOLDER}", lock.display()),
        };
        self.locker.lock(&request)?;

        let staged = staging_for(lock, platform);
        let locked = match fs::read_to_string(&staged) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(FreezeError::LockOutputMissing(staged));
            }
            Err(e) => return Err(FreezeError::io_error(&staged, e)),
        };

        let header = GeneratedHeader::new(
            self.layout.display(manifest),
            StampKind::Frozen,
            self.clock.now(),
        );
        write(lock, &format!("{}{locked}", header.render()))?;
        fs::remove_file(&staged).map_err(|e| FreezeError::io_error(&staged, e))?;
        Ok(Outcome::Written)
    }

    /// Copy `lock` to the default lock file for `platform`.
    ///
    /// # Errors
    /// Fails if the copy fails.
    pub fn promote(&self, lock: &Path, platform: &str) -> FreezeResult<Outcome> {
        let dest = self.layout.default_lock(platform);
        if inspect(&dest)? == Ownership::HandEdited {
            warn!("{} not autogenerated, not replacing", self.layout.display(&dest));
            return Ok(Outcome::Skipped);
        }

        debug!(from = %lock.display(), to = %dest.display(), "promoting default lock");
        fs::copy(lock, &dest).map_err(|e| FreezeError::io_error(&dest, e))?;
        Ok(Outcome::Written)
    }
}

fn write(path: &Path, contents: &str) -> FreezeResult<()> {
    fs::write(path, contents).map_err(|e| FreezeError::io_error(path, e))
}
