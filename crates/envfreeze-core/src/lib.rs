//! envfreeze core - regenerate and freeze conda buildpack environments
//!
//! Starting from a hand-edited `environment.yml`, envfreeze:
//! 1. writes `environment.py-{py}.yml` with python pinned to `{py}.*`
//! 2. locks each of those per platform with `conda-lock` into
//!    `environment.py-{py}-{platform}.lock`
//! 3. copies the default python's locks to `environment-{platform}.lock`
//!
//! Every output starts with a `GENERATED` header line. Files lacking it
//! are considered hand edited and are never overwritten.
//!
//! # Example
//!
//! ```rust,ignore
//! use envfreeze_core::prelude::*;
//!
//! let config = FreezeConfig::discover(dir)?.apply_env()?;
//! let freezer = Freezer::new(Layout::new(dir, &config.manifest), config.locker());
//! let report = run(&freezer, &Plan::from(&config))?;
//! println!("{}", report.generate_text());
//! ```

#![allow(missing_docs)]

pub mod clock;
pub mod config;
pub mod error;
pub mod freeze;
pub mod layout;
pub mod locker;
pub mod manifest;
pub mod marker;
pub mod report;
pub mod run;

// Re-exports
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{is_python_version, FreezeConfig, CONFIG_FILE};
pub use error::{ConfigError, FreezeError, FreezeResult};
pub use freeze::Freezer;
pub use layout::{staging_for, Layout};
pub use locker::{CondaLock, LockRequest, Locker, Solver};
pub use manifest::Manifest;
pub use marker::{inspect, GeneratedHeader, Ownership, StampKind, MARKER};
pub use report::{Action, FreezeReport, Outcome, StepReport};
pub use run::{run, Plan};

/// Prelude module for common imports
pub mod prelude {
    pub use crate::{
        run, CondaLock, FreezeConfig, FreezeError, FreezeReport, FreezeResult, Freezer, Layout,
        Locker, Plan,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
