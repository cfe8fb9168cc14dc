//! Run driver: regenerate every python manifest, then lock it per platform

use crate::clock::Clock;
use crate::config::FreezeConfig;
use crate::error::FreezeResult;
use crate::freeze::Freezer;
use crate::locker::Locker;
use crate::report::{Action, FreezeReport, Outcome, StepReport};

/// Python versions and platforms to process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    pub python_versions: Vec<String>,
    pub platforms: Vec<String>,
    pub default_python: String,
}

impl From<&FreezeConfig> for Plan {
    fn from(config: &FreezeConfig) -> Self {
        Self {
            python_versions: config.python_versions.clone(),
            platforms: config.platforms.clone(),
            default_python: config.default_python.clone(),
        }
    }
}

/// Execute `plan`, stopping at the first error.
///
/// Each manifest is regenerated once, then frozen for every platform. The
/// default python's locks are also copied to the default lock names, but
/// only when they were written by this run.
///
/// # Errors
/// Returns the first error raised by any step.
pub fn run<L: Locker, C: Clock>(freezer: &Freezer<L, C>, plan: &Plan) -> FreezeResult<FreezeReport> {
    let layout = freezer.layout();
    let mut report = FreezeReport::default();

    for py in &plan.python_versions {
        let manifest = layout.python_manifest(py);
        let outcome = freezer.set_python(&manifest, py)?;
        report.push(step(Action::Regenerate, py, None, layout.display(&manifest), outcome));

        for platform in &plan.platforms {
            let lock = layout.python_lock(py, platform);
            let frozen = freezer.freeze(&manifest, &lock, platform)?;
            report.push(step(Action::Freeze, py, Some(platform), layout.display(&lock), frozen));

            if *py != plan.default_python {
                continue;
            }
            if frozen == Outcome::Skipped {
                // a hand-edited lock would land without the marker
                tracing::debug!(lock = %lock.display(), "default lock not refrozen, not promoting");
            } else {
                let outcome = freezer.promote(&lock, platform)?;
                let dest = layout.display(&layout.default_lock(platform));
                report.push(step(Action::Promote, py, Some(platform), dest, outcome));
            }
        }
    }

    tracing::info!(
        written = report.written(),
        skipped = report.skipped(),
        "freeze complete"
    );
    Ok(report)
}

fn step(
    action: Action,
    py: &str,
    platform: Option<&String>,
    path: String,
    outcome: Outcome,
) -> StepReport {
    StepReport {
        action,
        python: py.to_string(),
        platform: platform.cloned(),
        path,
        outcome,
    }
}
