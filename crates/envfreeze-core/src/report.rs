//! Per-step record of a freeze run

use std::fmt::Write as _;

use serde::Serialize;

/// What a step did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Action {
    /// Rewrote a per-python manifest
    Regenerate,
    /// Produced a lock file
    Freeze,
    /// Copied a lock file to the default name
    Promote,
}

/// Whether the target was written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Outcome {
    /// File written
    Written,
    /// Existing hand-edited file left alone
    Skipped,
}

/// One step of a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepReport {
    pub action: Action,
    pub python: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    /// Target path, relative to the buildpack directory
    pub path: String,
    pub outcome: Outcome,
}

/// Everything a run did, in order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FreezeReport {
    pub steps: Vec<StepReport>,
}

impl FreezeReport {
    /// Append a step
    pub fn push(&mut self, step: StepReport) {
        self.steps.push(step);
    }

    /// Number of files written
    #[must_use]
    pub fn written(&self) -> usize {
        self.count(Outcome::Written)
    }

    /// Number of hand-edited files left alone
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.count(Outcome::Skipped)
    }

    fn count(&self, outcome: Outcome) -> usize {
        self.steps.iter().filter(|s| s.outcome == outcome).count()
    }

    /// Human-readable summary
    #[must_use]
    pub fn generate_text(&self) -> String {
        let mut out = String::new();
        for step in &self.steps {
            let verb = match (step.action, step.outcome) {
                (_, Outcome::Skipped) => "skipped",
                (Action::Regenerate, Outcome::Written) => "regenerated",
                (Action::Freeze, Outcome::Written) => "frozen",
                (Action::Promote, Outcome::Written) => "promoted",
            };
            let _ = writeln!(out, "  {verb:<12} {}", step.path);
        }
        let _ = write!(
            out,
            "{} written, {} skipped",
            self.written(),
            self.skipped()
        );
        out
    }
}
