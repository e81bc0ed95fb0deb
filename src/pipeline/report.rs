use super::artifact::{StageKind, Variant};
use super::plan::StaleReason;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeStatus {
    /// The existing output was up to date.
    Reused,
    Executed,
}

/// What happened to one stage during a run.
#[derive(Debug, Clone, Serialize)]
pub struct StageOutcome {
    pub kind: StageKind,
    pub variant: Variant,
    pub status: OutcomeStatus,
    pub reason: Option<StaleReason>,
    pub output: PathBuf,
    pub duration: Duration,
}

impl StageOutcome {
    /// Format timing for display.
    pub fn format(&self) -> String {
        match self.status {
            OutcomeStatus::Executed => format!(
                "{} ({}): {:.2}s",
                self.kind,
                self.variant,
                self.duration.as_secs_f64()
            ),
            OutcomeStatus::Reused => format!("{} ({}): up to date", self.kind, self.variant),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    pub outcomes: Vec<StageOutcome>,
    pub total: Duration,
}

impl RunReport {
    pub fn outcome(&self, kind: StageKind, variant: Variant) -> Option<&StageOutcome> {
        self.outcomes
            .iter()
            .find(|o| o.kind == kind && o.variant == variant)
    }

    pub fn was_executed(&self, kind: StageKind, variant: Variant) -> bool {
        self.outcome(kind, variant)
            .is_some_and(|o| o.status == OutcomeStatus::Executed)
    }

    pub fn executed_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.status == OutcomeStatus::Executed)
            .count()
    }

    pub fn reused_count(&self) -> usize {
        self.outcomes.len() - self.executed_count()
    }

    pub fn merged_output(&self) -> Option<&Path> {
        self.outcome(StageKind::Merge, Variant::Merged)
            .map(|o| o.output.as_path())
    }
}
