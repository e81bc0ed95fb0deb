//! The dirty-propagation pass that decides the full re-run set before any
//! stage executes.

use super::artifact::{StageKind, Variant};
use super::stage::{PipelineStage, StalenessInputs};
use crate::fingerprint::Verdict;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "kebab-case")]
pub enum StaleReason {
    ForceRefresh,
    MissingOutput,
    UpstreamStale,
    FingerprintDrift { source: String },
}

impl fmt::Display for StaleReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StaleReason::ForceRefresh => write!(f, "refresh requested"),
            StaleReason::MissingOutput => write!(f, "output missing"),
            StaleReason::UpstreamStale => write!(f, "upstream stage re-runs"),
            StaleReason::FingerprintDrift { source } => write!(f, "{} changed", source),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageStatus {
    pub kind: StageKind,
    pub variant: Variant,
    pub output: PathBuf,
    pub stale: Option<StaleReason>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunPlan {
    pub stages: Vec<StageStatus>,
}

impl RunPlan {
    /// Evaluate every chain front to back, then the join stage.
    ///
    /// Within a chain, a stale stage makes every later stage stale. The join
    /// stage is stale when the last stage of any chain is.
    pub fn compute(
        chains: &[Vec<&dyn PipelineStage>],
        join: &dyn PipelineStage,
        force_refresh: bool,
        verdicts: &HashMap<String, Verdict>,
    ) -> Self {
        let mut stages = Vec::new();
        let mut any_chain_tail_stale = false;

        for chain in chains {
            let mut upstream_stale = false;
            for stage in chain {
                let status = evaluate(*stage, force_refresh, upstream_stale, verdicts);
                upstream_stale |= status.stale.is_some();
                stages.push(status);
            }
            any_chain_tail_stale |= upstream_stale;
        }

        stages.push(evaluate(join, force_refresh, any_chain_tail_stale, verdicts));
        Self { stages }
    }

    pub fn get(&self, kind: StageKind, variant: Variant) -> Option<&StageStatus> {
        self.stages
            .iter()
            .find(|s| s.kind == kind && s.variant == variant)
    }

    pub fn is_stale(&self, kind: StageKind, variant: Variant) -> bool {
        self.get(kind, variant).is_some_and(|s| s.stale.is_some())
    }

    pub fn stale_count(&self) -> usize {
        self.stages.iter().filter(|s| s.stale.is_some()).count()
    }

    pub fn is_up_to_date(&self) -> bool {
        self.stale_count() == 0
    }
}

fn evaluate(
    stage: &dyn PipelineStage,
    force_refresh: bool,
    upstream_stale: bool,
    verdicts: &HashMap<String, Verdict>,
) -> StageStatus {
    let inputs = StalenessInputs {
        force_refresh,
        upstream_stale,
        fingerprint: stage
            .fingerprint_key()
            .and_then(|key| verdicts.get(key).copied()),
    };
    StageStatus {
        kind: stage.kind(),
        variant: stage.variant(),
        output: stage.output_path().to_path_buf(),
        stale: stage.stale_reason(&inputs),
    }
}
