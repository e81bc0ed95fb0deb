//! Stage abstraction for the artifact pipeline.
//!
//! A stage is a function from declared input files to one output file.
//! Whether it must run is decided up front from [`StalenessInputs`]; when it
//! does run, [`execute_stage`] checks its inputs exist and guarantees that a
//! failed run leaves no output behind.

use super::artifact::{Artifact, StageKind, Variant};
use super::plan::StaleReason;
use crate::errors::{PipelineError, Result};
use crate::fingerprint::Verdict;
use std::fs;
use std::path::{Path, PathBuf};

/// Facts the planning pass supplies when asking a stage whether it is stale.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StalenessInputs {
    pub force_refresh: bool,
    /// An earlier stage of the same variant will run this time.
    pub upstream_stale: bool,
    /// Verdict of the fingerprint named by [`PipelineStage::fingerprint_key`].
    pub fingerprint: Option<Verdict>,
}

pub trait PipelineStage: Send + Sync {
    fn kind(&self) -> StageKind;

    fn variant(&self) -> Variant;

    /// Every file the stage reads. All must exist when it starts.
    fn inputs(&self) -> Vec<PathBuf>;

    fn output_path(&self) -> &Path;

    /// Name of the fingerprint that gates this stage, if any.
    fn fingerprint_key(&self) -> Option<&str> {
        None
    }

    fn stale_reason(&self, inputs: &StalenessInputs) -> Option<StaleReason> {
        if inputs.force_refresh {
            return Some(StaleReason::ForceRefresh);
        }
        if !self.output_path().exists() {
            return Some(StaleReason::MissingOutput);
        }
        if inputs.upstream_stale {
            return Some(StaleReason::UpstreamStale);
        }
        match (self.fingerprint_key(), inputs.fingerprint) {
            (Some(key), Some(Verdict::Dirty)) => Some(StaleReason::FingerprintDrift {
                source: key.to_string(),
            }),
            _ => None,
        }
    }

    fn is_stale(&self, inputs: &StalenessInputs) -> bool {
        self.stale_reason(inputs).is_some()
    }

    /// Produce the output. Callers go through [`execute_stage`].
    fn run(&self) -> Result<Artifact>;

    fn label(&self) -> String {
        format!("{} ({})", self.kind(), self.variant())
    }
}

/// Deletes a stage's output on drop unless the stage committed it.
#[derive(Debug)]
pub struct OutputGuard {
    path: PathBuf,
    committed: bool,
}

impl OutputGuard {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            committed: false,
        }
    }

    pub fn commit(mut self) {
        self.committed = true;
    }
}

impl Drop for OutputGuard {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        match fs::remove_file(&self.path) {
            Ok(()) => log::debug!("Removed partial output {}", self.path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => log::warn!(
                "Failed to remove partial output {}: {}",
                self.path.display(),
                e
            ),
        }
    }
}

/// Fail with [`PipelineError::MissingUpstreamArtifact`] for the first absent input.
pub fn require_inputs(stage: &dyn PipelineStage) -> Result<()> {
    match stage.inputs().into_iter().find(|path| !path.exists()) {
        Some(path) => Err(PipelineError::MissingUpstreamArtifact {
            stage: stage.kind(),
            variant: stage.variant(),
            path,
        }),
        None => Ok(()),
    }
}

/// Run one stage: check inputs, clear any previous output, run, and delete
/// the output again if the stage fails.
pub fn execute_stage(stage: &dyn PipelineStage) -> Result<Artifact> {
    require_inputs(stage)?;

    let output = stage.output_path();
    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent).map_err(|e| PipelineError::io(parent, e))?;
    }
    match fs::remove_file(output) {
        Err(e) if e.kind() != std::io::ErrorKind::NotFound => {
            return Err(PipelineError::io(output, e));
        }
        _ => {}
    }

    let guard = OutputGuard::new(output);
    let artifact = stage
        .run()
        .map_err(|e| e.in_stage(stage.kind(), stage.variant()))?;
    guard.commit();
    Ok(artifact)
}
