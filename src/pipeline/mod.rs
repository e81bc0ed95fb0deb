//! The incremental artifact pipeline.
//!
//! Each side (client, server) runs `Patch -> InjectClasses -> AccessTransform
//! -> Remap`; both remapped jars then join in `Merge`. Every stage writes one
//! named artifact under the cache root and is skipped when that artifact is
//! still valid.

pub mod artifact;
pub mod orchestrator;
pub mod plan;
pub mod report;
pub mod stage;
pub mod stages;

pub use artifact::{Artifact, ArtifactState, StageKind, Variant};
pub use orchestrator::{FingerprintMode, PipelineOrchestrator};
pub use plan::{RunPlan, StaleReason, StageStatus};
pub use report::{OutcomeStatus, RunReport, StageOutcome};
pub use stage::{execute_stage, require_inputs, OutputGuard, PipelineStage, StalenessInputs};
