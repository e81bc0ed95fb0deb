//! Plans and runs the full artifact pipeline.
//!
//! A run first decides, from fingerprints and existing outputs, which
//! stages are stale. All of their outputs are deleted before any stage body
//! runs, so an interrupted run can never leave a stale artifact that a later
//! run would mistake for a fresh one. The two variant chains then run in
//! parallel and join at the merge stage.

use super::artifact::{StageKind, Variant};
use super::plan::RunPlan;
use super::report::{OutcomeStatus, RunReport, StageOutcome};
use super::stage::{execute_stage, PipelineStage};
use super::stages::{
    AccessTransformStage, InjectClassesStage, MappingSource, MergeStage, PatchStage, RemapStage,
    ACCESS_FINGERPRINT,
};
use crate::cache::ArtifactLayout;
use crate::config::JarloomConfig;
use crate::errors::{PipelineError, Result};
use crate::fingerprint::{digest_file, ArtifactFingerprint, Verdict};
use crate::tools::Toolset;
use rayon::prelude::*;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

/// Whether evaluating fingerprints may update their sidecars.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FingerprintMode {
    /// Record new digests as they are observed. Used by real runs.
    Persist,
    /// Leave sidecars untouched. Used by status queries.
    ReadOnly,
}

/// An input whose digest gates one or more stages.
#[derive(Debug, Clone)]
struct FingerprintSource {
    key: String,
    input: Option<PathBuf>,
    sidecar: ArtifactFingerprint,
}

pub struct PipelineOrchestrator {
    chains: Vec<Vec<Box<dyn PipelineStage>>>,
    merge: Box<dyn PipelineStage>,
    fingerprints: Vec<FingerprintSource>,
    layout: ArtifactLayout,
    force_refresh: bool,
}

impl PipelineOrchestrator {
    pub fn from_config(config: &JarloomConfig, toolset: &Toolset) -> Result<Self> {
        config.validate_inputs()?;
        let layout = config.layout();

        let mappings = Arc::new(MappingSource::new(
            config.mappings()?,
            &config.remap.from,
            &config.remap.to,
        ));
        let override_rules = config.access_override();
        if let Some(path) = &override_rules {
            log::debug!("Using access rule override {}", path.display());
        }

        let mut chains = Vec::new();
        for variant in Variant::SIDES {
            let path = |kind: StageKind| layout.artifact_path(variant, kind);
            let chain: Vec<Box<dyn PipelineStage>> = vec![
                Box::new(PatchStage::new(
                    variant,
                    config.clean_jar(variant)?,
                    config.patches(variant)?,
                    path(StageKind::Patch),
                    toolset.patcher.clone(),
                )),
                Box::new(InjectClassesStage::new(
                    variant,
                    path(StageKind::Patch),
                    config.companion_jar()?,
                    config.userdev_jar()?,
                    config.inputs.userdev_subtree.clone(),
                    path(StageKind::InjectClasses),
                )),
                Box::new(AccessTransformStage::new(
                    variant,
                    path(StageKind::InjectClasses),
                    override_rules.clone(),
                    path(StageKind::AccessTransform),
                    toolset.access_transformer.clone(),
                )),
                Box::new(
                    RemapStage::new(
                        variant,
                        path(StageKind::AccessTransform),
                        path(StageKind::Remap),
                        mappings.clone(),
                    )
                    .with_libraries(config.inputs.libraries.clone())
                    .with_skip_prefixes(config.remap.skip_prefixes.clone()),
                ),
            ];
            chains.push(chain);
        }

        let merge = Box::new(MergeStage::new(
            layout.artifact_path(Variant::Client, StageKind::Remap),
            layout.artifact_path(Variant::Server, StageKind::Remap),
            layout.artifact_path(Variant::Merged, StageKind::Merge),
        ));

        let mut fingerprints = Vec::new();
        for variant in Variant::SIDES {
            let key = PatchStage::fingerprint_name(variant);
            fingerprints.push(FingerprintSource {
                sidecar: ArtifactFingerprint::new(layout.fingerprint_path(&key)),
                input: Some(config.patches(variant)?.to_path_buf()),
                key,
            });
        }
        fingerprints.push(FingerprintSource {
            key: ACCESS_FINGERPRINT.to_string(),
            input: override_rules,
            sidecar: ArtifactFingerprint::new(layout.fingerprint_path(ACCESS_FINGERPRINT)),
        });

        Ok(Self {
            chains,
            merge,
            fingerprints,
            layout,
            force_refresh: config.pipeline.force_refresh,
        })
    }

    pub fn with_force_refresh(mut self, force_refresh: bool) -> Self {
        self.force_refresh = force_refresh;
        self
    }

    pub fn layout(&self) -> &ArtifactLayout {
        &self.layout
    }

    /// Decide which stages are stale without running anything.
    pub fn plan(&self, mode: FingerprintMode) -> Result<RunPlan> {
        let verdicts = self.evaluate_fingerprints(mode)?;
        let chains: Vec<Vec<&dyn PipelineStage>> = self
            .chains
            .iter()
            .map(|chain| chain.iter().map(|stage| stage.as_ref()).collect())
            .collect();
        Ok(RunPlan::compute(
            &chains,
            self.merge.as_ref(),
            self.force_refresh,
            &verdicts,
        ))
    }

    pub fn run(&self) -> Result<RunReport> {
        let start = Instant::now();
        let plan = self.plan(FingerprintMode::Persist)?;
        log::info!(
            "{} of {} stages need to run",
            plan.stale_count(),
            plan.stages.len()
        );
        self.invalidate(&plan)?;

        let results: Vec<Result<Vec<StageOutcome>>> = self
            .chains
            .par_iter()
            .map(|chain| run_chain(chain, &plan))
            .collect();

        let mut outcomes = Vec::new();
        let mut first_error = None;
        for result in results {
            match result {
                Ok(chain_outcomes) => outcomes.extend(chain_outcomes),
                Err(e) if first_error.is_none() => first_error = Some(e),
                Err(e) => log::error!("{}", e),
            }
        }
        if let Some(e) = first_error {
            return Err(e);
        }

        outcomes.push(run_one(self.merge.as_ref(), &plan)?);

        let report = RunReport {
            outcomes,
            total: start.elapsed(),
        };
        log::info!(
            "Pipeline finished: {} executed, {} up to date in {:.2}s",
            report.executed_count(),
            report.reused_count(),
            report.total.as_secs_f64()
        );
        Ok(report)
    }

    /// Remove every artifact and fingerprint sidecar. Returns how many files
    /// were deleted.
    pub fn clean(&self) -> Result<usize> {
        clean_layout(&self.layout)
    }

    fn evaluate_fingerprints(&self, mode: FingerprintMode) -> Result<HashMap<String, Verdict>> {
        let mut verdicts = HashMap::new();
        for source in &self.fingerprints {
            let current = digest_file(source.input.as_deref())?;
            let verdict = match (mode, self.force_refresh) {
                (FingerprintMode::Persist, true) => {
                    source.sidecar.persist(&current)?;
                    Verdict::Dirty
                }
                (FingerprintMode::Persist, false) => source.sidecar.check_and_update(&current)?,
                (FingerprintMode::ReadOnly, true) => Verdict::Dirty,
                (FingerprintMode::ReadOnly, false) => source.sidecar.check(&current),
            };
            log::debug!("Fingerprint {} is {:?}", source.key, verdict);
            verdicts.insert(source.key.clone(), verdict);
        }
        Ok(verdicts)
    }

    fn invalidate(&self, plan: &RunPlan) -> Result<()> {
        for status in plan.stages.iter().filter(|s| s.stale.is_some()) {
            if remove_if_exists(&status.output)? {
                log::debug!(
                    "Invalidated {} ({}) output {}",
                    status.kind,
                    status.variant,
                    status.output.display()
                );
            }
        }
        Ok(())
    }
}

/// Names of the fingerprints gating the pipeline.
pub fn fingerprint_keys() -> Vec<String> {
    let mut keys: Vec<String> = Variant::SIDES
        .iter()
        .map(|variant| PatchStage::fingerprint_name(*variant))
        .collect();
    keys.push(ACCESS_FINGERPRINT.to_string());
    keys
}

/// Delete every artifact and fingerprint sidecar under `layout`.
pub fn clean_layout(layout: &ArtifactLayout) -> Result<usize> {
    let sidecars = fingerprint_keys()
        .into_iter()
        .map(|key| layout.fingerprint_path(&key));

    let mut removed = 0;
    for path in layout.all_artifacts().into_iter().chain(sidecars) {
        if remove_if_exists(&path)? {
            log::debug!("Removed {}", path.display());
            removed += 1;
        }
    }
    Ok(removed)
}

fn run_chain(chain: &[Box<dyn PipelineStage>], plan: &RunPlan) -> Result<Vec<StageOutcome>> {
    chain
        .iter()
        .map(|stage| run_one(stage.as_ref(), plan))
        .collect()
}

fn run_one(stage: &dyn PipelineStage, plan: &RunPlan) -> Result<StageOutcome> {
    let reason = plan
        .get(stage.kind(), stage.variant())
        .and_then(|status| status.stale.clone());

    let Some(reason) = reason else {
        log::debug!("{} is up to date", stage.label());
        return Ok(StageOutcome {
            kind: stage.kind(),
            variant: stage.variant(),
            status: OutcomeStatus::Reused,
            reason: None,
            output: stage.output_path().to_path_buf(),
            duration: Default::default(),
        });
    };

    log::info!("Running {}: {}", stage.label(), reason);
    let start = Instant::now();
    let artifact = execute_stage(stage)?;
    let outcome = StageOutcome {
        kind: stage.kind(),
        variant: stage.variant(),
        status: OutcomeStatus::Executed,
        reason: Some(reason),
        output: artifact.path,
        duration: start.elapsed(),
    };
    log::info!("{}", outcome.format());
    Ok(outcome)
}

fn remove_if_exists(path: &std::path::Path) -> Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(PipelineError::io(path, e)),
    }
}
