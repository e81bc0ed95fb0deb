//! External collaborators invoked by pipeline stages.
//!
//! Stages see tools only through the [`PatchApplier`] and
//! [`AccessTransformer`] traits. Production implementations launch a Java
//! tool; the access transformer also has a built-in implementation that
//! rewrites flags directly.

pub mod builtin;
pub mod java;

pub use builtin::BuiltinAccessTransformer;
pub use java::{ExternalAccessTransformer, ExternalPatcher, JavaTool};

use crate::config::{AccessTransformerSetting, ToolsConfig};
use crate::errors::{PipelineError, Result};
use crate::pipeline::{StageKind, Variant};
use std::path::Path;
use std::sync::Arc;

/// Which stage and variant a tool runs on behalf of, for error context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolContext {
    pub stage: StageKind,
    pub variant: Variant,
}

impl ToolContext {
    pub fn new(stage: StageKind, variant: Variant) -> Self {
        Self { stage, variant }
    }

    pub fn failure(&self, tool: &str, status: Option<i32>, message: impl Into<String>) -> PipelineError {
        PipelineError::ExternalToolFailure {
            tool: tool.to_string(),
            stage: self.stage,
            variant: self.variant,
            status,
            message: message.into(),
        }
    }
}

/// `applyPatches(cleanJar, patchSet) -> patchedJar`
pub trait PatchApplier: Send + Sync {
    fn name(&self) -> &str;

    fn apply_patches(&self, clean: &Path, patches: &Path, output: &Path, ctx: ToolContext) -> Result<()>;
}

/// Rewrites visibility in `input` according to the rule file at `rules`.
pub trait AccessTransformer: Send + Sync {
    fn name(&self) -> &str;

    fn transform(&self, input: &Path, rules: &Path, output: &Path, ctx: ToolContext) -> Result<()>;
}

/// Stand-in used when no patcher is configured; fails when invoked.
#[derive(Debug, Default)]
pub struct UnconfiguredPatcher;

impl PatchApplier for UnconfiguredPatcher {
    fn name(&self) -> &str {
        "patcher"
    }

    fn apply_patches(&self, _clean: &Path, _patches: &Path, _output: &Path, ctx: ToolContext) -> Result<()> {
        Err(ctx.failure(self.name(), None, "no patcher configured in [tools.patcher]"))
    }
}

/// The tools one pipeline run uses.
#[derive(Clone)]
pub struct Toolset {
    pub patcher: Arc<dyn PatchApplier>,
    pub access_transformer: Arc<dyn AccessTransformer>,
}

impl Toolset {
    pub fn new(patcher: Arc<dyn PatchApplier>, access_transformer: Arc<dyn AccessTransformer>) -> Self {
        Self {
            patcher,
            access_transformer,
        }
    }

    pub fn from_config(config: &ToolsConfig) -> Self {
        let patcher: Arc<dyn PatchApplier> = match &config.patcher {
            Some(tool) => Arc::new(ExternalPatcher::new(JavaTool::from_config("patcher", tool))),
            None => Arc::new(UnconfiguredPatcher),
        };

        let access_transformer: Arc<dyn AccessTransformer> = match &config.access_transformer {
            AccessTransformerSetting::Builtin(_) => Arc::new(BuiltinAccessTransformer),
            AccessTransformerSetting::External(tool) => Arc::new(ExternalAccessTransformer::new(
                JavaTool::from_config("access-transformer", tool),
            )),
        };

        Self::new(patcher, access_transformer)
    }
}

impl std::fmt::Debug for Toolset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Toolset")
            .field("patcher", &self.patcher.name())
            .field("access_transformer", &self.access_transformer.name())
            .finish()
    }
}
