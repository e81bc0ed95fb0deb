//! Identities of the files the pipeline produces.

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// One of the parallel builds, or the product of joining them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    Client,
    Server,
    Merged,
}

impl Variant {
    /// Variants that run the per-variant stage chain.
    pub const SIDES: [Variant; 2] = [Variant::Client, Variant::Server];

    pub fn as_str(self) -> &'static str {
        match self {
            Variant::Client => "client",
            Variant::Server => "server",
            Variant::Merged => "merged",
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StageKind {
    Patch,
    InjectClasses,
    AccessTransform,
    Remap,
    Merge,
}

impl StageKind {
    /// Per-variant stages in execution order.
    pub const CHAIN: [StageKind; 4] = [
        StageKind::Patch,
        StageKind::InjectClasses,
        StageKind::AccessTransform,
        StageKind::Remap,
    ];

    pub fn name(self) -> &'static str {
        match self {
            StageKind::Patch => "patch",
            StageKind::InjectClasses => "inject-classes",
            StageKind::AccessTransform => "access-transform",
            StageKind::Remap => "remap",
            StageKind::Merge => "merge",
        }
    }

    /// File name suffix of the artifact this stage writes.
    pub fn suffix(self) -> &'static str {
        match self {
            StageKind::Patch => "patched",
            StageKind::InjectClasses => "injected",
            StageKind::AccessTransform => "transformed",
            StageKind::Remap | StageKind::Merge => "remapped",
        }
    }

    /// State an artifact is in once this stage has produced it.
    pub fn produces(self) -> ArtifactState {
        match self {
            StageKind::Patch => ArtifactState::Patched,
            StageKind::InjectClasses => ArtifactState::Injected,
            StageKind::AccessTransform => ArtifactState::Transformed,
            StageKind::Remap => ArtifactState::Remapped,
            StageKind::Merge => ArtifactState::Merged,
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Per-variant lifecycle: `Raw -> Patched -> Injected -> Transformed -> Remapped`,
/// with `Merged` computed once from both remapped sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactState {
    Raw,
    Patched,
    Injected,
    Transformed,
    Remapped,
    Merged,
}

/// A file created by exactly one stage for one variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Artifact {
    pub state: ArtifactState,
    pub variant: Variant,
    pub path: PathBuf,
}

impl Artifact {
    pub fn new(state: ArtifactState, variant: Variant, path: impl Into<PathBuf>) -> Self {
        Self {
            state,
            variant,
            path: path.into(),
        }
    }
}
