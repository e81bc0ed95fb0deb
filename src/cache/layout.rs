//! Deterministic names for derived artifacts and fingerprint sidecars.

use crate::pipeline::{StageKind, Variant};
use std::path::{Path, PathBuf};

/// `{kind}-{version}-{variant}-{suffix}[-{patch_version}].jar` under one root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactLayout {
    root: PathBuf,
    kind: String,
    version: String,
    patch_version: Option<String>,
}

impl ArtifactLayout {
    pub fn new(
        root: impl Into<PathBuf>,
        kind: impl Into<String>,
        version: impl Into<String>,
        patch_version: Option<String>,
    ) -> Self {
        Self {
            root: root.into(),
            kind: kind.into(),
            version: version.into(),
            patch_version: patch_version.filter(|v| !v.is_empty()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn artifact_path(&self, variant: Variant, stage: StageKind) -> PathBuf {
        let mut name = format!(
            "{}-{}-{}-{}",
            self.kind,
            self.version,
            variant,
            stage.suffix()
        );
        if let Some(patch_version) = &self.patch_version {
            name.push('-');
            name.push_str(patch_version);
        }
        name.push_str(".jar");
        self.root.join(name)
    }

    pub fn fingerprint_path(&self, name: &str) -> PathBuf {
        self.root.join(format!("{}.sha256", name))
    }

    /// Every artifact the pipeline can produce under this layout.
    pub fn all_artifacts(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = Variant::SIDES
            .iter()
            .flat_map(|variant| {
                StageKind::CHAIN
                    .iter()
                    .map(move |stage| self.artifact_path(*variant, *stage))
            })
            .collect();
        paths.push(self.artifact_path(Variant::Merged, StageKind::Merge));
        paths
    }
}
