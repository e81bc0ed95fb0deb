use crate::bytecode::is_class_entry;
use crate::errors::Result;
use crate::jar::Jar;
use crate::pipeline::stage::PipelineStage;
use crate::pipeline::{Artifact, StageKind, Variant};
use crate::tools::{PatchApplier, ToolContext};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Applies the variant's binary patch set to its clean jar.
///
/// The patch set only carries classes it changes, so every class of the
/// clean jar that the patcher did not emit is copied over afterwards.
pub struct PatchStage {
    variant: Variant,
    clean: PathBuf,
    patches: PathBuf,
    output: PathBuf,
    patcher: Arc<dyn PatchApplier>,
}

impl PatchStage {
    pub fn new(
        variant: Variant,
        clean: impl Into<PathBuf>,
        patches: impl Into<PathBuf>,
        output: impl Into<PathBuf>,
        patcher: Arc<dyn PatchApplier>,
    ) -> Self {
        Self {
            variant,
            clean: clean.into(),
            patches: patches.into(),
            output: output.into(),
            patcher,
        }
    }

    pub fn fingerprint_name(variant: Variant) -> String {
        format!("patches-{}", variant)
    }
}

impl PipelineStage for PatchStage {
    fn kind(&self) -> StageKind {
        StageKind::Patch
    }

    fn variant(&self) -> Variant {
        self.variant
    }

    fn inputs(&self) -> Vec<PathBuf> {
        vec![self.clean.clone(), self.patches.clone()]
    }

    fn output_path(&self) -> &Path {
        &self.output
    }

    fn fingerprint_key(&self) -> Option<&str> {
        match self.variant {
            Variant::Client => Some("patches-client"),
            Variant::Server => Some("patches-server"),
            Variant::Merged => None,
        }
    }

    fn run(&self) -> Result<Artifact> {
        let ctx = ToolContext::new(StageKind::Patch, self.variant);
        log::debug!(
            "Applying {} with {} to {}",
            self.patches.display(),
            self.patcher.name(),
            self.clean.display()
        );
        self.patcher
            .apply_patches(&self.clean, &self.patches, &self.output, ctx)?;

        let clean = Jar::open(&self.clean)?;
        let mut patched = Jar::open(&self.output)?;
        let mut copied = 0usize;
        for (name, bytes) in clean.entries().filter(|(name, _)| is_class_entry(name)) {
            if patched.insert_if_absent(name, bytes.to_vec()) {
                copied += 1;
            }
        }
        log::debug!(
            "Copied {} unpatched classes into {}",
            copied,
            self.output.display()
        );
        patched.write_to(&self.output)?;

        Ok(Artifact::new(
            StageKind::Patch.produces(),
            self.variant,
            &self.output,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::stage::execute_stage;
    use crate::testkit::{ClassFileBuilder, JarBuilder, OverlayPatcher};
    use tempfile::TempDir;

    #[test]
    fn test_unpatched_classes_are_copied() {
        let dir = TempDir::new().unwrap();
        let clean = JarBuilder::new()
            .class(ClassFileBuilder::new("a/A"))
            .class(ClassFileBuilder::new("a/B"))
            .resource("data.txt", "clean")
            .write(dir.path().join("clean.jar"));
        let patches = JarBuilder::new()
            .class(ClassFileBuilder::new("a/A").method("patched", "()V"))
            .write(dir.path().join("patches.jar"));

        let patcher = Arc::new(OverlayPatcher::default());
        let stage = PatchStage::new(
            Variant::Client,
            &clean,
            &patches,
            dir.path().join("out/patched.jar"),
            patcher.clone(),
        );
        execute_stage(&stage).unwrap();

        let out = Jar::open(stage.output_path()).unwrap();
        assert!(out.contains("a/A.class"));
        assert!(out.contains("a/B.class"));
        let patched_a = Jar::open(&patches).unwrap();
        assert_eq!(out.get("a/A.class"), patched_a.get("a/A.class"));
        assert_eq!(patcher.calls(), 1);
    }

    #[test]
    fn test_fingerprint_key_per_variant() {
        let patcher = Arc::new(OverlayPatcher::default());
        let stage = PatchStage::new(Variant::Server, "c", "p", "o", patcher);
        assert_eq!(stage.fingerprint_key(), Some("patches-server"));
        assert_eq!(PatchStage::fingerprint_name(Variant::Server), "patches-server");
    }
}
