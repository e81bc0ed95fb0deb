use crate::errors::Result;
use crate::jar::{Jar, MANIFEST_PATH};
use crate::pipeline::stage::PipelineStage;
use crate::pipeline::{Artifact, StageKind, Variant};
use std::path::{Path, PathBuf};

/// Overlays extra content onto a patched jar.
///
/// Every companion entry except the manifest replaces what the patched jar
/// has. Userdev entries under `subtree/` are added with the prefix stripped,
/// but never replace an entry that is already present.
pub struct InjectClassesStage {
    variant: Variant,
    input: PathBuf,
    companion: PathBuf,
    userdev: PathBuf,
    subtree: String,
    output: PathBuf,
}

impl InjectClassesStage {
    pub fn new(
        variant: Variant,
        input: impl Into<PathBuf>,
        companion: impl Into<PathBuf>,
        userdev: impl Into<PathBuf>,
        subtree: impl Into<String>,
        output: impl Into<PathBuf>,
    ) -> Self {
        Self {
            variant,
            input: input.into(),
            companion: companion.into(),
            userdev: userdev.into(),
            subtree: subtree.into(),
            output: output.into(),
        }
    }

    fn subtree_prefix(&self) -> String {
        let trimmed = self.subtree.trim_matches('/');
        if trimmed.is_empty() {
            String::new()
        } else {
            format!("{}/", trimmed)
        }
    }
}

impl PipelineStage for InjectClassesStage {
    fn kind(&self) -> StageKind {
        StageKind::InjectClasses
    }

    fn variant(&self) -> Variant {
        self.variant
    }

    fn inputs(&self) -> Vec<PathBuf> {
        vec![
            self.input.clone(),
            self.companion.clone(),
            self.userdev.clone(),
        ]
    }

    fn output_path(&self) -> &Path {
        &self.output
    }

    fn run(&self) -> Result<Artifact> {
        let mut jar = Jar::open(&self.input)?;

        let companion = Jar::open(&self.companion)?;
        let mut overlaid = 0usize;
        for (name, bytes) in companion.entries().filter(|(name, _)| *name != MANIFEST_PATH) {
            jar.insert(name, bytes.to_vec());
            overlaid += 1;
        }

        let userdev = Jar::open(&self.userdev)?;
        let prefix = self.subtree_prefix();
        let mut added = 0usize;
        for (name, bytes) in userdev.entries() {
            let Some(relative) = name.strip_prefix(prefix.as_str()) else {
                continue;
            };
            if relative.is_empty() || relative == MANIFEST_PATH {
                continue;
            }
            if jar.insert_if_absent(relative, bytes.to_vec()) {
                added += 1;
            }
        }

        log::debug!(
            "Injected {} companion and {} userdev entries into {} jar",
            overlaid,
            added,
            self.variant
        );
        jar.write_to(&self.output)?;

        Ok(Artifact::new(
            StageKind::InjectClasses.produces(),
            self.variant,
            &self.output,
        ))
    }
}
