use crate::bytecode::is_class_entry;
use crate::errors::{IoResultExt, Result};
use crate::jar::{append_entries, Jar};
use crate::pipeline::stage::PipelineStage;
use crate::pipeline::{Artifact, StageKind, Variant};
use std::fs;
use std::path::{Path, PathBuf};

/// Joins the two remapped sides into one jar.
///
/// The client jar is copied as-is. Server resources the client lacks are
/// then appended; server classes never are.
pub struct MergeStage {
    client: PathBuf,
    server: PathBuf,
    output: PathBuf,
}

impl MergeStage {
    pub fn new(
        client: impl Into<PathBuf>,
        server: impl Into<PathBuf>,
        output: impl Into<PathBuf>,
    ) -> Self {
        Self {
            client: client.into(),
            server: server.into(),
            output: output.into(),
        }
    }
}

impl PipelineStage for MergeStage {
    fn kind(&self) -> StageKind {
        StageKind::Merge
    }

    fn variant(&self) -> Variant {
        Variant::Merged
    }

    fn inputs(&self) -> Vec<PathBuf> {
        vec![self.client.clone(), self.server.clone()]
    }

    fn output_path(&self) -> &Path {
        &self.output
    }

    fn run(&self) -> Result<Artifact> {
        fs::copy(&self.client, &self.output).at_path(&self.output)?;

        let client = Jar::open(&self.client)?;
        let server = Jar::open(&self.server)?;
        let missing = server
            .entries()
            .filter(|(name, _)| !is_class_entry(name) && !client.contains(name));
        let appended = append_entries(&self.output, missing)?;

        log::debug!(
            "Merged {} client entries with {} server-only resources",
            client.len(),
            appended
        );
        Ok(Artifact::new(
            StageKind::Merge.produces(),
            Variant::Merged,
            &self.output,
        ))
    }
}
