use crate::access::{AccessRuleSet, RULES_PATH};
use crate::errors::{IoResultExt, PipelineError, Result};
use crate::jar::Jar;
use crate::pipeline::stage::PipelineStage;
use crate::pipeline::{Artifact, StageKind, Variant};
use crate::tools::{AccessTransformer, ToolContext};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Fingerprint key for the project's access-rule override.
pub const ACCESS_FINGERPRINT: &str = "at";

/// Widens visibility using the rules embedded in the jar, with the
/// project's override file taking precedence where both name a target.
pub struct AccessTransformStage {
    variant: Variant,
    input: PathBuf,
    override_rules: Option<PathBuf>,
    output: PathBuf,
    transformer: Arc<dyn AccessTransformer>,
}

impl AccessTransformStage {
    pub fn new(
        variant: Variant,
        input: impl Into<PathBuf>,
        override_rules: Option<PathBuf>,
        output: impl Into<PathBuf>,
        transformer: Arc<dyn AccessTransformer>,
    ) -> Self {
        Self {
            variant,
            input: input.into(),
            override_rules,
            output: output.into(),
            transformer,
        }
    }

    /// Embedded rules of `jar` merged with the override file, if any.
    pub fn effective_rules(jar: &Jar, override_rules: Option<&Path>) -> Result<AccessRuleSet> {
        let mut rules = match jar.get(RULES_PATH) {
            Some(bytes) => AccessRuleSet::parse(&String::from_utf8_lossy(bytes))?,
            None => AccessRuleSet::new(),
        };
        if let Some(path) = override_rules {
            let text = std::fs::read_to_string(path).at_path(path)?;
            rules.merge(AccessRuleSet::parse(&text)?);
        }
        Ok(rules)
    }
}

impl PipelineStage for AccessTransformStage {
    fn kind(&self) -> StageKind {
        StageKind::AccessTransform
    }

    fn variant(&self) -> Variant {
        self.variant
    }

    fn inputs(&self) -> Vec<PathBuf> {
        let mut inputs = vec![self.input.clone()];
        inputs.extend(self.override_rules.clone());
        inputs
    }

    fn output_path(&self) -> &Path {
        &self.output
    }

    fn fingerprint_key(&self) -> Option<&str> {
        Some(ACCESS_FINGERPRINT)
    }

    fn run(&self) -> Result<Artifact> {
        let rules = {
            let jar = Jar::open(&self.input)?;
            Self::effective_rules(&jar, self.override_rules.as_deref())?
        };
        log::debug!(
            "Transforming {} jar with {} access rules via {}",
            self.variant,
            rules.len(),
            self.transformer.name()
        );

        let work_dir = self
            .output
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        let mut rules_file = tempfile::Builder::new()
            .prefix("access-")
            .suffix(".cfg")
            .tempfile_in(&work_dir)
            .map_err(|e| PipelineError::io(&work_dir, e))?;
        rules_file
            .write_all(rules.to_text().as_bytes())
            .and_then(|_| rules_file.flush())
            .at_path(rules_file.path())?;

        let ctx = ToolContext::new(StageKind::AccessTransform, self.variant);
        self.transformer
            .transform(&self.input, rules_file.path(), &self.output, ctx)?;

        Ok(Artifact::new(
            StageKind::AccessTransform.produces(),
            self.variant,
            &self.output,
        ))
    }
}
