use crate::access::RULES_PATH;
use crate::cache::{ArtifactLayout, CacheLocation};
use crate::errors::{PipelineError, Result};
use crate::pipeline::Variant;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration structure for jarloom.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JarloomConfig {
    #[serde(default)]
    pub pipeline: PipelineSettings,

    #[serde(default)]
    pub inputs: InputsConfig,

    #[serde(default)]
    pub remap: RemapConfig,

    #[serde(default)]
    pub tools: ToolsConfig,

    /// Directory relative paths were resolved against
    #[serde(skip)]
    pub base_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSettings {
    /// Artifact family, the first component of every derived file name
    #[serde(default = "default_kind")]
    pub kind: String,

    #[serde(default)]
    pub version: String,

    /// Version of the patch set, appended to derived file names
    #[serde(default)]
    pub patch_version: Option<String>,

    #[serde(default)]
    pub cache_dir: Option<PathBuf>,

    /// Treat every stage as stale
    #[serde(default)]
    pub force_refresh: bool,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            kind: default_kind(),
            version: String::new(),
            patch_version: None,
            cache_dir: None,
            force_refresh: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputsConfig {
    pub client_jar: Option<PathBuf>,
    pub server_jar: Option<PathBuf>,
    pub client_patches: Option<PathBuf>,
    pub server_patches: Option<PathBuf>,

    /// Archive overlaid onto both sides, overwriting collisions
    pub companion_jar: Option<PathBuf>,

    /// Archive whose subtree is copied without overwriting
    pub userdev_jar: Option<PathBuf>,

    #[serde(default = "default_userdev_subtree")]
    pub userdev_subtree: String,

    /// Tiny v2 mapping file
    pub mappings: Option<PathBuf>,

    /// Extra jars consulted for class hierarchy facts
    #[serde(default)]
    pub libraries: Vec<PathBuf>,

    /// Directories searched, in order, for an access-rule override
    #[serde(default)]
    pub resource_roots: Vec<PathBuf>,
}

impl Default for InputsConfig {
    fn default() -> Self {
        Self {
            client_jar: None,
            server_jar: None,
            client_patches: None,
            server_patches: None,
            companion_jar: None,
            userdev_jar: None,
            userdev_subtree: default_userdev_subtree(),
            mappings: None,
            libraries: Vec::new(),
            resource_roots: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemapConfig {
    #[serde(default = "default_from")]
    pub from: String,

    #[serde(default = "default_to")]
    pub to: String,

    /// Ancestors under these prefixes are never walked
    #[serde(default = "default_skip_prefixes")]
    pub skip_prefixes: Vec<String>,
}

impl Default for RemapConfig {
    fn default() -> Self {
        Self {
            from: default_from(),
            to: default_to(),
            skip_prefixes: default_skip_prefixes(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolsConfig {
    #[serde(default)]
    pub patcher: Option<ToolConfig>,

    #[serde(default)]
    pub access_transformer: AccessTransformerSetting,
}

/// A tool run as `java -jar <jar> <args>`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolConfig {
    pub jar: PathBuf,

    /// Java executable; looked up on PATH when absent
    #[serde(default)]
    pub java: Option<PathBuf>,

    /// Argument template with `{placeholder}` substitution
    #[serde(default)]
    pub args: Option<Vec<String>>,
}

/// `"builtin"` or an external tool table
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AccessTransformerSetting {
    Builtin(String),
    External(ToolConfig),
}

impl Default for AccessTransformerSetting {
    fn default() -> Self {
        AccessTransformerSetting::Builtin("builtin".to_string())
    }
}

fn default_kind() -> String {
    "minecraft".to_string()
}

fn default_userdev_subtree() -> String {
    "inject".to_string()
}

fn default_from() -> String {
    "intermediate".to_string()
}

fn default_to() -> String {
    "named".to_string()
}

fn default_skip_prefixes() -> Vec<String> {
    vec!["java/".to_string()]
}

impl JarloomConfig {
    /// Resolve every relative path against `base_dir`.
    pub fn resolve_paths(&mut self, base_dir: &Path) {
        let resolve = |path: &mut PathBuf| {
            if path.is_relative() {
                *path = base_dir.join(&*path);
            }
        };

        if let Some(dir) = self.pipeline.cache_dir.as_mut() {
            resolve(dir);
        }

        let inputs = &mut self.inputs;
        for path in [
            &mut inputs.client_jar,
            &mut inputs.server_jar,
            &mut inputs.client_patches,
            &mut inputs.server_patches,
            &mut inputs.companion_jar,
            &mut inputs.userdev_jar,
            &mut inputs.mappings,
        ]
        .into_iter()
        .flatten()
        {
            resolve(path);
        }
        inputs.libraries.iter_mut().for_each(resolve);
        inputs.resource_roots.iter_mut().for_each(resolve);

        let mut tools: Vec<&mut ToolConfig> = Vec::new();
        if let Some(patcher) = self.tools.patcher.as_mut() {
            tools.push(patcher);
        }
        if let AccessTransformerSetting::External(tool) = &mut self.tools.access_transformer {
            tools.push(tool);
        }
        for tool in tools {
            resolve(&mut tool.jar);
            // A bare command name is left for PATH lookup
            if let Some(java) = tool.java.as_mut() {
                if java.components().count() > 1 {
                    resolve(java);
                }
            }
        }

        self.base_dir = base_dir.to_path_buf();
    }

    /// Checks that do not depend on which command runs.
    pub fn validate(&self) -> Result<()> {
        if self.remap.from == self.remap.to {
            return Err(PipelineError::config(format!(
                "remap.from and remap.to are both '{}'",
                self.remap.from
            )));
        }
        if let AccessTransformerSetting::Builtin(name) = &self.tools.access_transformer {
            if name != "builtin" {
                return Err(PipelineError::config(format!(
                    "unknown access transformer '{}', expected \"builtin\" or a tool table",
                    name
                )));
            }
        }
        Ok(())
    }

    /// Every input the full pipeline needs must be configured.
    pub fn validate_inputs(&self) -> Result<()> {
        let inputs = &self.inputs;
        let required = [
            ("inputs.client_jar", &inputs.client_jar),
            ("inputs.server_jar", &inputs.server_jar),
            ("inputs.client_patches", &inputs.client_patches),
            ("inputs.server_patches", &inputs.server_patches),
            ("inputs.companion_jar", &inputs.companion_jar),
            ("inputs.userdev_jar", &inputs.userdev_jar),
            ("inputs.mappings", &inputs.mappings),
        ];

        let mut missing: Vec<&str> = required
            .iter()
            .filter(|(_, value)| value.is_none())
            .map(|(name, _)| *name)
            .collect();
        if self.pipeline.version.is_empty() {
            missing.insert(0, "pipeline.version");
        }

        if missing.is_empty() {
            Ok(())
        } else {
            Err(PipelineError::config(format!(
                "missing required settings: {}",
                missing.join(", ")
            )))
        }
    }

    pub fn clean_jar(&self, variant: Variant) -> Result<&Path> {
        match variant {
            Variant::Client => required(&self.inputs.client_jar, "inputs.client_jar"),
            Variant::Server => required(&self.inputs.server_jar, "inputs.server_jar"),
            Variant::Merged => Err(PipelineError::config("the merged variant has no clean jar")),
        }
    }

    pub fn patches(&self, variant: Variant) -> Result<&Path> {
        match variant {
            Variant::Client => required(&self.inputs.client_patches, "inputs.client_patches"),
            Variant::Server => required(&self.inputs.server_patches, "inputs.server_patches"),
            Variant::Merged => Err(PipelineError::config("the merged variant has no patch set")),
        }
    }

    pub fn mappings(&self) -> Result<&Path> {
        required(&self.inputs.mappings, "inputs.mappings")
    }

    pub fn companion_jar(&self) -> Result<&Path> {
        required(&self.inputs.companion_jar, "inputs.companion_jar")
    }

    pub fn userdev_jar(&self) -> Result<&Path> {
        required(&self.inputs.userdev_jar, "inputs.userdev_jar")
    }

    /// First existing override rule file under the resource roots.
    pub fn access_override(&self) -> Option<PathBuf> {
        self.inputs
            .resource_roots
            .iter()
            .map(|root| root.join(RULES_PATH))
            .find(|path| path.is_file())
    }

    pub fn cache_root(&self) -> PathBuf {
        CacheLocation::resolve(
            self.pipeline.cache_dir.as_deref(),
            &self.pipeline.kind,
            &self.pipeline.version,
        )
        .base_path
    }

    pub fn layout(&self) -> ArtifactLayout {
        ArtifactLayout::new(
            self.cache_root(),
            &self.pipeline.kind,
            &self.pipeline.version,
            self.pipeline.patch_version.clone(),
        )
    }
}

fn required<'a>(value: &'a Option<PathBuf>, name: &str) -> Result<&'a Path> {
    value
        .as_deref()
        .ok_or_else(|| PipelineError::config(format!("{} is not set", name)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = JarloomConfig::default();
        assert_eq!(config.pipeline.kind, "minecraft");
        assert_eq!(config.remap.from, "intermediate");
        assert_eq!(config.remap.to, "named");
        assert_eq!(config.remap.skip_prefixes, ["java/"]);
        assert_eq!(config.inputs.userdev_subtree, "inject");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_resolve_paths_against_base() {
        let mut config = JarloomConfig::default();
        config.inputs.client_jar = Some("jars/client.jar".into());
        config.inputs.mappings = Some("/abs/mappings.tiny".into());
        config.inputs.libraries = vec!["libs/a.jar".into()];
        config.tools.patcher = Some(ToolConfig {
            jar: "tools/patcher.jar".into(),
            java: Some("java".into()),
            args: None,
        });

        config.resolve_paths(Path::new("/project"));

        assert_eq!(config.inputs.client_jar.as_deref(), Some(Path::new("/project/jars/client.jar")));
        assert_eq!(config.inputs.mappings.as_deref(), Some(Path::new("/abs/mappings.tiny")));
        assert_eq!(config.inputs.libraries, [PathBuf::from("/project/libs/a.jar")]);
        let patcher = config.tools.patcher.unwrap();
        assert_eq!(patcher.jar, Path::new("/project/tools/patcher.jar"));
        assert_eq!(patcher.java.as_deref(), Some(Path::new("java")));
    }

    #[test]
    fn test_validate_inputs_lists_missing() {
        let mut config = JarloomConfig::default();
        config.inputs.client_jar = Some("c.jar".into());
        let err = config.validate_inputs().unwrap_err().to_string();
        assert!(err.contains("pipeline.version"));
        assert!(err.contains("inputs.server_jar"));
        assert!(!err.contains("inputs.client_jar"));
    }

    #[test]
    fn test_same_namespaces_rejected() {
        let mut config = JarloomConfig::default();
        config.remap.to = config.remap.from.clone();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_access_override_discovery_order() {
        let dir = TempDir::new().unwrap();
        let first = dir.path().join("first");
        let second = dir.path().join("second");
        fs::create_dir_all(second.join("META-INF")).unwrap();
        fs::write(second.join(RULES_PATH), "public a.B\n").unwrap();

        let mut config = JarloomConfig::default();
        config.inputs.resource_roots = vec![first.clone(), second.clone()];
        assert_eq!(config.access_override(), Some(second.join(RULES_PATH)));

        fs::create_dir_all(first.join("META-INF")).unwrap();
        fs::write(first.join(RULES_PATH), "public a.C\n").unwrap();
        assert_eq!(config.access_override(), Some(first.join(RULES_PATH)));
    }
}
