//! Process-backed tools launched as `java -jar <tool> <args>`.

use super::{AccessTransformer, PatchApplier, ToolContext};
use crate::config::ToolConfig;
use crate::errors::Result;
use std::path::{Path, PathBuf};
use std::process::Command;

pub const DEFAULT_PATCHER_ARGS: &[&str] = &[
    "--clean", "{clean}", "--output", "{output}", "--apply", "{patches}",
];

pub const DEFAULT_ACCESS_TRANSFORMER_ARGS: &[&str] = &[
    "--inJar", "{input}", "--outJar", "{output}", "--atFile", "{rules}",
];

#[derive(Debug, Clone)]
pub struct JavaTool {
    name: String,
    java: Option<PathBuf>,
    jar: PathBuf,
    args: Option<Vec<String>>,
}

impl JavaTool {
    pub fn new(name: impl Into<String>, jar: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            java: None,
            jar: jar.into(),
            args: None,
        }
    }

    pub fn from_config(name: &str, config: &ToolConfig) -> Self {
        Self {
            name: name.to_string(),
            java: config.java.clone(),
            jar: config.jar.clone(),
            args: config.args.clone(),
        }
    }

    pub fn with_java(mut self, java: impl Into<PathBuf>) -> Self {
        self.java = Some(java.into());
        self
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = Some(args.into_iter().map(Into::into).collect());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn java_executable(&self, ctx: ToolContext) -> Result<PathBuf> {
        match &self.java {
            Some(java) => Ok(java.clone()),
            None => which::which("java")
                .map_err(|e| ctx.failure(&self.name, None, format!("java not found in PATH: {}", e))),
        }
    }

    /// Run the tool with `{key}` placeholders in its arguments replaced.
    pub fn invoke(&self, defaults: &[&str], substitutions: &[(&str, &Path)], ctx: ToolContext) -> Result<()> {
        let java = self.java_executable(ctx)?;
        let args: Vec<String> = match &self.args {
            Some(args) => args.iter().map(|a| substitute(a, substitutions)).collect(),
            None => defaults.iter().map(|a| substitute(a, substitutions)).collect(),
        };

        log::debug!(
            "Running {}: {} -jar {} {}",
            self.name,
            java.display(),
            self.jar.display(),
            args.join(" ")
        );

        let output = Command::new(&java)
            .arg("-jar")
            .arg(&self.jar)
            .args(&args)
            .output()
            .map_err(|e| ctx.failure(&self.name, None, format!("failed to launch {}: {}", java.display(), e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ctx.failure(&self.name, output.status.code(), stderr.trim()));
        }
        Ok(())
    }
}

fn substitute(arg: &str, substitutions: &[(&str, &Path)]) -> String {
    substitutions
        .iter()
        .fold(arg.to_string(), |acc, (key, value)| {
            acc.replace(&format!("{{{}}}", key), &value.to_string_lossy())
        })
}

#[derive(Debug, Clone)]
pub struct ExternalPatcher {
    tool: JavaTool,
}

impl ExternalPatcher {
    pub fn new(tool: JavaTool) -> Self {
        Self { tool }
    }
}

impl PatchApplier for ExternalPatcher {
    fn name(&self) -> &str {
        self.tool.name()
    }

    fn apply_patches(&self, clean: &Path, patches: &Path, output: &Path, ctx: ToolContext) -> Result<()> {
        self.tool.invoke(
            DEFAULT_PATCHER_ARGS,
            &[("clean", clean), ("patches", patches), ("output", output)],
            ctx,
        )
    }
}

#[derive(Debug, Clone)]
pub struct ExternalAccessTransformer {
    tool: JavaTool,
}

impl ExternalAccessTransformer {
    pub fn new(tool: JavaTool) -> Self {
        Self { tool }
    }
}

impl AccessTransformer for ExternalAccessTransformer {
    fn name(&self) -> &str {
        self.tool.name()
    }

    fn transform(&self, input: &Path, rules: &Path, output: &Path, ctx: ToolContext) -> Result<()> {
        self.tool.invoke(
            DEFAULT_ACCESS_TRANSFORMER_ARGS,
            &[("input", input), ("rules", rules), ("output", output)],
            ctx,
        )
    }
}
