// Shared fixtures for jarloom integration tests
#![allow(dead_code)]

use jarloom::access::RULES_PATH;
use jarloom::hierarchy::{ClassInfo, ClasspathIndex, HierarchyResolver};
use jarloom::jar::MANIFEST_PATH;
use jarloom::testkit::{ClassFileBuilder, JarBuilder, OverlayPatcher};
use jarloom::tools::{BuiltinAccessTransformer, PatchApplier, Toolset};
use jarloom::{JarloomConfig, PipelineOrchestrator};
use parking_lot::Mutex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// Hierarchy resolver that records every class it is asked about.
pub struct RecordingResolver {
    inner: ClasspathIndex,
    visits: Mutex<Vec<String>>,
}

impl RecordingResolver {
    pub fn new(classes: impl IntoIterator<Item = ClassInfo>) -> Self {
        let mut inner = ClasspathIndex::new();
        for class in classes {
            inner.insert(class);
        }
        Self {
            inner,
            visits: Mutex::new(Vec::new()),
        }
    }

    pub fn visits(&self) -> Vec<String> {
        self.visits.lock().clone()
    }

    pub fn reset(&self) {
        self.visits.lock().clear();
    }
}

impl HierarchyResolver for RecordingResolver {
    fn class_info(&self, name: &str) -> Option<&ClassInfo> {
        self.visits.lock().push(name.to_string());
        self.inner.class_info(name)
    }
}

pub const MAPPINGS: &str = "tiny\t2\t0\tintermediate\tnamed
c\tclass_1\tpkg/Widget
\tm\t()V\tmethod_1\tspin
\tf\tI\tfield_1\tcount
c\tclass_2\tpkg/Base
c\tclass_3\tpkg/Extra
";

/// A project with every pipeline input in a temporary directory.
pub struct PipelineFixture {
    pub dir: TempDir,
    pub config: JarloomConfig,
}

impl PipelineFixture {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("temp dir");
        let root = dir.path();
        let inputs = root.join("inputs");
        fs::create_dir_all(&inputs).expect("inputs dir");

        let client_jar = JarBuilder::new()
            .class(ClassFileBuilder::new("class_1").extends("class_2").method("method_1", "()V"))
            .class(ClassFileBuilder::new("class_2"))
            .class(ClassFileBuilder::new("class_3").field("field_1", "I"))
            .resource("assets/client.txt", "client only")
            .resource("shared.txt", "client")
            .write(inputs.join("client.jar"));
        let server_jar = JarBuilder::new()
            .class(ClassFileBuilder::new("class_1").extends("class_2").method("method_1", "()V"))
            .class(ClassFileBuilder::new("class_2"))
            .resource("server.properties", "motd=hello")
            .resource("shared.txt", "server")
            .write(inputs.join("server.jar"));

        let client_patches = patch_set(&inputs.join("client.patches"), "clientPatch");
        let server_patches = patch_set(&inputs.join("server.patches"), "serverPatch");

        let companion_jar = JarBuilder::new()
            .resource(MANIFEST_PATH, "Manifest-Version: 1.0\nMain-Class: companion\n")
            .class(ClassFileBuilder::new("mod/Companion").extends("class_1"))
            .write(inputs.join("companion.jar"));
        let userdev_jar = JarBuilder::new()
            .resource(
                "inject/mod/Helper.class",
                ClassFileBuilder::new("mod/Helper").method_ref("mod/Companion", "method_1", "()V").build(),
            )
            .resource("inject/shared.txt", "userdev")
            .write(inputs.join("userdev.jar"));

        let mappings = inputs.join("mappings.tiny");
        fs::write(&mappings, MAPPINGS).expect("mappings");

        let mut config = JarloomConfig::default();
        config.pipeline.version = "1.0".to_string();
        config.pipeline.patch_version = Some("7".to_string());
        config.pipeline.cache_dir = Some(root.join("cache"));
        config.inputs.client_jar = Some(client_jar);
        config.inputs.server_jar = Some(server_jar);
        config.inputs.client_patches = Some(client_patches);
        config.inputs.server_patches = Some(server_patches);
        config.inputs.companion_jar = Some(companion_jar);
        config.inputs.userdev_jar = Some(userdev_jar);
        config.inputs.mappings = Some(mappings);
        config.inputs.resource_roots = vec![root.join("resources")];
        config.base_dir = root.to_path_buf();

        Self { dir, config }
    }

    pub fn toolset() -> Toolset {
        Self::toolset_with(Arc::new(OverlayPatcher::default()))
    }

    pub fn toolset_with(patcher: Arc<dyn PatchApplier>) -> Toolset {
        Toolset::new(patcher, Arc::new(BuiltinAccessTransformer))
    }

    pub fn orchestrator(&self) -> PipelineOrchestrator {
        self.orchestrator_with(&Self::toolset())
    }

    pub fn orchestrator_with(&self, toolset: &Toolset) -> PipelineOrchestrator {
        PipelineOrchestrator::from_config(&self.config, toolset).expect("valid fixture config")
    }

    /// Write (or replace) the project's access-rule override.
    pub fn write_override(&self, rules: &str) -> PathBuf {
        let path = self.dir.path().join("resources").join(RULES_PATH);
        fs::create_dir_all(path.parent().expect("rules dir")).expect("rules dir");
        fs::write(&path, rules).expect("override rules");
        path
    }

    /// Replace a side's patch set with one carrying a different patched method.
    pub fn change_patches(&self, side_patches: &Path, method: &str) {
        patch_set(side_patches, method);
    }

    pub fn client_patches(&self) -> PathBuf {
        self.config.inputs.client_patches.clone().expect("client patches")
    }
}

fn patch_set(path: &Path, method: &str) -> PathBuf {
    JarBuilder::new()
        .class(
            ClassFileBuilder::new("class_1")
                .extends("class_2")
                .method("method_1", "()V")
                .method(method, "()V"),
        )
        .write(path)
}
