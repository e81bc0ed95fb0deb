use crate::errors::Result;
use crate::hierarchy::ClasspathIndex;
use crate::jar::Jar;
use crate::mapping::{MappingIndex, MappingTree};
use crate::pipeline::stage::PipelineStage;
use crate::pipeline::{Artifact, StageKind, Variant};
use crate::remap::{remap_jar, NamespaceRemapper};
use once_cell::sync::OnceCell;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A mapping file loaded at most once and shared by both remap stages.
#[derive(Debug)]
pub struct MappingSource {
    path: PathBuf,
    from: String,
    to: String,
    index: OnceCell<Arc<MappingIndex>>,
}

impl MappingSource {
    pub fn new(path: impl Into<PathBuf>, from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            from: from.into(),
            to: to.into(),
            index: OnceCell::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn index(&self) -> Result<Arc<MappingIndex>> {
        self.index
            .get_or_try_init(|| {
                let tree = MappingTree::load(&self.path)?;
                let index = tree.index(&self.from, &self.to)?;
                log::debug!(
                    "Loaded {} class mappings {} -> {} from {}",
                    index.class_count(),
                    self.from,
                    self.to,
                    self.path.display()
                );
                Ok(Arc::new(index))
            })
            .cloned()
    }
}

/// Renames classes and members from one namespace to another.
pub struct RemapStage {
    variant: Variant,
    input: PathBuf,
    output: PathBuf,
    mappings: Arc<MappingSource>,
    libraries: Vec<PathBuf>,
    skip_prefixes: Vec<String>,
}

impl RemapStage {
    pub fn new(
        variant: Variant,
        input: impl Into<PathBuf>,
        output: impl Into<PathBuf>,
        mappings: Arc<MappingSource>,
    ) -> Self {
        Self {
            variant,
            input: input.into(),
            output: output.into(),
            mappings,
            libraries: Vec::new(),
            skip_prefixes: Vec::new(),
        }
    }

    /// Jars consulted for hierarchy facts after the input itself.
    pub fn with_libraries(mut self, libraries: Vec<PathBuf>) -> Self {
        self.libraries = libraries;
        self
    }

    pub fn with_skip_prefixes(mut self, prefixes: Vec<String>) -> Self {
        self.skip_prefixes = prefixes;
        self
    }
}

impl PipelineStage for RemapStage {
    fn kind(&self) -> StageKind {
        StageKind::Remap
    }

    fn variant(&self) -> Variant {
        self.variant
    }

    fn inputs(&self) -> Vec<PathBuf> {
        let mut inputs = vec![self.input.clone(), self.mappings.path().to_path_buf()];
        inputs.extend(self.libraries.iter().cloned());
        inputs
    }

    fn output_path(&self) -> &Path {
        &self.output
    }

    fn run(&self) -> Result<Artifact> {
        let index = self.mappings.index()?;

        let classpath = std::iter::once(&self.input).chain(self.libraries.iter());
        let hierarchy = ClasspathIndex::from_jars(classpath)?;
        log::debug!(
            "Hierarchy for {} remap covers {} classes",
            self.variant,
            hierarchy.len()
        );

        let mut remapper = NamespaceRemapper::new(index, Arc::new(hierarchy));
        if !self.skip_prefixes.is_empty() {
            remapper = remapper.with_skip_prefixes(self.skip_prefixes.iter());
        }

        let input = Jar::open(&self.input)?;
        let output = remap_jar(&input, &remapper, &self.output)?;
        output.write()?;

        Ok(Artifact::new(
            StageKind::Remap.produces(),
            self.variant,
            &self.output,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::stage::execute_stage;
    use crate::testkit::{ClassFileBuilder, JarBuilder};
    use indoc::indoc;
    use std::fs;
    use tempfile::TempDir;

    const MAPPINGS: &str = indoc! {"
        tiny\t2\t0\tintermediate\tnamed
        c\tclass_1\tpkg/Widget
        \tm\t()V\tmethod_1\tspin
        c\tclass_2\tpkg/Base
        \tm\t()V\tmethod_2\tinit
    "};

    #[test]
    fn test_remaps_with_library_hierarchy() {
        let dir = TempDir::new().unwrap();
        let mappings = dir.path().join("mappings.tiny");
        fs::write(&mappings, MAPPINGS).unwrap();

        let library = JarBuilder::new()
            .class(ClassFileBuilder::new("class_2").method("method_2", "()V"))
            .write(dir.path().join("lib.jar"));
        let input = JarBuilder::new()
            .class(
                ClassFileBuilder::new("class_1")
                    .extends("class_2")
                    .method("method_1", "()V")
                    .method_ref("mod/Sub", "method_2", "()V"),
            )
            .class(ClassFileBuilder::new("mod/Sub").extends("class_1"))
            .write(dir.path().join("in.jar"));

        let source = Arc::new(MappingSource::new(&mappings, "intermediate", "named"));
        let stage = RemapStage::new(
            Variant::Client,
            &input,
            dir.path().join("remapped.jar"),
            source.clone(),
        )
        .with_libraries(vec![library]);
        execute_stage(&stage).unwrap();

        let out = Jar::open(stage.output_path()).unwrap();
        let names: Vec<_> = out.names().collect();
        assert_eq!(names, ["mod/Sub.class", "pkg/Widget.class"]);

        let widget = crate::bytecode::ClassFile::parse(out.get("pkg/Widget.class").unwrap()).unwrap();
        assert_eq!(widget.super_name().unwrap(), Some("pkg/Base"));
        let method_names: Vec<&str> = widget
            .pool
            .iter()
            .filter_map(|(index, _)| widget.pool.utf8(index).ok())
            .collect();
        assert!(method_names.contains(&"spin"));
        assert!(method_names.contains(&"init"));

        let first = source.index().unwrap();
        let second = source.index().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }
}
