//! Hierarchy facts precomputed from class headers in a set of jars.

use super::{ClassInfo, HierarchyResolver};
use crate::bytecode::{is_class_entry, read_class_info};
use crate::errors::{PipelineError, Result};
use crate::jar::Jar;
use rayon::prelude::*;
use std::collections::HashMap;
use std::path::PathBuf;

#[derive(Debug, Clone, Default)]
pub struct ClasspathIndex {
    classes: HashMap<String, ClassInfo>,
}

impl ClasspathIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index every class header in `jars`. When two jars define the same
    /// class, the one listed first wins.
    pub fn from_jars<I, P>(jars: I) -> Result<Self>
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let jars: Vec<PathBuf> = jars.into_iter().map(Into::into).collect();

        let per_jar: Vec<Vec<ClassInfo>> = jars
            .par_iter()
            .map(|path| {
                let jar = Jar::open(path)?;
                jar.entries()
                    .filter(|(name, _)| is_class_entry(name))
                    .map(|(name, bytes)| {
                        read_class_info(bytes).map_err(|e| {
                            PipelineError::class_format(
                                format!("{}!{}", path.display(), name),
                                e.to_string(),
                            )
                        })
                    })
                    .collect::<Result<Vec<_>>>()
            })
            .collect::<Result<Vec<_>>>()?;

        let mut index = Self::new();
        for info in per_jar.into_iter().flatten() {
            index.classes.entry(info.name.clone()).or_insert(info);
        }

        log::debug!(
            "Indexed {} classes from {} jars",
            index.classes.len(),
            jars.len()
        );
        Ok(index)
    }

    /// Add a class unless one of the same name is already indexed.
    pub fn insert(&mut self, info: ClassInfo) -> bool {
        if self.classes.contains_key(&info.name) {
            return false;
        }
        self.classes.insert(info.name.clone(), info);
        true
    }

    pub fn with_class(mut self, info: ClassInfo) -> Self {
        self.insert(info);
        self
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

impl HierarchyResolver for ClasspathIndex {
    fn class_info(&self, name: &str) -> Option<&ClassInfo> {
        self.classes.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::{ClassFileBuilder, JarBuilder};
    use tempfile::TempDir;

    #[test]
    fn test_indexes_class_headers() {
        let dir = TempDir::new().unwrap();
        let jar = JarBuilder::new()
            .class(ClassFileBuilder::new("a/C").extends("a/B").implements("a/I"))
            .resource("readme.txt", "hi")
            .write(dir.path().join("lib.jar"));

        let index = ClasspathIndex::from_jars([jar]).unwrap();
        assert_eq!(index.len(), 1);
        let info = index.class_info("a/C").unwrap();
        assert_eq!(info.super_name.as_deref(), Some("a/B"));
        assert_eq!(info.interfaces, ["a/I"]);
    }

    #[test]
    fn test_first_jar_wins() {
        let dir = TempDir::new().unwrap();
        let first = JarBuilder::new()
            .class(ClassFileBuilder::new("a/C").extends("a/First"))
            .write(dir.path().join("first.jar"));
        let second = JarBuilder::new()
            .class(ClassFileBuilder::new("a/C").extends("a/Second"))
            .write(dir.path().join("second.jar"));

        let index = ClasspathIndex::from_jars([first, second]).unwrap();
        assert_eq!(
            index.class_info("a/C").unwrap().super_name.as_deref(),
            Some("a/First")
        );
    }

    #[test]
    fn test_insert_does_not_override() {
        let mut index = ClasspathIndex::new().with_class(ClassInfo::new("x").extends("y"));
        assert!(!index.insert(ClassInfo::new("x").extends("z")));
        assert_eq!(index.class_info("x").unwrap().super_name.as_deref(), Some("y"));
    }
}
