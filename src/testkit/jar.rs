use super::ClassFileBuilder;
use crate::jar::Jar;
use std::path::{Path, PathBuf};

/// Assembles a jar from built classes and raw resources.
#[derive(Debug, Clone, Default)]
pub struct JarBuilder {
    entries: Vec<(String, Vec<u8>)>,
}

impl JarBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn class(mut self, class: ClassFileBuilder) -> Self {
        self.entries
            .push((format!("{}.class", class.name()), class.build()));
        self
    }

    pub fn resource(mut self, name: &str, bytes: impl AsRef<[u8]>) -> Self {
        self.entries
            .push((name.to_string(), bytes.as_ref().to_vec()));
        self
    }

    /// The archive in memory, addressed at `path`.
    pub fn build(&self, path: impl AsRef<Path>) -> Jar {
        let mut jar = Jar::new(path.as_ref());
        for (name, bytes) in &self.entries {
            jar.insert(name.clone(), bytes.clone());
        }
        jar
    }

    /// Write the archive and return its path.
    pub fn write(&self, path: impl AsRef<Path>) -> PathBuf {
        let path = path.as_ref().to_path_buf();
        self.build(&path)
            .write()
            .expect("test jar should be writable");
        path
    }
}
