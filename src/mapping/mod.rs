//! Cross-namespace symbol tables.
//!
//! A [`MappingTree`] holds every class and member record read from a mapping
//! source, each carrying one name per namespace. Member descriptors are stored
//! once, in the first namespace, and derived for the others by rewriting the
//! class references they contain. [`MappingIndex`] is the immutable lookup
//! structure built from a tree for one `(from, to)` namespace pair.

pub mod descriptor;
pub mod index;
pub mod tiny;

pub use descriptor::{remap_descriptor, remap_type_name};
pub use index::{LookupResult, MappingIndex, MemberTable};
pub use tiny::read_tiny_v2;

use crate::errors::{PipelineError, Result};
use std::collections::HashMap;
use std::path::Path;

/// A field or method record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberEntity {
    names: Vec<String>,
    descriptor: String,
}

impl MemberEntity {
    /// `descriptor` is expressed in the tree's first namespace.
    pub fn new<I, S>(names: I, descriptor: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
            descriptor: descriptor.into(),
        }
    }

    pub fn name(&self, namespace: usize) -> &str {
        self.names
            .get(namespace)
            .or_else(|| self.names.first())
            .map(String::as_str)
            .unwrap_or_default()
    }

    /// Descriptor in the first namespace of the owning tree.
    pub fn source_descriptor(&self) -> &str {
        &self.descriptor
    }
}

/// A class record with its declared members.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassEntity {
    names: Vec<String>,
    fields: Vec<MemberEntity>,
    methods: Vec<MemberEntity>,
}

impl ClassEntity {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
            fields: Vec::new(),
            methods: Vec::new(),
        }
    }

    pub fn with_field<I, S>(mut self, names: I, descriptor: &str) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields.push(MemberEntity::new(names, descriptor));
        self
    }

    pub fn with_method<I, S>(mut self, names: I, descriptor: &str) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.methods.push(MemberEntity::new(names, descriptor));
        self
    }

    pub fn push_field(&mut self, field: MemberEntity) {
        self.fields.push(field);
    }

    pub fn push_method(&mut self, method: MemberEntity) {
        self.methods.push(method);
    }

    pub fn name(&self, namespace: usize) -> &str {
        self.names
            .get(namespace)
            .or_else(|| self.names.first())
            .map(String::as_str)
            .unwrap_or_default()
    }

    pub fn fields(&self) -> &[MemberEntity] {
        &self.fields
    }

    pub fn methods(&self) -> &[MemberEntity] {
        &self.methods
    }
}

/// Every class/member record of a mapping source, with the namespaces in
/// column order.
#[derive(Debug, Clone, Default)]
pub struct MappingTree {
    namespaces: Vec<String>,
    classes: Vec<ClassEntity>,
}

impl MappingTree {
    pub fn new<I, S>(namespaces: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            namespaces: namespaces.into_iter().map(Into::into).collect(),
            classes: Vec::new(),
        }
    }

    /// Read a Tiny v2 file from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| PipelineError::io(path, e))?;
        read_tiny_v2(&text)
    }

    pub fn add_class(&mut self, class: ClassEntity) {
        self.classes.push(class);
    }

    pub fn with_class(mut self, class: ClassEntity) -> Self {
        self.add_class(class);
        self
    }

    pub fn namespaces(&self) -> &[String] {
        &self.namespaces
    }

    pub fn classes(&self) -> &[ClassEntity] {
        &self.classes
    }

    /// Column of `namespace`, or a mapping error naming the known ones.
    pub fn namespace_id(&self, namespace: &str) -> Result<usize> {
        self.namespaces
            .iter()
            .position(|ns| ns == namespace)
            .ok_or_else(|| PipelineError::Mapping {
                line: 0,
                message: format!(
                    "unknown namespace '{}' (available: {})",
                    namespace,
                    self.namespaces.join(", ")
                ),
            })
    }

    /// Class name table between two namespace columns.
    pub fn class_names(&self, from: usize, to: usize) -> HashMap<String, String> {
        self.classes
            .iter()
            .map(|class| (class.name(from).to_string(), class.name(to).to_string()))
            .collect()
    }

    /// Build the lookup index for `from -> to`.
    pub fn index(&self, from: &str, to: &str) -> Result<MappingIndex> {
        MappingIndex::build(self, from, to)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_member_name_falls_back_to_first_namespace() {
        let member = MemberEntity::new(["a"], "I");
        assert_eq!(member.name(0), "a");
        assert_eq!(member.name(2), "a");
    }

    #[test]
    fn test_namespace_id_reports_available() {
        let tree = MappingTree::new(["official", "named"]);
        assert_eq!(tree.namespace_id("named").unwrap(), 1);

        let err = tree.namespace_id("srg").unwrap_err();
        assert!(err.to_string().contains("official, named"));
    }

    #[test]
    fn test_class_names_table() {
        let tree = MappingTree::new(["official", "named"])
            .with_class(ClassEntity::new(["a", "com/example/Alpha"]))
            .with_class(ClassEntity::new(["b", "com/example/Beta"]));

        let table = tree.class_names(0, 1);
        assert_eq!(table["a"], "com/example/Alpha");
        assert_eq!(table["b"], "com/example/Beta");
    }
}
