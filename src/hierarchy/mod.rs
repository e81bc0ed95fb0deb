//! Class ancestry facts for the remapper's hierarchy walk.
//!
//! The remapper never loads classes itself; it asks a [`HierarchyResolver`]
//! for the superclass and declared interfaces of a class name. The
//! production implementation is a [`ClasspathIndex`] read from jar headers.

pub mod classpath;

pub use classpath::ClasspathIndex;

/// Superclass and interface facts for one class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassInfo {
    pub name: String,
    pub super_name: Option<String>,
    pub interfaces: Vec<String>,
}

impl ClassInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            super_name: None,
            interfaces: Vec::new(),
        }
    }

    pub fn extends(mut self, super_name: impl Into<String>) -> Self {
        self.super_name = Some(super_name.into());
        self
    }

    pub fn implements<I, S>(mut self, interfaces: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.interfaces.extend(interfaces.into_iter().map(Into::into));
        self
    }
}

/// Read-only oracle answering "what does this class extend and implement?".
pub trait HierarchyResolver: Send + Sync {
    fn class_info(&self, name: &str) -> Option<&ClassInfo>;
}
