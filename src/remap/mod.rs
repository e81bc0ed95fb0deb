//! Hierarchy-aware symbol remapping between two namespaces.
//!
//! Resolution order for a member query:
//!
//! 1. With no owner, or an owner the mapping knows in either namespace, a
//!    flat lookup by name + descriptor (methods may omit the descriptor).
//! 2. When that lookup misses and the owner or descriptor were given in the
//!    target namespace, they are translated back and the query is retried
//!    once.
//! 3. Otherwise a breadth-first walk over the owner's superclass and
//!    interfaces, trying a lookup scoped to each ancestor. The first unique
//!    hit wins; an exhausted walk passes the name through unchanged.
//!
//! Only a name-only query with no owner against an ambiguous entry is an
//! error. Every other miss is a pass-through.

pub mod inner;
pub mod jar;

pub use inner::remap_inner_class;
pub use jar::remap_jar;

use crate::errors::{MemberKind, PipelineError, Result};
use crate::hierarchy::HierarchyResolver;
use crate::mapping::{remap_descriptor, remap_type_name, LookupResult, MappingIndex, MappingTree};
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

/// Ancestors under these prefixes never declare mapped members.
pub const DEFAULT_SKIP_PREFIXES: &[&str] = &["java/"];

#[derive(Clone)]
pub struct NamespaceRemapper {
    index: Arc<MappingIndex>,
    hierarchy: Arc<dyn HierarchyResolver>,
    skip_prefixes: Vec<String>,
}

impl NamespaceRemapper {
    pub fn new(index: Arc<MappingIndex>, hierarchy: Arc<dyn HierarchyResolver>) -> Self {
        Self {
            index,
            hierarchy,
            skip_prefixes: DEFAULT_SKIP_PREFIXES.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn with_skip_prefixes<I, S>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.skip_prefixes = prefixes.into_iter().map(Into::into).collect();
        self
    }

    pub fn index(&self) -> &MappingIndex {
        &self.index
    }

    pub fn from_namespace(&self) -> &str {
        self.index.from_namespace()
    }

    pub fn to_namespace(&self) -> &str {
        self.index.to_namespace()
    }

    pub fn resolve_method_name(
        &self,
        owner: Option<&str>,
        name: &str,
        descriptor: Option<&str>,
    ) -> Result<String> {
        self.resolve(MemberKind::Method, owner, name, descriptor, false)
    }

    /// Fields always resolve on name + descriptor.
    pub fn resolve_field_name(
        &self,
        owner: Option<&str>,
        name: &str,
        descriptor: &str,
    ) -> Result<String> {
        self.resolve(MemberKind::Field, owner, name, Some(descriptor), false)
    }

    /// Class name in the target namespace. Unlisted nested classes keep
    /// their inner fragment and take the mapped outer name.
    pub fn map_class_name(&self, name: &str) -> String {
        if let Some(mapped) = self.index.map_class(name) {
            return mapped.to_string();
        }
        remap_inner_class(name, |outer| self.index.map_class(outer).map(str::to_string))
            .unwrap_or_else(|| name.to_string())
    }

    pub fn map_descriptor(&self, descriptor: &str) -> String {
        remap_descriptor(descriptor, |class| Some(self.map_class_name(class)))
    }

    /// Class constant names may be plain internal names or array descriptors.
    pub fn map_type_name(&self, name: &str) -> String {
        remap_type_name(name, |class| Some(self.map_class_name(class)))
    }

    fn resolve(
        &self,
        kind: MemberKind,
        owner: Option<&str>,
        name: &str,
        descriptor: Option<&str>,
        retried: bool,
    ) -> Result<String> {
        if let Some(owner) = owner.filter(|o| !self.index.is_known_class(o)) {
            return Ok(self.walk(kind, owner, name, descriptor));
        }

        match (self.index.lookup(kind, name, descriptor), owner) {
            (LookupResult::Unique(target), _) => Ok(target.to_string()),
            (LookupResult::Ambiguous, None) => Err(PipelineError::UnresolvableReference {
                kind,
                name: name.to_string(),
                descriptor: descriptor.map(str::to_string),
            }),
            (LookupResult::Ambiguous, Some(owner)) => {
                Ok(self.walk(kind, owner, name, descriptor))
            }
            (LookupResult::Absent, None) => Ok(name.to_string()),
            (LookupResult::Absent, Some(owner)) => {
                if retried {
                    return Ok(name.to_string());
                }
                let unmapped_owner = self.index.unmap_class(owner).unwrap_or(owner);
                let unmapped_desc = descriptor.map(|d| self.index.unmap_descriptor(d));
                if unmapped_owner != owner || unmapped_desc.as_deref() != descriptor {
                    log::trace!(
                        "Retrying {} {} with owner {} translated to {}",
                        kind,
                        name,
                        owner,
                        unmapped_owner
                    );
                    self.resolve(
                        kind,
                        Some(unmapped_owner),
                        name,
                        unmapped_desc.as_deref(),
                        true,
                    )
                } else {
                    Ok(name.to_string())
                }
            }
        }
    }

    fn walk(&self, kind: MemberKind, owner: &str, name: &str, descriptor: Option<&str>) -> String {
        let unmapped_desc = descriptor.map(|d| self.index.unmap_descriptor(d));

        let mut visited: HashSet<String> = HashSet::new();
        let mut queue: VecDeque<String> = VecDeque::new();
        visited.insert(owner.to_string());
        queue.push_back(owner.to_string());

        while let Some(class) = queue.pop_front() {
            let info = self.hierarchy.class_info(&class);

            if let Some(target) = self.scoped_lookup(kind, &class, name, descriptor, &unmapped_desc)
            {
                return target;
            }

            let Some(info) = info else {
                continue;
            };
            let ancestors = info.super_name.iter().chain(info.interfaces.iter());
            for ancestor in ancestors {
                if self.is_skipped(ancestor) {
                    continue;
                }
                if visited.insert(ancestor.clone()) {
                    queue.push_back(ancestor.clone());
                }
            }
        }

        name.to_string()
    }

    /// Lookup scoped to `class`, trying it as a source name and then
    /// translated back from the target namespace.
    fn scoped_lookup(
        &self,
        kind: MemberKind,
        class: &str,
        name: &str,
        descriptor: Option<&str>,
        unmapped_desc: &Option<String>,
    ) -> Option<String> {
        if let LookupResult::Unique(target) = self.index.lookup_in(class, kind, name, descriptor) {
            return Some(target.to_string());
        }

        let unmapped = self.index.unmap_class(class)?;
        match self
            .index
            .lookup_in(unmapped, kind, name, unmapped_desc.as_deref())
        {
            LookupResult::Unique(target) => Some(target.to_string()),
            _ => None,
        }
    }

    fn is_skipped(&self, class: &str) -> bool {
        self.skip_prefixes.iter().any(|p| class.starts_with(p.as_str()))
    }
}

impl std::fmt::Debug for NamespaceRemapper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NamespaceRemapper")
            .field("from", &self.index.from_namespace())
            .field("to", &self.index.to_namespace())
            .field("skip_prefixes", &self.skip_prefixes)
            .finish()
    }
}

impl MappingTree {
    /// Build a remapper for `from -> to` backed by `hierarchy`.
    pub fn remapper(
        &self,
        from: &str,
        to: &str,
        hierarchy: Arc<dyn HierarchyResolver>,
    ) -> Result<NamespaceRemapper> {
        let index = Arc::new(self.index(from, to)?);
        Ok(NamespaceRemapper::new(index, hierarchy))
    }
}
