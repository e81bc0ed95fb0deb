//! Immutable lookup tables for one `(from, to)` namespace pair.
//!
//! The index is built eagerly from a [`MappingTree`] and never mutated after
//! construction. It carries two families of member tables:
//!
//! - flat tables keyed by member name (and name + descriptor) across every
//!   class, used when the caller cannot or need not name an owner;
//! - per-class tables keyed by the owning class's `from` name, used while
//!   walking a class hierarchy.
//!
//! Each entry is either a single target name or the marker that two or more
//! distinct target names were registered under the same key.

use super::descriptor::remap_descriptor;
use super::{MappingTree, MemberEntity};
use crate::errors::{MemberKind, Result};
use std::collections::{HashMap, HashSet};

/// Outcome of a single table lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupResult<'a> {
    Unique(&'a str),
    Ambiguous,
    Absent,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Entry {
    Unique(String),
    Ambiguous,
}

impl Entry {
    fn merge(&mut self, target: &str) {
        if let Entry::Unique(existing) = self {
            if existing != target {
                *self = Entry::Ambiguous;
            }
        }
    }

    fn as_lookup(&self) -> LookupResult<'_> {
        match self {
            Entry::Unique(name) => LookupResult::Unique(name),
            Entry::Ambiguous => LookupResult::Ambiguous,
        }
    }
}

/// Name and name+descriptor tables for one member kind.
#[derive(Debug, Clone, Default)]
pub struct MemberTable {
    by_name: HashMap<String, Entry>,
    by_name_desc: HashMap<String, HashMap<String, Entry>>,
}

impl MemberTable {
    fn insert(&mut self, name: &str, descriptor: &str, target: &str) {
        self.by_name
            .entry(name.to_string())
            .and_modify(|e| e.merge(target))
            .or_insert_with(|| Entry::Unique(target.to_string()));

        self.by_name_desc
            .entry(name.to_string())
            .or_default()
            .entry(descriptor.to_string())
            .and_modify(|e| e.merge(target))
            .or_insert_with(|| Entry::Unique(target.to_string()));
    }

    /// Name + descriptor when a descriptor is given, name only otherwise.
    pub fn lookup(&self, name: &str, descriptor: Option<&str>) -> LookupResult<'_> {
        let entry = match descriptor {
            Some(desc) => self.by_name_desc.get(name).and_then(|d| d.get(desc)),
            None => self.by_name.get(name),
        };
        entry.map_or(LookupResult::Absent, Entry::as_lookup)
    }

    pub fn len(&self) -> usize {
        self.by_name_desc.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
struct ClassMembers {
    fields: MemberTable,
    methods: MemberTable,
}

impl ClassMembers {
    fn table(&self, kind: MemberKind) -> &MemberTable {
        match kind {
            MemberKind::Field => &self.fields,
            MemberKind::Method => &self.methods,
        }
    }
}

/// Precomputed cross-namespace name index for one namespace pair.
#[derive(Debug, Clone)]
pub struct MappingIndex {
    from: String,
    to: String,
    known_classes: HashSet<String>,
    classes: HashMap<String, String>,
    reverse_classes: HashMap<String, String>,
    fields: MemberTable,
    methods: MemberTable,
    scoped: HashMap<String, ClassMembers>,
}

impl MappingIndex {
    pub fn build(tree: &MappingTree, from: &str, to: &str) -> Result<Self> {
        let from_id = tree.namespace_id(from)?;
        let to_id = tree.namespace_id(to)?;

        // Descriptors are stored in column 0; translate them into `from` once.
        let source_to_from = tree.class_names(0, from_id);
        let desc_in_from = |member: &MemberEntity| {
            if from_id == 0 {
                member.source_descriptor().to_string()
            } else {
                remap_descriptor(member.source_descriptor(), |c| {
                    source_to_from.get(c).cloned()
                })
            }
        };

        let mut index = Self {
            from: from.to_string(),
            to: to.to_string(),
            known_classes: HashSet::new(),
            classes: HashMap::new(),
            reverse_classes: HashMap::new(),
            fields: MemberTable::default(),
            methods: MemberTable::default(),
            scoped: HashMap::new(),
        };

        for class in tree.classes() {
            let class_from = class.name(from_id);
            let class_to = class.name(to_id);

            index.known_classes.insert(class_from.to_string());
            index.known_classes.insert(class_to.to_string());
            index
                .classes
                .insert(class_from.to_string(), class_to.to_string());
            index
                .reverse_classes
                .insert(class_to.to_string(), class_from.to_string());

            let scoped = index.scoped.entry(class_from.to_string()).or_default();

            for field in class.fields() {
                let desc = desc_in_from(field);
                index.fields.insert(field.name(from_id), &desc, field.name(to_id));
                scoped
                    .fields
                    .insert(field.name(from_id), &desc, field.name(to_id));
            }

            for method in class.methods() {
                let desc = desc_in_from(method);
                index
                    .methods
                    .insert(method.name(from_id), &desc, method.name(to_id));
                scoped
                    .methods
                    .insert(method.name(from_id), &desc, method.name(to_id));
            }
        }

        log::debug!(
            "Built mapping index {} -> {}: {} classes, {} fields, {} methods",
            from,
            to,
            index.classes.len(),
            index.fields.len(),
            index.methods.len()
        );

        Ok(index)
    }

    pub fn from_namespace(&self) -> &str {
        &self.from
    }

    pub fn to_namespace(&self) -> &str {
        &self.to
    }

    /// Whether `name` is a class name in either namespace of the pair.
    pub fn is_known_class(&self, name: &str) -> bool {
        self.known_classes.contains(name)
    }

    pub fn class_count(&self) -> usize {
        self.classes.len()
    }

    /// `from` name to `to` name.
    pub fn map_class(&self, name: &str) -> Option<&str> {
        self.classes.get(name).map(String::as_str)
    }

    /// `to` name back to `from` name.
    pub fn unmap_class(&self, name: &str) -> Option<&str> {
        self.reverse_classes.get(name).map(String::as_str)
    }

    /// Rewrite a `to`-namespace descriptor into the `from` namespace.
    pub fn unmap_descriptor(&self, descriptor: &str) -> String {
        remap_descriptor(descriptor, |c| self.unmap_class(c).map(str::to_string))
    }

    /// Flat lookup across every class. Fields always key on name + descriptor.
    pub fn lookup(
        &self,
        kind: MemberKind,
        name: &str,
        descriptor: Option<&str>,
    ) -> LookupResult<'_> {
        match kind {
            MemberKind::Method => self.methods.lookup(name, descriptor),
            MemberKind::Field => match descriptor {
                Some(_) => self.fields.lookup(name, descriptor),
                None => LookupResult::Absent,
            },
        }
    }

    /// Lookup restricted to members declared by `owner` (a `from` class name).
    pub fn lookup_in(
        &self,
        owner: &str,
        kind: MemberKind,
        name: &str,
        descriptor: Option<&str>,
    ) -> LookupResult<'_> {
        self.scoped
            .get(owner)
            .map_or(LookupResult::Absent, |members| {
                members.table(kind).lookup(name, descriptor)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::ClassEntity;

    fn tree() -> MappingTree {
        MappingTree::new(["official", "intermediate", "named"])
            .with_class(
                ClassEntity::new(["a", "class_1", "com/example/Alpha"])
                    .with_method(["a", "method_1", "run"], "()V")
                    .with_method(["a", "method_2", "runWith"], "(La;)V")
                    .with_field(["b", "field_1", "count"], "I"),
            )
            .with_class(
                ClassEntity::new(["b", "class_2", "com/example/Beta"])
                    .with_method(["a", "method_3", "stop"], "()V")
                    .with_method(["c", "method_4", "close"], "()V"),
            )
    }

    #[test]
    fn test_name_only_ambiguity() {
        let index = tree().index("official", "named").unwrap();
        assert_eq!(
            index.lookup(MemberKind::Method, "a", None),
            LookupResult::Ambiguous
        );
        assert_eq!(
            index.lookup(MemberKind::Method, "c", None),
            LookupResult::Unique("close")
        );
    }

    #[test]
    fn test_descriptor_narrows_flat_lookup() {
        let index = tree().index("official", "named").unwrap();
        assert_eq!(
            index.lookup(MemberKind::Method, "a", Some("(La;)V")),
            LookupResult::Unique("runWith")
        );
        // Same name and descriptor in two classes stays ambiguous.
        assert_eq!(
            index.lookup(MemberKind::Method, "a", Some("()V")),
            LookupResult::Ambiguous
        );
    }

    #[test]
    fn test_descriptors_translated_into_from_namespace() {
        let index = tree().index("intermediate", "named").unwrap();
        assert_eq!(
            index.lookup(MemberKind::Method, "method_2", Some("(Lclass_1;)V")),
            LookupResult::Unique("runWith")
        );
        assert_eq!(
            index.lookup(MemberKind::Method, "method_2", Some("(La;)V")),
            LookupResult::Absent
        );
    }

    #[test]
    fn test_scoped_lookup() {
        let index = tree().index("official", "named").unwrap();
        assert_eq!(
            index.lookup_in("b", MemberKind::Method, "a", Some("()V")),
            LookupResult::Unique("stop")
        );
        assert_eq!(
            index.lookup_in("a", MemberKind::Field, "b", Some("I")),
            LookupResult::Unique("count")
        );
        assert_eq!(
            index.lookup_in("zz", MemberKind::Method, "a", None),
            LookupResult::Absent
        );
    }

    #[test]
    fn test_field_requires_descriptor() {
        let index = tree().index("official", "named").unwrap();
        assert_eq!(
            index.lookup(MemberKind::Field, "b", None),
            LookupResult::Absent
        );
    }

    #[test]
    fn test_identical_targets_are_not_ambiguous() {
        let tree = MappingTree::new(["official", "named"])
            .with_class(ClassEntity::new(["a", "A"]).with_method(["x", "tick"], "()V"))
            .with_class(ClassEntity::new(["b", "B"]).with_method(["x", "tick"], "()V"));
        let index = tree.index("official", "named").unwrap();
        assert_eq!(
            index.lookup(MemberKind::Method, "x", None),
            LookupResult::Unique("tick")
        );
    }

    #[test]
    fn test_class_tables() {
        let index = tree().index("official", "named").unwrap();
        assert!(index.is_known_class("a"));
        assert!(index.is_known_class("com/example/Alpha"));
        assert!(!index.is_known_class("class_1"));
        assert_eq!(index.map_class("b"), Some("com/example/Beta"));
        assert_eq!(index.unmap_class("com/example/Beta"), Some("b"));
        assert_eq!(
            index.unmap_descriptor("(Lcom/example/Alpha;)V"),
            "(La;)V"
        );
    }
}
