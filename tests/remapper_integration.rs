mod common;

use common::RecordingResolver;
use jarloom::bytecode::{remap_class, ClassFile};
use jarloom::hierarchy::{ClassInfo, ClasspathIndex};
use jarloom::mapping::{read_tiny_v2, ClassEntity, MappingTree};
use jarloom::testkit::ClassFileBuilder;
use jarloom::{MemberKind, NamespaceRemapper, PipelineError};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::collections::BTreeSet;
use std::sync::Arc;

fn tree() -> MappingTree {
    MappingTree::new(["intermediate", "named"])
        .with_class(ClassEntity::new(["class_a", "pkg/A"]).with_method(["method_1", "fromA"], "()V"))
        .with_class(ClassEntity::new(["class_b", "pkg/B"]))
        .with_class(ClassEntity::new(["class_i", "pkg/I"]).with_method(["method_1", "fromI"], "()V"))
        .with_class(ClassEntity::new(["class_j", "pkg/J"]).with_method(["method_2", "fromJ"], "()V"))
}

fn remapper_with(resolver: Arc<RecordingResolver>) -> NamespaceRemapper {
    tree()
        .remapper("intermediate", "named", resolver)
        .unwrap()
}

#[test]
fn test_walk_visits_closest_ancestor_first() {
    let resolver = Arc::new(RecordingResolver::new([
        ClassInfo::new("mod/C").extends("class_b"),
        ClassInfo::new("class_b").extends("class_a"),
        ClassInfo::new("class_a").extends("java/lang/Object"),
    ]));
    let remapper = remapper_with(resolver.clone());

    let name = remapper
        .resolve_method_name(Some("mod/C"), "method_1", Some("()V"))
        .unwrap();
    assert_eq!(name, "fromA");
    assert_eq!(resolver.visits(), ["mod/C", "class_b", "class_a"]);
}

#[test]
fn test_superclass_wins_over_interface() {
    let resolver = Arc::new(RecordingResolver::new([
        ClassInfo::new("mod/D").extends("class_a").implements(["class_i"]),
    ]));
    let remapper = remapper_with(resolver.clone());

    let name = remapper
        .resolve_method_name(Some("mod/D"), "method_1", Some("()V"))
        .unwrap();
    assert_eq!(name, "fromA");
}

#[test]
fn test_diamond_visits_shared_interface_once() {
    let resolver = Arc::new(RecordingResolver::new([
        ClassInfo::new("mod/D")
            .extends("java/lang/Object")
            .implements(["mod/Left", "mod/Right"]),
        ClassInfo::new("mod/Left").implements(["class_j"]),
        ClassInfo::new("mod/Right").implements(["class_j"]),
    ]));
    let remapper = remapper_with(resolver.clone());

    let name = remapper
        .resolve_method_name(Some("mod/D"), "method_2", Some("()V"))
        .unwrap();
    assert_eq!(name, "fromJ");
    assert_eq!(
        resolver.visits(),
        ["mod/D", "mod/Left", "mod/Right", "class_j"]
    );
}

#[test]
fn test_unresolved_walk_keeps_name() {
    let resolver = Arc::new(RecordingResolver::new([
        ClassInfo::new("mod/E").extends("mod/Missing"),
    ]));
    let remapper = remapper_with(resolver.clone());

    let name = remapper
        .resolve_method_name(Some("mod/E"), "method_9", Some("()V"))
        .unwrap();
    assert_eq!(name, "method_9");
    assert_eq!(resolver.visits(), ["mod/E", "mod/Missing"]);
}

#[test]
fn test_ambiguity_needs_an_owner() {
    let remapper = remapper_with(Arc::new(RecordingResolver::new([])));

    match remapper.resolve_method_name(None, "method_1", Some("()V")) {
        Err(PipelineError::UnresolvableReference { kind, name, .. }) => {
            assert_eq!(kind, MemberKind::Method);
            assert_eq!(name, "method_1");
        }
        other => panic!("unexpected result: {other:?}"),
    }
    assert_eq!(
        remapper
            .resolve_method_name(Some("class_i"), "method_1", Some("()V"))
            .unwrap(),
        "fromI"
    );
}

#[test]
fn test_inner_classes_follow_outer_mapping() {
    let tree = read_tiny_v2("tiny\t2\t0\tintermediate\tnamed\nc\tclass_1\tpkg/Outer\n").unwrap();
    let remapper = tree
        .remapper("intermediate", "named", Arc::new(ClasspathIndex::new()))
        .unwrap();

    assert_eq!(remapper.map_class_name("class_1$Inner"), "pkg/Outer$Inner");
    assert_eq!(remapper.map_class_name("class_1$1$2"), "pkg/Outer$1$2");
    assert_eq!(remapper.map_class_name("other$Inner"), "other$Inner");
}

fn identifier() -> impl Strategy<Value = String> {
    "[a-z][a-zA-Z0-9]{0,10}"
}

proptest! {
    /// Remapping a class to the named namespace and back restores every name.
    #[test]
    fn prop_forward_then_reverse_restores_names(
        class_names in proptest::collection::btree_set(identifier(), 1..5),
        method_names in proptest::collection::btree_set(identifier(), 1..6),
    ) {
        let classes: Vec<String> = class_names.into_iter().collect();
        let methods: Vec<String> = method_names.into_iter().collect();

        let mut tree = MappingTree::new(["intermediate", "named"]);
        for (i, class) in classes.iter().enumerate() {
            let mut entity = ClassEntity::new([format!("class_{i}"), format!("pkg/{class}")]);
            for (j, method) in methods.iter().enumerate() {
                entity = entity.with_method(
                    [format!("method_{i}_{j}"), format!("{method}{i}")],
                    &format!("(Lclass_{i};)V"),
                );
            }
            tree.add_class(entity);
        }

        let forward = tree
            .remapper("intermediate", "named", Arc::new(ClasspathIndex::new()))
            .unwrap();
        let reverse = tree
            .remapper("named", "intermediate", Arc::new(ClasspathIndex::new()))
            .unwrap();

        for i in 0..classes.len() {
            let mut builder = ClassFileBuilder::new(format!("class_{i}"));
            for j in 0..methods.len() {
                builder = builder.method(&format!("method_{i}_{j}"), &format!("(Lclass_{i};)V"));
            }
            let original = builder.build();

            let there = remap_class(&original, "in.class", &forward).unwrap();
            prop_assert_eq!(&there.name, &format!("pkg/{}", classes[i]));
            let back = remap_class(&there.bytes, "out.class", &reverse).unwrap();
            prop_assert_eq!(&back.name, &format!("class_{i}"));

            let before = ClassFile::parse(&original).unwrap();
            let after = ClassFile::parse(&back.bytes).unwrap();
            let names = |class: &ClassFile| -> Vec<(String, String)> {
                class
                    .methods
                    .iter()
                    .map(|m| {
                        (
                            class.pool.utf8(m.name_index).unwrap().to_string(),
                            class.pool.utf8(m.descriptor_index).unwrap().to_string(),
                        )
                    })
                    .collect()
            };
            prop_assert_eq!(names(&before), names(&after));
        }
    }

    /// Resolving the same reference twice gives the same answer.
    #[test]
    fn prop_resolution_is_deterministic(owner in identifier(), name in identifier()) {
        let resolver = Arc::new(RecordingResolver::new([
            ClassInfo::new(format!("mod/{owner}")).extends("class_b"),
            ClassInfo::new("class_b").extends("class_a"),
        ]));
        let remapper = remapper_with(resolver);
        let owner = format!("mod/{owner}");
        let first = remapper.resolve_method_name(Some(&owner), &name, Some("()V")).unwrap();
        let second = remapper.resolve_method_name(Some(&owner), &name, Some("()V")).unwrap();
        prop_assert_eq!(first, second);
    }
}

#[test]
fn test_walk_never_enters_skipped_prefixes() {
    let resolver = Arc::new(RecordingResolver::new([
        ClassInfo::new("mod/F").extends("java/util/AbstractList").implements(["class_i"]),
    ]));
    let remapper = remapper_with(resolver.clone());
    remapper
        .resolve_method_name(Some("mod/F"), "missing", Some("()V"))
        .unwrap();

    let visited: BTreeSet<String> = resolver.visits().into_iter().collect();
    assert!(visited.iter().all(|c| !c.starts_with("java/")));
    assert!(visited.contains("class_i"));
}
