mod common;

use common::PipelineFixture;
use jarloom::bytecode::flags::ACC_PUBLIC;
use jarloom::bytecode::ClassFile;
use jarloom::jar::{Jar, MANIFEST_PATH};
use jarloom::pipeline::{StaleReason, StageKind, Variant};
use jarloom::testkit::FailingPatcher;
use jarloom::{FingerprintMode, PipelineError};
use pretty_assertions::assert_eq;
use std::fs;
use std::sync::Arc;

#[test]
fn test_first_run_executes_everything_second_run_nothing() {
    let fixture = PipelineFixture::new();
    let orchestrator = fixture.orchestrator();

    let first = orchestrator.run().unwrap();
    assert_eq!(first.executed_count(), 9);

    let second = orchestrator.run().unwrap();
    assert_eq!(second.executed_count(), 0);
    assert_eq!(second.reused_count(), 9);

    for path in orchestrator.layout().all_artifacts() {
        assert!(path.exists(), "{} should exist", path.display());
    }
}

#[test]
fn test_refresh_reproduces_identical_bytes() {
    let fixture = PipelineFixture::new();
    let report = fixture.orchestrator().run().unwrap();
    let merged = report.merged_output().unwrap().to_path_buf();
    let before = fs::read(&merged).unwrap();

    let refreshed = fixture.orchestrator().with_force_refresh(true).run().unwrap();
    assert_eq!(refreshed.executed_count(), 9);
    assert_eq!(fs::read(&merged).unwrap(), before);
}

#[test]
fn test_artifact_names_follow_layout() {
    let fixture = PipelineFixture::new();
    let report = fixture.orchestrator().run().unwrap();
    let merged = report.merged_output().unwrap();
    assert_eq!(
        merged.file_name().unwrap().to_string_lossy(),
        "minecraft-1.0-merged-remapped-7.jar"
    );
    assert!(fixture
        .dir
        .path()
        .join("cache/minecraft-1.0-client-patched-7.jar")
        .exists());
}

#[test]
fn test_override_change_reruns_only_transform_and_later() {
    let fixture = PipelineFixture::new();
    fixture.orchestrator().run().unwrap();

    fixture.write_override("public class_3 field_1\n");
    let report = fixture.orchestrator().run().unwrap();

    for variant in Variant::SIDES {
        assert!(!report.was_executed(StageKind::Patch, variant));
        assert!(!report.was_executed(StageKind::InjectClasses, variant));
        assert!(report.was_executed(StageKind::AccessTransform, variant));
        assert!(report.was_executed(StageKind::Remap, variant));
    }
    assert!(report.was_executed(StageKind::Merge, Variant::Merged));
    assert_eq!(report.executed_count(), 5);

    let merged = Jar::open(report.merged_output().unwrap()).unwrap();
    let extra = ClassFile::parse(merged.get("pkg/Extra.class").unwrap()).unwrap();
    assert_eq!(extra.fields[0].access_flags, ACC_PUBLIC);

    let again = fixture.orchestrator().run().unwrap();
    assert_eq!(again.executed_count(), 0);
}

#[test]
fn test_patch_change_reruns_one_side() {
    let fixture = PipelineFixture::new();
    fixture.orchestrator().run().unwrap();

    fixture.change_patches(&fixture.client_patches(), "otherPatch");
    let report = fixture.orchestrator().run().unwrap();

    for kind in StageKind::CHAIN {
        assert!(report.was_executed(kind, Variant::Client), "{kind} client");
        assert!(!report.was_executed(kind, Variant::Server), "{kind} server");
    }
    assert!(report.was_executed(StageKind::Merge, Variant::Merged));
}

#[test]
fn test_status_does_not_consume_drift() {
    let fixture = PipelineFixture::new();
    let orchestrator = fixture.orchestrator();
    orchestrator.run().unwrap();

    fixture.write_override("public class_2\n");
    let orchestrator = fixture.orchestrator();
    for _ in 0..2 {
        let plan = orchestrator.plan(FingerprintMode::ReadOnly).unwrap();
        assert_eq!(
            plan.get(StageKind::AccessTransform, Variant::Client).unwrap().stale,
            Some(StaleReason::FingerprintDrift { source: "at".into() })
        );
        assert_eq!(plan.stale_count(), 5);
    }

    assert_eq!(orchestrator.run().unwrap().executed_count(), 5);
    assert!(orchestrator
        .plan(FingerprintMode::ReadOnly)
        .unwrap()
        .is_up_to_date());
}

#[test]
fn test_merged_jar_contents() {
    let fixture = PipelineFixture::new();
    let report = fixture.orchestrator().run().unwrap();
    let merged = Jar::open(report.merged_output().unwrap()).unwrap();

    // remapped classes, including the one the patch set left out
    assert!(merged.contains("pkg/Widget.class"));
    assert!(merged.contains("pkg/Base.class"));
    assert!(merged.contains("pkg/Extra.class"));
    assert!(!merged.contains("class_1.class"));

    // injected content
    assert!(merged.contains("mod/Companion.class"));
    assert!(merged.contains("mod/Helper.class"));
    assert_eq!(merged.get(MANIFEST_PATH), None);

    // client wins, server-only resources are added
    assert_eq!(merged.get("shared.txt"), Some(&b"client"[..]));
    assert_eq!(merged.get("assets/client.txt"), Some(&b"client only"[..]));
    assert_eq!(merged.get("server.properties"), Some(&b"motd=hello"[..]));

    let widget = ClassFile::parse(merged.get("pkg/Widget.class").unwrap()).unwrap();
    assert_eq!(widget.super_name().unwrap(), Some("pkg/Base"));
    let methods: Vec<&str> = widget
        .methods
        .iter()
        .map(|m| widget.pool.utf8(m.name_index).unwrap())
        .collect();
    assert_eq!(methods, ["spin", "clientPatch"]);

    let companion = ClassFile::parse(merged.get("mod/Companion.class").unwrap()).unwrap();
    assert_eq!(companion.super_name().unwrap(), Some("pkg/Widget"));
}

#[test]
fn test_tool_failure_leaves_no_partial_output() {
    let fixture = PipelineFixture::new();
    let toolset = PipelineFixture::toolset_with(Arc::new(FailingPatcher));
    let orchestrator = fixture.orchestrator_with(&toolset);

    let err = orchestrator.run().unwrap_err();
    match err.root() {
        PipelineError::ExternalToolFailure {
            tool, stage, status, ..
        } => {
            assert_eq!(tool, "failing");
            assert_eq!(*stage, StageKind::Patch);
            assert_eq!(*status, Some(1));
        }
        other => panic!("unexpected error: {other:?}"),
    }

    for path in orchestrator.layout().all_artifacts() {
        assert!(!path.exists(), "{} should not exist", path.display());
    }
}

#[test]
fn test_missing_input_names_stage_and_path() {
    let mut fixture = PipelineFixture::new();
    fixture.orchestrator().run().unwrap();

    let client_jar = fixture.config.inputs.client_jar.clone().unwrap();
    fs::remove_file(&client_jar).unwrap();
    fixture.config.pipeline.force_refresh = true;

    match fixture.orchestrator().run().unwrap_err() {
        PipelineError::MissingUpstreamArtifact {
            stage,
            variant,
            path,
        } => {
            assert_eq!(stage, StageKind::Patch);
            assert_eq!(variant, Variant::Client);
            assert_eq!(path, client_jar);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_deleted_artifact_is_rebuilt_with_downstream() {
    let fixture = PipelineFixture::new();
    let orchestrator = fixture.orchestrator();
    orchestrator.run().unwrap();

    let injected = orchestrator
        .layout()
        .artifact_path(Variant::Server, StageKind::InjectClasses);
    fs::remove_file(&injected).unwrap();

    let report = orchestrator.run().unwrap();
    assert!(!report.was_executed(StageKind::Patch, Variant::Server));
    assert!(report.was_executed(StageKind::InjectClasses, Variant::Server));
    assert!(report.was_executed(StageKind::Remap, Variant::Server));
    assert!(!report.was_executed(StageKind::InjectClasses, Variant::Client));
    assert!(report.was_executed(StageKind::Merge, Variant::Merged));
}

#[test]
fn test_clean_forces_full_rebuild() {
    let fixture = PipelineFixture::new();
    let orchestrator = fixture.orchestrator();
    orchestrator.run().unwrap();

    // nine artifacts plus the two patch fingerprints and the access one
    assert_eq!(orchestrator.clean().unwrap(), 12);
    assert_eq!(orchestrator.clean().unwrap(), 0);
    assert_eq!(orchestrator.run().unwrap().executed_count(), 9);
}
