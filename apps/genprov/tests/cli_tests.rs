//! End-to-end tests for the CLI commands, run against temporary files.

// Allow unwrap and panic in tests - these are standard for test code
#![allow(clippy::unwrap_used, clippy::panic)]

use clap::Parser;
use genprov::cli::{Cli, EventFormat, execute, fraction_summary, read_event, write_event};
use genprov_core::{
    AttributionResult, EventBuilder, FourMomentum, GenprovError, Node, NodeId, ObjectId,
    ObjectKind, OutputObject, RedbRecordStore, SerializableEvent,
};
use std::path::Path;

fn sample_event(malformed: bool) -> genprov_core::Event {
    let mut builder = EventBuilder::new(3);
    builder
        .add_node(Node::new(NodeId(1), FourMomentum::new(4.0, 0.0, 3.0, 5.0)))
        .unwrap();
    builder
        .add_node(Node::new(NodeId(2), FourMomentum::new(0.0, 2.0, 0.0, 2.0)).with_pileup(true))
        .unwrap();
    let children: &[u64] = if malformed { &[1, 2] } else { &[2] };
    builder
        .add_node(
            Node::new(NodeId(3), FourMomentum::ZERO)
                .with_children(children.iter().map(|&c| NodeId(c))),
        )
        .unwrap();
    builder
        .add_object(
            OutputObject::new(
                ObjectId(10),
                ObjectKind::ParticleFlowCandidate,
                FourMomentum::new(4.0, 2.0, 3.0, 7.0),
            )
            .with_constituents([NodeId(1), NodeId(3)]),
        )
        .unwrap();
    builder.build()
}

fn run(args: &[&str]) -> Result<(), GenprovError> {
    let mut argv = vec!["genprov"];
    argv.extend_from_slice(args);
    execute(Cli::try_parse_from(argv).unwrap())
}

fn path_str(path: &Path) -> &str {
    path.to_str().unwrap()
}

// =============================================================================
// FORMAT INFERENCE
// =============================================================================

#[test]
fn test_format_inferred_from_extension() {
    assert_eq!(EventFormat::infer(Path::new("a/event.json")), EventFormat::Json);
    assert_eq!(EventFormat::infer(Path::new("event.JSON")), EventFormat::Json);
    assert_eq!(EventFormat::infer(Path::new("event.bin")), EventFormat::Binary);
    assert_eq!(EventFormat::infer(Path::new("event")), EventFormat::Binary);
}

// =============================================================================
// EVENT I/O
// =============================================================================

#[test]
fn test_json_and_binary_files_hold_the_same_event() {
    let dir = tempfile::tempdir().unwrap();
    let json = dir.path().join("event.json");
    let bin = dir.path().join("event.bin");
    let event = sample_event(false);

    write_event(&event, &json).unwrap();
    write_event(&event, &bin).unwrap();

    let from_json = read_event(&json, None, false).unwrap();
    let from_bin = read_event(&bin, None, false).unwrap();
    assert_eq!(
        SerializableEvent::from(&from_json),
        SerializableEvent::from(&from_bin)
    );
}

#[test]
fn test_missing_input_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = read_event(&dir.path().join("absent.bin"), None, false);
    assert!(matches!(result, Err(GenprovError::IoError(_))));
}

#[test]
fn test_json_with_optional_fields_omitted() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("minimal.json");
    std::fs::write(
        &path,
        r#"{
            "id": 1,
            "nodes": [
                {"id": 1, "momentum": {"px": 1.0, "py": 0.0, "pz": 0.0, "e": 1.0}, "pt": 1.0}
            ],
            "objects": [
                {"id": 5, "kind": "jet", "momentum": {"px": 1.0, "py": 0.0, "pz": 0.0, "e": 1.0},
                 "constituents": [1]}
            ]
        }"#,
    )
    .unwrap();

    let event = read_event(&path, None, true).unwrap();
    assert_eq!(event.objects()[0].kind, ObjectKind::Jet);
    assert!(!event.graph().nodes().next().unwrap().is_pileup);
}

#[test]
fn test_fraction_summary_uses_both_computed_fractions() {
    let attribution = AttributionResult {
        primary: FourMomentum::new(0.0, 0.0, 0.0, 1.0),
        secondary: FourMomentum::new(0.0, 0.0, 0.0, 2.0),
        primary_count: 1,
        secondary_count: 1,
    };
    let expected = format!(
        "hard fraction {:.4}, pileup fraction {:.4}",
        attribution.primary_fraction().value().unwrap(),
        attribution.secondary_fraction().value().unwrap()
    );
    assert_eq!(fraction_summary(&attribution), expected);
    assert_eq!(expected, "hard fraction 0.3333, pileup fraction 0.6667");

    assert_eq!(
        fraction_summary(&AttributionResult::default()),
        "fractions undefined (zero total energy)"
    );
}

// =============================================================================
// COMMANDS
// =============================================================================

#[test]
fn test_process_into_redb() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("event.bin");
    let db = dir.path().join("records.redb");
    write_event(&sample_event(false), &input).unwrap();

    run(&["process", "-i", path_str(&input), "-o", path_str(&db)]).unwrap();

    let store = RedbRecordStore::open(&db).unwrap();
    let record = store.get(3, ObjectId(10)).unwrap().unwrap();
    assert_eq!(record.particles, vec![NodeId(1), NodeId(2)]);
    let analysis = record.analysis.unwrap();
    let hard = analysis.hard_fraction.value().unwrap();
    assert!((hard - 5.0 / 7.0).abs() < 1e-12);
}

#[test]
fn test_inspect_unknown_object_fails() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("event.json");
    write_event(&sample_event(false), &input).unwrap();

    run(&["inspect", "-i", path_str(&input), "--object", "10"]).unwrap();
    let result = run(&["inspect", "-i", path_str(&input), "--object", "11"]);
    assert!(matches!(result, Err(GenprovError::UnknownObject(ObjectId(11)))));
}

#[test]
fn test_validate_fails_only_when_strict() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("event.bin");
    write_event(&sample_event(true), &input).unwrap();

    run(&["validate", "-i", path_str(&input)]).unwrap();
    let result = run(&["--strict", "validate", "-i", path_str(&input)]);
    assert!(matches!(result, Err(GenprovError::MalformedHierarchy(_))));
}

#[test]
fn test_strict_config_rejects_malformed_process_input() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("event.bin");
    let config = dir.path().join("genprov.toml");
    write_event(&sample_event(true), &input).unwrap();
    std::fs::write(&config, "[hierarchy]\nstrict = true\n").unwrap();

    let result = run(&["-c", path_str(&config), "process", "-i", path_str(&input)]);
    assert!(matches!(result, Err(GenprovError::MalformedHierarchy(_))));
}

#[test]
fn test_convert_json_to_binary() {
    let dir = tempfile::tempdir().unwrap();
    let json = dir.path().join("event.json");
    let bin = dir.path().join("event.bin");
    write_event(&sample_event(false), &json).unwrap();

    run(&["convert", "-i", path_str(&json), "-o", path_str(&bin)]).unwrap();

    let bytes = std::fs::read(&bin).unwrap();
    assert_eq!(&bytes[0..4], b"GPRV");
    let event = genprov_core::event_from_bytes(&bytes).unwrap();
    assert_eq!(event.id(), 3);
}
