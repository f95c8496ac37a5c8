//! Import gates: container, versions, structure, integrity and counts.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};

use common::*;
use eapkg_core::{SourceRelationship, SourceView};
use eapkg_package::archive::ArchiveEntries;
use eapkg_package::{
    build_package, parse_package, paths, CentralDirectoryExtractor, ErrorCategory,
    ExtractStrategy, PackageError, PackageImporter, PackageResult, WithFallback,
};
use serde_json::{json, Value};

// ============================================================================
// Container
// ============================================================================

#[test]
fn rejects_buffers_without_zip_magic() {
    let bytes = build(&sample_source());

    for bad in [
        b"not a package".to_vec(),
        vec![0x50, 0x4B, 0x05, 0x06, 0, 0],
        [&[0x00][..], &bytes[1..]].concat(),
    ] {
        let err = parse_package(&bad).unwrap_err();
        assert!(matches!(err, PackageError::BadMagic { .. }), "{err}");
        assert_eq!(err.category(), ErrorCategory::Container);
    }

    assert!(matches!(parse_package(&[]), Err(PackageError::EmptyInput)));
}

#[test]
fn truncated_archive_fails_both_strategies() {
    let bytes = build(&sample_source());
    let truncated = &bytes[..40];

    let err = parse_package(truncated).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Container);
}

struct AlwaysFails<'a>(&'a AtomicUsize);

impl ExtractStrategy for AlwaysFails<'_> {
    fn name(&self) -> &'static str {
        "always-fails"
    }

    fn extract(&self, _bytes: &[u8]) -> PackageResult<ArchiveEntries> {
        self.0.fetch_add(1, Ordering::SeqCst);
        Err(PackageError::archive("primary unavailable"))
    }
}

#[test]
fn falls_back_to_central_directory() {
    init_tracing();
    let calls = AtomicUsize::new(0);
    let importer = PackageImporter::with_extractor(WithFallback::new(
        AlwaysFails(&calls),
        CentralDirectoryExtractor,
    ));

    let parsed = importer.parse(&build(&sample_source())).unwrap();
    assert_eq!(parsed.data.elements.len(), 3);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

// ============================================================================
// Required files
// ============================================================================

#[test]
fn missing_required_file_lists_found_entries() {
    let bytes = remove_entry(&build(&sample_source()), paths::LAYOUTS);

    let err = parse_package(&bytes).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Structural);
    let msg = err.to_string();
    assert!(msg.contains(paths::LAYOUTS));
    assert!(msg.contains(paths::MANIFEST));
    assert!(msg.contains(paths::ELEMENTS));
}

#[test]
fn missing_optional_file_only_warns() {
    init_tracing();
    let bytes = remove_entry(&build(&sample_source()), paths::IMPORT_HISTORY);

    let parsed = parse_package(&bytes).unwrap();
    assert!(parsed.data.import_history.items.is_empty());
    assert!(parsed
        .warnings
        .iter()
        .any(|w| w.contains(paths::IMPORT_HISTORY)));
}

#[test]
fn unreadable_optional_file_falls_back() {
    init_tracing();
    let bytes = replace_entry(&build(&sample_source()), paths::VERSION_HISTORY, b"{oops");

    let parsed = parse_package(&bytes).unwrap();
    assert!(parsed.data.version_history.items.is_empty());
    assert!(parsed.warnings.iter().any(|w| w.contains("Checksum mismatch")));
}

// ============================================================================
// Versions
// ============================================================================

#[test]
fn unsupported_export_version_fails() {
    let bytes = edit_json(&build(&sample_source()), paths::MANIFEST, |m| {
        m["exportVersion"] = json!(2);
    });

    let err = parse_package(&bytes).unwrap_err();
    assert!(matches!(
        err,
        PackageError::UnsupportedExportVersion {
            found: 2,
            supported: 1
        }
    ));
    assert_eq!(err.category(), ErrorCategory::Version);
}

#[test]
fn export_version_checked_before_manifest_fields() {
    let bytes = edit_json(&build(&sample_source()), paths::MANIFEST, |m| {
        m["exportVersion"] = json!(2);
        m.as_object_mut().unwrap().remove("layoutCount");
    });

    let err = parse_package(&bytes).unwrap_err();
    assert!(matches!(
        err,
        PackageError::UnsupportedExportVersion {
            found: 2,
            supported: 1
        }
    ));
    assert_eq!(err.category(), ErrorCategory::Version);
}

#[test]
fn newer_schema_fails() {
    let bytes = edit_json(&build(&sample_source()), paths::MANIFEST, |m| {
        m["schemaVersion"] = json!("3");
    });

    let err = parse_package(&bytes).unwrap_err();
    assert!(matches!(err, PackageError::SchemaTooNew { .. }));
    assert!(err.to_string().contains("newer"));
}

#[test]
fn older_schema_warns() {
    init_tracing();
    let bytes = edit_json(&build(&sample_source()), paths::MANIFEST, |m| {
        m["schemaVersion"] = json!("1.0");
    });

    let parsed = parse_package(&bytes).unwrap();
    assert_eq!(parsed.warnings.len(), 1);
    assert!(parsed.warnings[0].contains("older"));
}

// ============================================================================
// Checksum
// ============================================================================

#[test]
fn checksum_mismatch_only_warns() {
    init_tracing();
    let bytes = edit_json(&build(&sample_source()), paths::ELEMENTS, |elements| {
        elements[0]["name"] = json!("Renamed CRM");
    });

    let parsed = parse_package(&bytes).unwrap();
    assert_eq!(parsed.data.elements[0].name.as_deref(), Some("Renamed CRM"));
    assert_eq!(parsed.warnings.len(), 1);
    assert!(parsed.warnings[0].contains("Checksum mismatch"));
}

#[test]
fn empty_checksum_is_unverifiable_not_fatal() {
    let bytes = edit_json(&build(&sample_source()), paths::MANIFEST, |m| {
        m["checksum"] = json!("");
    });

    let parsed = parse_package(&bytes).unwrap();
    assert!(parsed.warnings.iter().any(|w| w.contains("no checksum")));
}

// ============================================================================
// Structure
// ============================================================================

#[test]
fn malformed_elements_fail() {
    let bytes = replace_entry(&build(&sample_source()), paths::ELEMENTS, b"[{\"id\": ");

    let err = parse_package(&bytes).unwrap_err();
    assert!(matches!(err, PackageError::MalformedDocument { .. }));
    assert_eq!(err.category(), ErrorCategory::Structural);
}

#[test]
fn mistyped_record_fields_do_not_fail_import() {
    init_tracing();
    let bytes = edit_json(&build(&sample_source()), paths::ELEMENTS, |elements| {
        elements[0]["createdAt"] = json!(1700000000);
    });
    let bytes = edit_json(&bytes, paths::RELATIONSHIPS, |rels| {
        rels[0]["properties"] = Value::Null;
    });

    let parsed = parse_package(&bytes).unwrap();
    assert_eq!(parsed.data.elements[0].created_at.as_deref(), Some("1700000000"));
    assert!(parsed.data.relationships[0].properties.is_empty());
    assert!(parsed.warnings.iter().any(|w| w.contains("Checksum mismatch")));
}

#[test]
fn unreadable_baselines_reported_with_decode_error() {
    init_tracing();
    let bytes = edit_json(&build(&sample_source()), paths::BASELINES, |baselines| {
        baselines[0]["elementCount"] = json!(-1);
    });

    let err = parse_package(&bytes).unwrap_err();
    assert!(matches!(
        err,
        PackageError::UnreadableCountedDocument {
            field: "baselineCount",
            expected: 1,
            ..
        }
    ));
    let msg = err.to_string();
    assert!(msg.contains(paths::BASELINES), "{msg}");
    assert!(msg.contains("-1"), "{msg}");
}

#[test]
fn relationships_must_be_array() {
    let bytes = edit_json(&build(&sample_source()), paths::RELATIONSHIPS, |rels| {
        *rels = json!({"r1": {}});
    });

    let err = parse_package(&bytes).unwrap_err();
    assert!(matches!(err, PackageError::NotAnArray { .. }));
}

#[test]
fn unreadable_layouts_are_tolerated() {
    init_tracing();
    let mut source = sample_source();
    source.view_layouts.clear();
    let bytes = replace_entry(&build(&source), paths::LAYOUTS, b"<layouts/>");

    let parsed = parse_package(&bytes).unwrap();
    assert!(parsed.data.layouts.is_empty());
}

// ============================================================================
// Referential integrity
// ============================================================================

fn dangling_source() -> eapkg_core::RepositoryPackageSource {
    let mut source = sample_source();
    source.relationships = vec![SourceRelationship::new("r1", "Flow", "a", "zz-missing")];
    source.views[0] = SourceView::new("d1").with_attribute("title", "Flows");
    source
}

#[test]
fn dangling_reference_warns_on_export_and_fails_on_import() {
    init_tracing();
    let exported = build_package(&dangling_source()).unwrap();
    assert!(exported.warnings.iter().any(|w| w.contains("zz-missing")));

    let err = parse_package(&exported.bytes).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Integrity);
    assert!(err.to_string().contains("zz-missing"));
}

#[test]
fn duplicate_element_ids_fail() {
    let bytes = edit_json(&build(&sample_source()), paths::ELEMENTS, |elements| {
        elements[2]["id"] = json!("a");
    });

    let err = parse_package(&bytes).unwrap_err();
    assert!(err.to_string().contains("Duplicate element id 'a'"));
}

#[test]
fn missing_relationship_endpoint_fails() {
    let bytes = edit_json(&build(&sample_source()), paths::RELATIONSHIPS, |rels| {
        rels[0].as_object_mut().unwrap().remove("sourceId");
    });

    let err = parse_package(&bytes).unwrap_err();
    assert!(err.to_string().contains("sourceId"));
}

#[test]
fn layout_for_unknown_diagram_fails() {
    let bytes = edit_json(&build(&sample_source()), paths::LAYOUTS, |layouts| {
        layouts["viewLayouts"]["d-ghost"] = json!({});
    });

    let err = parse_package(&bytes).unwrap_err();
    assert!(err.to_string().contains("d-ghost"));
}

#[test]
fn baseline_snapshot_errors_name_the_baseline() {
    init_tracing();
    let mut source = sample_source();
    source.baselines = vec![json!({
        "id": "bl-broken",
        "name": "Broken",
        "snapshot": {
            "elements": [{"id": "a", "type": "Node"}],
            "relationships": [{"id": "r1", "sourceId": "a", "targetId": "ghost", "type": "Flow"}],
            "diagrams": []
        }
    })];

    let exported = build_package(&source).unwrap();
    assert!(exported
        .warnings
        .iter()
        .any(|w| w.starts_with("Baseline 'bl-broken'")));

    let err = parse_package(&exported.bytes).unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("Baseline 'bl-broken'"));
    assert!(msg.contains("ghost"));
}

// ============================================================================
// Manifest counts
// ============================================================================

#[test]
fn element_count_tamper_names_both_numbers() {
    let bytes = edit_json(&build(&sample_source()), paths::MANIFEST, |m| {
        m["elementCount"] = json!(17);
    });

    let err = parse_package(&bytes).unwrap_err();
    assert!(matches!(
        err,
        PackageError::CountMismatch {
            field: "elementCount",
            expected: 17,
            actual: 3
        }
    ));
    let msg = err.to_string();
    assert!(msg.contains("17"));
    assert!(msg.contains('3'));
}

#[test]
fn design_workspace_count_checked() {
    let bytes = edit_json(&build(&sample_source()), paths::MANIFEST, |m| {
        m["designWorkspaceCount"] = json!(0);
    });

    let err = parse_package(&bytes).unwrap_err();
    assert!(matches!(
        err,
        PackageError::CountMismatch {
            field: "designWorkspaceCount",
            ..
        }
    ));
}
