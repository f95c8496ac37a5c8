//! Shared test utilities for the package integration suites.
//!
//! Import via `mod common;` from any test file.

#![allow(dead_code)]

use std::sync::Once;

use eapkg_core::{
    RepositoryPackageSource, SourceMetadata, SourceObject, SourceRelationship, SourceView,
    ViewLayout,
};
use eapkg_package::archive::{pack, ArchiveEntries};
use eapkg_package::{paths, ExtractStrategy, PackageConfig, PackageExporter, StreamingExtractor};
use serde_json::{json, Value};

// ============================================================================
// Initialization
// ============================================================================

static INIT_TRACING: Once = Once::new();

/// Route tracing output through the test harness.
pub fn init_tracing() {
    INIT_TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    });
}

// ============================================================================
// Sources
// ============================================================================

/// A small but complete repository: three elements, two relationships,
/// one diagram with a layout, one design workspace, one baseline.
pub fn sample_source() -> RepositoryPackageSource {
    RepositoryPackageSource {
        objects: vec![
            SourceObject::new("a", "ApplicationComponent")
                .with_attribute("name", "CRM")
                .with_attribute("createdAt", "2024-01-10T09:00:00Z"),
            SourceObject::new("b", "Node")
                .with_attribute("label", "App Server")
                .in_workspace("ws-1"),
            SourceObject::new("c", "DataObject").with_attribute("title", "Customer"),
        ],
        relationships: vec![
            SourceRelationship::new("r1", "Serving", "b", "a"),
            SourceRelationship::new("r2", "Access", "a", "c").with_attribute("mode", "write"),
        ],
        view_layouts: [("d1".to_string(), layout(&["a", "b"]))]
            .into_iter()
            .collect(),
        views: vec![SourceView::new("d1")
            .with_attribute("title", "Application Landscape")
            .with_attribute("viewpointId", "application-cooperation")
            .with_attribute(
                "scope",
                json!({"kind": "ManualSelection", "elementIds": ["a", "b"]}),
            )
            .with_attribute("visibleRelationshipIds", json!(["r1"]))],
        metadata: SourceMetadata {
            repository_id: Some("repo-42".to_string()),
            updated_at: Some("2024-05-01T12:00:00Z".to_string()),
            ..SourceMetadata::default()
        },
        design_workspaces: vec![json!({"id": "ws-1", "name": "Migration"})],
        baselines: vec![json!({
            "id": "bl-1",
            "name": "Before migration",
            "createdBy": "architect",
            "snapshot": {
                "elements": [{"id": "a", "type": "ApplicationComponent"}],
                "relationships": [],
                "diagrams": []
            }
        })],
        import_history: vec![json!({"source": "applications.csv", "rows": 3})],
        version_history: vec![json!({"version": 1, "note": "initial"})],
    }
}

/// Positions for the given element ids.
pub fn layout(elements: &[&str]) -> ViewLayout {
    elements
        .iter()
        .enumerate()
        .map(|(i, id)| (id.to_string(), json!({"x": 40 * i, "y": 40, "w": 120, "h": 60})))
        .collect()
}

/// Build a package with the fast test configuration.
pub fn build(source: &RepositoryPackageSource) -> Vec<u8> {
    PackageExporter::new(&PackageConfig::for_testing())
        .build(source)
        .unwrap()
        .bytes
}

// ============================================================================
// Archive tampering
// ============================================================================

/// Extract every entry of a package.
pub fn unpack(bytes: &[u8]) -> ArchiveEntries {
    StreamingExtractor.extract(bytes).unwrap()
}

/// Re-pack entries, manifest first.
pub fn repack(entries: &ArchiveEntries) -> Vec<u8> {
    let mut ordered: Vec<(&str, &[u8])> = Vec::new();
    if let Some(manifest) = entries.get(paths::MANIFEST) {
        ordered.push((paths::MANIFEST, manifest.as_slice()));
    }
    for (path, bytes) in entries {
        if path != paths::MANIFEST {
            ordered.push((path.as_str(), bytes.as_slice()));
        }
    }
    pack(&ordered, 1).unwrap()
}

/// Rewrite one JSON entry of a package.
pub fn edit_json(bytes: &[u8], path: &str, edit: impl FnOnce(&mut Value)) -> Vec<u8> {
    let mut entries = unpack(bytes);
    let mut value: Value = serde_json::from_slice(&entries[path]).unwrap();
    edit(&mut value);
    entries.insert(path.to_string(), serde_json::to_vec(&value).unwrap());
    repack(&entries)
}

/// Replace one entry's raw bytes.
pub fn replace_entry(bytes: &[u8], path: &str, data: &[u8]) -> Vec<u8> {
    let mut entries = unpack(bytes);
    entries.insert(path.to_string(), data.to_vec());
    repack(&entries)
}

/// Drop one entry.
pub fn remove_entry(bytes: &[u8], path: &str) -> Vec<u8> {
    let mut entries = unpack(bytes);
    entries.remove(path);
    repack(&entries)
}
