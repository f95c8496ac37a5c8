//! End-to-end through the top-level crate.

use eapkg::{
    build_package, parse_package, verify_package, RepositoryPackageSource, SourceObject,
    SourceRelationship, SourceView,
};
use serde_json::json;

#[test]
fn export_then_import_through_facade() {
    let source = RepositoryPackageSource {
        objects: vec![
            SourceObject::new("app", "ApplicationComponent").with_attribute("name", "Billing"),
            SourceObject::new("db", "SystemSoftware").with_attribute("name", "Postgres"),
        ],
        relationships: vec![SourceRelationship::new("uses", "Serving", "db", "app")],
        views: vec![SourceView::new("v1").with_attribute("title", "Billing Context")],
        design_workspaces: vec![json!({"id": "ws", "name": "Q3"})],
        ..RepositoryPackageSource::default()
    };

    let exported = build_package(&source).unwrap();
    // v1 has no layout
    assert_eq!(exported.warnings.len(), 1, "{:?}", exported.warnings);

    let info = verify_package(&exported.bytes).unwrap();
    assert!(info.is_intact());

    let parsed = parse_package(&exported.bytes).unwrap();
    assert_eq!(parsed.data.elements.len(), 2);
    assert_eq!(parsed.data.diagrams[0].title, "Billing Context");
    assert_eq!(parsed.data.manifest.design_workspace_count, 1);
}
