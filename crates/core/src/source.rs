//! Export input supplied by the live repository
//!
//! The repository hands over loosely-typed attribute bags; export mapping
//! turns them into the canonical records in [`crate::records`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::records::{AttributeMap, ViewLayout};

/// An element as the live repository holds it
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SourceObject {
    /// Element id
    pub id: String,
    /// Element type name
    #[serde(rename = "type")]
    pub object_type: String,
    /// Owning design workspace
    pub workspace_id: Option<String>,
    /// Raw attributes
    pub attributes: AttributeMap,
}

impl SourceObject {
    /// Create an object with no attributes
    pub fn new(id: impl Into<String>, object_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            object_type: object_type.into(),
            ..Self::default()
        }
    }

    /// Add an attribute (builder pattern)
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Set the owning workspace (builder pattern)
    pub fn in_workspace(mut self, workspace_id: impl Into<String>) -> Self {
        self.workspace_id = Some(workspace_id.into());
        self
    }
}

/// A relationship as the live repository holds it
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SourceRelationship {
    /// Relationship id; a fresh one is generated when absent or blank
    pub id: Option<String>,
    /// Relationship type name
    #[serde(rename = "type")]
    pub relationship_type: String,
    /// Source element id
    pub source_id: String,
    /// Target element id
    pub target_id: String,
    /// Raw attributes
    pub attributes: AttributeMap,
}

impl SourceRelationship {
    /// Create a relationship with no attributes
    pub fn new(
        id: impl Into<String>,
        relationship_type: impl Into<String>,
        source_id: impl Into<String>,
        target_id: impl Into<String>,
    ) -> Self {
        Self {
            id: Some(id.into()),
            relationship_type: relationship_type.into(),
            source_id: source_id.into(),
            target_id: target_id.into(),
            attributes: AttributeMap::new(),
        }
    }

    /// Add an attribute (builder pattern)
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}

/// A view (diagram) as the live repository holds it
///
/// Everything except the id lives in the attribute bag: title, viewpoint,
/// scope, referenced elements, visible relationships, layout metadata.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SourceView {
    /// Diagram id
    pub id: String,
    /// Raw attributes
    pub attributes: AttributeMap,
}

impl SourceView {
    /// Create a view with no attributes
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            attributes: AttributeMap::new(),
        }
    }

    /// Add an attribute (builder pattern)
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}

/// Repository-level metadata
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SourceMetadata {
    /// Schema generation of the repository; the tool's current one when absent
    pub schema_version: Option<String>,
    /// Stable repository id
    pub repository_id: Option<String>,
    /// ISO-8601 time of the last repository change
    pub updated_at: Option<String>,
    /// Open repository metadata
    pub attributes: AttributeMap,
}

/// Everything export needs from the live repository
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RepositoryPackageSource {
    /// Elements
    pub objects: Vec<SourceObject>,
    /// Relationships
    pub relationships: Vec<SourceRelationship>,
    /// Diagrams
    pub views: Vec<SourceView>,
    /// Diagram id -> element id -> position
    pub view_layouts: BTreeMap<String, ViewLayout>,
    /// Repository metadata
    pub metadata: SourceMetadata,
    /// Opaque design workspace descriptors
    pub design_workspaces: Vec<Value>,
    /// Raw baselines (id, name, counts, optional snapshot)
    pub baselines: Vec<Value>,
    /// Opaque import history
    pub import_history: Vec<Value>,
    /// Opaque version history
    pub version_history: Vec<Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builders() {
        let object = SourceObject::new("e1", "Node")
            .with_attribute("name", "Server")
            .in_workspace("ws-1");
        assert_eq!(object.attributes["name"], "Server");
        assert_eq!(object.workspace_id.as_deref(), Some("ws-1"));

        let rel = SourceRelationship::new("r1", "Serves", "e1", "e2").with_attribute("weight", 3);
        assert_eq!(rel.id.as_deref(), Some("r1"));
        assert_eq!(rel.attributes["weight"], 3);

        let view = SourceView::new("d1").with_attribute("title", "Landscape");
        assert_eq!(view.attributes["title"], "Landscape");
    }

    #[test]
    fn test_source_from_json() {
        let source: RepositoryPackageSource = serde_json::from_value(json!({
            "objects": [{"id": "e1", "type": "Node", "attributes": {"name": "A"}}],
            "relationships": [{"type": "Flow", "sourceId": "e1", "targetId": "e1"}],
            "viewLayouts": {"d1": {"e1": {"x": 1}}}
        }))
        .unwrap();
        assert_eq!(source.objects.len(), 1);
        assert_eq!(source.relationships[0].id, None);
        assert_eq!(source.view_layouts["d1"]["e1"]["x"], 1);
        assert!(source.views.is_empty());
    }
}
