//! Canonical record shapes stored in a repository package
//!
//! These are plain values: built once by export mapping or import decoding
//! and never linked back to the live repository. Field names serialize in
//! camelCase to match the package documents.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::manifest::PackageManifest;

/// Open string-keyed attribute bag with no compile-time schema
pub type AttributeMap = serde_json::Map<String, Value>;

/// Element id -> opaque position value (x/y/width/height or whatever the
/// diagram editor stored)
pub type ViewLayout = BTreeMap<String, Value>;

// =============================================================================
// model/
// =============================================================================

/// An architecture element (application component, node, capability, ...)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ElementRecord {
    /// Unique element id
    pub id: String,

    /// Element type name
    #[serde(rename = "type")]
    pub element_type: String,

    /// Display name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// All raw attributes carried over from the repository
    pub properties: AttributeMap,

    /// Owning design workspace, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace_id: Option<String>,

    /// ISO-8601 creation time
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,

    /// ISO-8601 last modification time
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

/// A typed, directed connection between two elements
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RelationshipRecord {
    /// Unique relationship id
    pub id: String,

    /// Id of the source element
    pub source_id: String,

    /// Id of the target element
    pub target_id: String,

    /// Relationship type name
    #[serde(rename = "type")]
    pub relationship_type: String,

    /// All raw attributes carried over from the repository
    pub properties: AttributeMap,
}

// =============================================================================
// views/
// =============================================================================

/// Which part of the repository a diagram draws from
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum DiagramScope {
    /// The diagram may show anything in the repository
    #[default]
    EntireRepository,

    /// The diagram shows an explicit element selection
    ManualSelection {
        /// Selected element ids
        #[serde(rename = "elementIds", default)]
        element_ids: Vec<String>,
    },
}

impl DiagramScope {
    /// Element ids pinned by the scope, if it is a manual selection
    pub fn selected_elements(&self) -> Option<&[String]> {
        match self {
            DiagramScope::ManualSelection { element_ids } => Some(element_ids),
            DiagramScope::EntireRepository => None,
        }
    }
}

/// A diagram (view) definition
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DiagramRecord {
    /// Unique diagram id
    pub id: String,

    /// Diagram title
    pub title: String,

    /// Viewpoint the diagram conforms to
    pub viewpoint_id: String,

    /// Free-text description
    pub description: String,

    /// Selection descriptor
    pub scope: DiagramScope,

    /// Elements drawn on the diagram
    pub referenced_element_ids: Vec<String>,

    /// Relationships drawn on the diagram
    pub visible_relationship_ids: Vec<String>,

    /// Opaque editor metadata (zoom, grid, ...)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layout_metadata: Option<Value>,

    /// ISO-8601 creation time
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,

    /// Author
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
}

/// Per-diagram, per-element positions
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LayoutsRecord {
    /// Diagram id -> element id -> position
    pub view_layouts: BTreeMap<String, ViewLayout>,
}

impl LayoutsRecord {
    /// Number of diagrams with a layout entry
    pub fn len(&self) -> usize {
        self.view_layouts.len()
    }

    /// True if no diagram has a layout entry
    pub fn is_empty(&self) -> bool {
        self.view_layouts.is_empty()
    }
}

// =============================================================================
// metadata/
// =============================================================================

/// Repository-level metadata
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WorkspaceRecord {
    /// Schema generation of the repository contents
    pub schema_version: String,

    /// Open repository metadata (name, owner, ...)
    pub repository_metadata: AttributeMap,

    /// Stable repository id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repository_id: Option<String>,

    /// ISO-8601 time of the last repository change
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,

    /// Opaque design workspace descriptors
    pub design_workspaces: Vec<Value>,

    /// Opaque baseline summaries
    pub baselines: Vec<Value>,
}

/// Element/relationship/diagram state captured by a baseline
///
/// A section that is `None` was absent from the snapshot.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BaselineSnapshot {
    /// Captured elements
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elements: Option<Vec<ElementRecord>>,

    /// Captured relationships
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relationships: Option<Vec<RelationshipRecord>>,

    /// Captured diagrams
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagrams: Option<Vec<DiagramRecord>>,

    /// Captured layouts
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layouts: Option<LayoutsRecord>,
}

/// A named, timestamped repository snapshot
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BaselineRecord {
    /// Unique baseline id
    pub id: String,

    /// Baseline name
    pub name: String,

    /// Free-text description
    pub description: String,

    /// ISO-8601 creation time
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,

    /// Author
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,

    /// Elements in the baseline
    pub element_count: u64,

    /// Relationships in the baseline
    pub relationship_count: u64,

    /// Diagrams in the baseline
    pub diagram_count: u64,

    /// Captured state
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<BaselineSnapshot>,
}

/// Record of past imports, passed through untouched
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImportHistory {
    /// Opaque history items, oldest first
    pub items: Vec<Value>,
}

/// Record of repository versions, passed through untouched
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionHistory {
    /// Opaque history items, oldest first
    pub items: Vec<Value>,
}

// =============================================================================
// Aggregate
// =============================================================================

/// Everything a package carries: the unit exchanged at the engine boundary
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageData {
    /// Header document
    pub manifest: PackageManifest,
    /// model/elements.json
    pub elements: Vec<ElementRecord>,
    /// model/relationships.json
    pub relationships: Vec<RelationshipRecord>,
    /// views/diagrams.json
    pub diagrams: Vec<DiagramRecord>,
    /// views/layouts.json
    pub layouts: LayoutsRecord,
    /// metadata/workspace.json
    pub workspace: WorkspaceRecord,
    /// metadata/import-history.json
    pub import_history: ImportHistory,
    /// metadata/version-history.json
    pub version_history: VersionHistory,
    /// metadata/baselines.json
    pub baselines: Vec<BaselineRecord>,
}
