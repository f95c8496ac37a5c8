//! Source to record mapping
//!
//! Turns the live repository's loosely-typed attribute bags into the
//! canonical records stored in a package. Attribute aliases are resolved
//! through the chains in [`eapkg_core::attributes`].

use eapkg_core::attributes::{
    CREATED_AT, CREATED_BY, DESCRIPTION, DIAGRAM_TITLE, ELEMENT_NAME, UPDATED_AT, VIEWPOINT_ID,
};
use eapkg_core::{
    id_list, text_of, AttributeMap, BaselineRecord, BaselineSnapshot, DiagramRecord, DiagramScope,
    ElementRecord, ImportHistory, LayoutsRecord, PackageData, RelationshipRecord,
    RepositoryPackageSource, SourceObject, SourceRelationship, SourceView, VersionHistory,
    WorkspaceRecord,
};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::types::SCHEMA_VERSION;

/// Mapped documents plus notes about source data that had to be adjusted
#[derive(Debug, Clone, Default)]
pub struct MappedSource {
    /// Package documents; the manifest is left at its default
    pub data: PackageData,
    /// Human-readable notes, reported as export warnings
    pub notes: Vec<String>,
}

/// Map a repository source into package documents
pub fn map_source(source: &RepositoryPackageSource) -> MappedSource {
    let mut notes = Vec::new();

    let elements = source.objects.iter().map(map_element).collect();
    let relationships = source
        .relationships
        .iter()
        .map(|rel| map_relationship(rel, &mut notes))
        .collect();
    let diagrams = source.views.iter().map(map_diagram).collect();
    let layouts = LayoutsRecord {
        view_layouts: source.view_layouts.clone(),
    };

    let baselines: Vec<BaselineRecord> = source
        .baselines
        .iter()
        .enumerate()
        .filter_map(|(index, raw)| map_baseline(index, raw, &mut notes))
        .collect();

    let workspace = map_workspace(source, &baselines);

    MappedSource {
        data: PackageData {
            elements,
            relationships,
            diagrams,
            layouts,
            workspace,
            import_history: ImportHistory {
                items: source.import_history.clone(),
            },
            version_history: VersionHistory {
                items: source.version_history.clone(),
            },
            baselines,
            ..PackageData::default()
        },
        notes,
    }
}

/// Map one repository object to an element record
pub fn map_element(object: &SourceObject) -> ElementRecord {
    let attrs = &object.attributes;
    ElementRecord {
        id: object.id.clone(),
        element_type: object.object_type.clone(),
        name: ELEMENT_NAME.resolve(attrs),
        properties: attrs.clone(),
        workspace_id: object
            .workspace_id
            .clone()
            .filter(|id| !id.trim().is_empty())
            .or_else(|| attrs.get("workspaceId").and_then(text_of)),
        created_at: CREATED_AT.resolve(attrs),
        updated_at: UPDATED_AT.resolve(attrs),
    }
}

/// Map one repository relationship, generating an id when it has none
pub fn map_relationship(rel: &SourceRelationship, notes: &mut Vec<String>) -> RelationshipRecord {
    let id = match rel.id.as_deref().map(str::trim) {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => {
            let generated = format!("rel-{}", Uuid::new_v4());
            notes.push(format!(
                "Relationship {} -> {} had no id; assigned '{}'",
                rel.source_id, rel.target_id, generated
            ));
            generated
        }
    };

    RelationshipRecord {
        id,
        source_id: rel.source_id.clone(),
        target_id: rel.target_id.clone(),
        relationship_type: rel.relationship_type.clone(),
        properties: rel.attributes.clone(),
    }
}

/// Map one repository view to a diagram record
pub fn map_diagram(view: &SourceView) -> DiagramRecord {
    let attrs = &view.attributes;
    let scope = parse_scope(attrs.get("scope"));

    let referenced = match scope.selected_elements() {
        Some(selected) => selected.to_vec(),
        None => id_list(attrs.get("referencedElementIds")),
    };

    DiagramRecord {
        id: view.id.clone(),
        title: DIAGRAM_TITLE.resolve(attrs).unwrap_or_default(),
        viewpoint_id: VIEWPOINT_ID.resolve(attrs).unwrap_or_default(),
        description: DESCRIPTION.resolve(attrs).unwrap_or_default(),
        scope,
        referenced_element_ids: dedupe(referenced),
        visible_relationship_ids: dedupe(id_list(attrs.get("visibleRelationshipIds"))),
        layout_metadata: attrs.get("layoutMetadata").filter(|v| !v.is_null()).cloned(),
        created_at: CREATED_AT.resolve(attrs),
        created_by: CREATED_BY.resolve(attrs),
    }
}

/// Parse a scope descriptor; anything unrecognised covers the whole repository
fn parse_scope(raw: Option<&Value>) -> DiagramScope {
    match raw {
        Some(Value::String(kind)) if kind == "ManualSelection" => DiagramScope::ManualSelection {
            element_ids: Vec::new(),
        },
        Some(value @ Value::Object(_)) => {
            let mut scope =
                serde_json::from_value::<DiagramScope>(value.clone()).unwrap_or_default();
            if let DiagramScope::ManualSelection { element_ids } = &mut scope {
                *element_ids = dedupe(std::mem::take(element_ids));
            }
            scope
        }
        _ => DiagramScope::EntireRepository,
    }
}

/// Drop repeated ids, keeping first occurrences in order
fn dedupe(ids: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    ids.into_iter().filter(|id| seen.insert(id.clone())).collect()
}

fn map_workspace(
    source: &RepositoryPackageSource,
    baselines: &[BaselineRecord],
) -> WorkspaceRecord {
    let metadata = &source.metadata;
    let schema_version = metadata
        .schema_version
        .clone()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| SCHEMA_VERSION.to_string());

    WorkspaceRecord {
        schema_version,
        repository_metadata: metadata.attributes.clone(),
        repository_id: metadata.repository_id.clone(),
        updated_at: metadata.updated_at.clone(),
        design_workspaces: source.design_workspaces.clone(),
        baselines: baselines
            .iter()
            .map(|b| json!({ "id": b.id, "name": b.name, "createdAt": b.created_at }))
            .collect(),
    }
}

/// Map one raw baseline; non-object entries are skipped with a note
fn map_baseline(index: usize, raw: &Value, notes: &mut Vec<String>) -> Option<BaselineRecord> {
    let Value::Object(attrs) = raw else {
        notes.push(format!("Baseline #{} is not an object; skipped", index));
        return None;
    };

    let id = attrs.get("id").and_then(text_of).unwrap_or_default();
    let snapshot = match attrs.get("snapshot") {
        Some(Value::Object(sections)) => Some(map_snapshot(&id, sections, notes)),
        _ => None,
    };

    let count = |key: &str, section: Option<usize>| -> u64 {
        attrs
            .get(key)
            .and_then(Value::as_u64)
            .or(section.map(|len| len as u64))
            .unwrap_or(0)
    };
    let element_count = count(
        "elementCount",
        snapshot.as_ref().and_then(|s| s.elements.as_ref().map(Vec::len)),
    );
    let relationship_count = count(
        "relationshipCount",
        snapshot.as_ref().and_then(|s| s.relationships.as_ref().map(Vec::len)),
    );
    let diagram_count = count(
        "diagramCount",
        snapshot.as_ref().and_then(|s| s.diagrams.as_ref().map(Vec::len)),
    );

    Some(BaselineRecord {
        name: ELEMENT_NAME.resolve(attrs).unwrap_or_default(),
        description: DESCRIPTION.resolve(attrs).unwrap_or_default(),
        created_at: CREATED_AT.resolve(attrs),
        created_by: CREATED_BY.resolve(attrs),
        element_count,
        relationship_count,
        diagram_count,
        snapshot,
        id,
    })
}

fn map_snapshot(
    baseline: &str,
    sections: &AttributeMap,
    notes: &mut Vec<String>,
) -> BaselineSnapshot {
    BaselineSnapshot {
        elements: snapshot_section(baseline, sections, "elements", notes),
        relationships: snapshot_section(baseline, sections, "relationships", notes),
        diagrams: snapshot_section(baseline, sections, "diagrams", notes),
        layouts: snapshot_section(baseline, sections, "layouts", notes),
    }
}

/// Decode one snapshot section; an undecodable section is dropped with a note
fn snapshot_section<T: DeserializeOwned>(
    baseline: &str,
    sections: &AttributeMap,
    key: &str,
    notes: &mut Vec<String>,
) -> Option<T> {
    let value = sections.get(key).filter(|v| !v.is_null())?;
    match serde_json::from_value(value.clone()) {
        Ok(section) => Some(section),
        Err(e) => {
            notes.push(format!(
                "Baseline '{}' snapshot section '{}' could not be read ({}); dropped",
                baseline, key, e
            ));
            None
        }
    }
}
