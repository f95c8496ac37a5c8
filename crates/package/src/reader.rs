//! Repository package reader
//!
//! Reads .eapkg archives and validates their contents. Import runs a
//! staged pipeline, each stage short-circuiting on failure:
//!
//! 1. byte sanity (non-empty, zip magic)
//! 2. extraction (streaming, then central directory)
//! 3. required-file presence
//! 4. manifest and version gate
//! 5. checksum verification (soft)
//! 6. document decoding
//! 7. structural checks
//! 8. strict referential integrity
//! 9. manifest count cross-check

use std::collections::BTreeMap;

use eapkg_core::attributes::{DIAGRAM_TITLE, VIEWPOINT_ID};
use eapkg_core::{
    id_list, text_of, AttributeMap, BaselineRecord, DiagramRecord, DiagramScope, ElementRecord,
    ImportHistory, LayoutsRecord, PackageData, PackageManifest, RelationshipRecord,
    VersionHistory, ViewLayout, WorkspaceRecord,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::archive::{has_zip_magic, hex_prefix, ArchiveEntries};
use crate::checksum::{checksum_entries, checksum_prefix};
use crate::config::ChecksumAlgorithm;
use crate::error::{PackageError, PackageResult};
use crate::extract::{default_extractor, DefaultExtractor, ExtractStrategy};
use crate::integrity::{evaluate, DocumentSet, FirstBlocking};
use crate::types::{
    paths, ManifestCounts, PackageVerifyInfo, ParsedPackage, EXPORT_VERSION, SCHEMA_VERSION,
};

/// Reader for repository packages
///
/// Holds no state between calls; one importer can serve any number of
/// imports.
pub struct PackageImporter<E = DefaultExtractor> {
    extractor: E,
}

impl PackageImporter<DefaultExtractor> {
    /// Create an importer with the default extraction strategy
    pub fn new() -> Self {
        Self {
            extractor: default_extractor(),
        }
    }
}

impl Default for PackageImporter<DefaultExtractor> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: ExtractStrategy> PackageImporter<E> {
    /// Create an importer with a custom extraction strategy
    pub fn with_extractor(extractor: E) -> Self {
        Self { extractor }
    }

    /// Parse and fully validate a package
    ///
    /// Either every check passes and the complete data is returned (with
    /// any soft warnings), or the first failing check is returned as the
    /// error. Nothing is partially imported.
    pub fn parse(&self, bytes: &[u8]) -> PackageResult<ParsedPackage> {
        let entries = self.open(bytes)?;
        require_files(&entries)?;

        let mut warnings = Vec::new();

        let manifest = decode_manifest(&entries)?;
        check_versions(&manifest, &mut warnings)?;
        verify_checksum(&manifest, &entries, &mut warnings);

        let mut unreadable = Unreadable::new();
        let mut data = decode_documents(&entries, &mut unreadable)?;

        let mut sink = FirstBlocking::default();
        let _ = evaluate(&DocumentSet::of(&data), &mut sink);
        for advisory in &sink.advisories {
            debug!(target: "eapkg::import", %advisory, "Advisory integrity note");
        }
        if let Some(violation) = sink.blocking {
            return Err(PackageError::Integrity(violation));
        }

        cross_check_counts(&manifest, &data, &unreadable)?;

        for warning in &warnings {
            warn!(target: "eapkg::import", %warning, "Import warning");
        }
        info!(
            target: "eapkg::import",
            elements = data.elements.len(),
            relationships = data.relationships.len(),
            diagrams = data.diagrams.len(),
            baselines = data.baselines.len(),
            layouts = data.layouts.len(),
            design_workspaces = data.workspace.design_workspaces.len(),
            schema_version = %manifest.schema_version,
            warnings = warnings.len(),
            "Repository package imported"
        );

        data.manifest = manifest;
        Ok(ParsedPackage { data, warnings })
    }

    /// Check a package without decoding its documents
    ///
    /// Reports whether the required files exist and whether the stored
    /// checksum matches. Structural and referential checks are not run.
    pub fn verify(&self, bytes: &[u8]) -> PackageResult<PackageVerifyInfo> {
        let entries = self.open(bytes)?;

        let missing_required = missing_required(&entries);
        let manifest = decode_manifest(&entries)?;

        let checksum_present = !manifest.checksum.is_empty();
        let computed = checksum_entries(ChecksumAlgorithm::Sha256, &entries);
        let checksum_valid = checksum_present
            && computed.missing.is_empty()
            && computed.computed == manifest.checksum;

        Ok(PackageVerifyInfo {
            manifest,
            checksum_present,
            checksum_valid,
            missing_required,
            files: entries.keys().cloned().collect(),
        })
    }

    /// Read only the manifest
    pub fn read_manifest(&self, bytes: &[u8]) -> PackageResult<PackageManifest> {
        let entries = self.open(bytes)?;
        let manifest = decode_manifest(&entries)?;
        Ok(manifest)
    }

    /// Byte sanity checks, then extraction
    fn open(&self, bytes: &[u8]) -> PackageResult<ArchiveEntries> {
        if bytes.is_empty() {
            return Err(PackageError::EmptyInput);
        }
        if !has_zip_magic(bytes) {
            return Err(PackageError::BadMagic {
                found: hex_prefix(bytes),
            });
        }

        let entries = self.extractor.extract(bytes)?;
        debug!(
            target: "eapkg::import",
            strategy = self.extractor.name(),
            entries = entries.len(),
            "Package extracted"
        );
        Ok(entries)
    }
}

// =============================================================================
// Stages
// =============================================================================

fn missing_required(entries: &ArchiveEntries) -> Vec<String> {
    paths::REQUIRED
        .iter()
        .filter(|path| !entries.contains_key(**path))
        .map(|path| path.to_string())
        .collect()
}

fn require_files(entries: &ArchiveEntries) -> PackageResult<()> {
    let missing = missing_required(entries);
    if missing.is_empty() {
        Ok(())
    } else {
        Err(PackageError::MissingFiles {
            missing,
            found: entries.keys().cloned().collect(),
        })
    }
}

/// Decode the manifest, gating on `exportVersion` before the full shape
///
/// A manifest from another format generation may lay out its fields
/// differently, so its version is read from the raw JSON first.
fn decode_manifest(entries: &ArchiveEntries) -> PackageResult<PackageManifest> {
    let bytes = required_entry(entries, paths::MANIFEST)?;
    let value: Value =
        serde_json::from_slice(bytes).map_err(|e| PackageError::malformed(paths::MANIFEST, e))?;

    if let Some(found) = value.get("exportVersion").and_then(Value::as_u64) {
        if found != u64::from(EXPORT_VERSION) {
            return Err(PackageError::UnsupportedExportVersion {
                found: u32::try_from(found).unwrap_or(u32::MAX),
                supported: EXPORT_VERSION,
            });
        }
    }

    let manifest: PackageManifest =
        serde_json::from_value(value).map_err(|e| PackageError::malformed(paths::MANIFEST, e))?;
    check_export_version(&manifest)?;
    Ok(manifest)
}

fn check_export_version(manifest: &PackageManifest) -> PackageResult<()> {
    if manifest.export_version != EXPORT_VERSION {
        return Err(PackageError::UnsupportedExportVersion {
            found: manifest.export_version,
            supported: EXPORT_VERSION,
        });
    }
    Ok(())
}

fn check_versions(manifest: &PackageManifest, warnings: &mut Vec<String>) -> PackageResult<()> {
    let generation = manifest
        .schema_generation()
        .ok_or_else(|| PackageError::InvalidSchemaVersion(manifest.schema_version.clone()))?;

    if generation > SCHEMA_VERSION {
        return Err(PackageError::SchemaTooNew {
            found: manifest.schema_version.clone(),
            supported: SCHEMA_VERSION,
        });
    }
    if generation < SCHEMA_VERSION {
        warnings.push(format!(
            "Package uses repository schema version {}, older than the current version {}",
            manifest.schema_version, SCHEMA_VERSION
        ));
    }
    Ok(())
}

/// Checksum problems are always soft
fn verify_checksum(
    manifest: &PackageManifest,
    entries: &ArchiveEntries,
    warnings: &mut Vec<String>,
) {
    if manifest.checksum.is_empty() {
        warnings.push("Package has no checksum; contents could not be verified".to_string());
        return;
    }

    let check = checksum_entries(ChecksumAlgorithm::Sha256, entries);
    if !check.missing.is_empty() {
        warnings.push(format!(
            "Files missing for checksum verification: {}",
            check.missing.join(", ")
        ));
    }
    if check.computed != manifest.checksum {
        warnings.push(format!(
            "Checksum mismatch (manifest {}, computed {}); the package may have been re-saved by another tool",
            checksum_prefix(&manifest.checksum),
            checksum_prefix(&check.computed)
        ));
    }
}

/// Optional documents that were present but could not be decoded: path -> reason
type Unreadable = BTreeMap<&'static str, String>;

fn decode_documents(
    entries: &ArchiveEntries,
    unreadable: &mut Unreadable,
) -> PackageResult<PackageData> {
    let elements = decode_records(entries, paths::ELEMENTS, rebuild_element)?;
    let relationships = decode_records(entries, paths::RELATIONSHIPS, rebuild_relationship)?;
    let diagrams = decode_records(entries, paths::DIAGRAMS, rebuild_diagram)?;
    let layouts = decode_layouts(entries);

    let workspace: WorkspaceRecord = decode_optional(entries, paths::WORKSPACE, unreadable);
    let import_history: ImportHistory =
        decode_optional(entries, paths::IMPORT_HISTORY, unreadable);
    let version_history: VersionHistory =
        decode_optional(entries, paths::VERSION_HISTORY, unreadable);
    let baselines: Vec<BaselineRecord> = decode_optional(entries, paths::BASELINES, unreadable);

    Ok(PackageData {
        manifest: PackageManifest::default(),
        elements,
        relationships,
        diagrams,
        layouts,
        workspace,
        import_history,
        version_history,
        baselines,
    })
}

/// Optional document whose contents a manifest count describes
fn counted_document(field: &str) -> Option<&'static str> {
    match field {
        "baselineCount" => Some(paths::BASELINES),
        "designWorkspaceCount" => Some(paths::WORKSPACE),
        _ => None,
    }
}

fn cross_check_counts(
    manifest: &PackageManifest,
    data: &PackageData,
    unreadable: &Unreadable,
) -> PackageResult<()> {
    let recorded = ManifestCounts::recorded(manifest).fields();
    let actual = ManifestCounts::of(data).fields();

    for ((field, expected), (_, found)) in recorded.into_iter().zip(actual) {
        if expected != found {
            let unread = counted_document(field)
                .and_then(|file| unreadable.get(file).map(|reason| (file, reason)));
            if let Some((file, reason)) = unread {
                return Err(PackageError::UnreadableCountedDocument {
                    field,
                    expected,
                    file,
                    reason: reason.clone(),
                });
            }
            return Err(PackageError::CountMismatch {
                field,
                expected,
                actual: found,
            });
        }
    }
    Ok(())
}

// =============================================================================
// Document decoding
// =============================================================================

fn required_entry<'a>(entries: &'a ArchiveEntries, path: &str) -> PackageResult<&'a [u8]> {
    entries
        .get(path)
        .map(Vec::as_slice)
        .ok_or_else(|| PackageError::MissingFiles {
            missing: vec![path.to_string()],
            found: entries.keys().cloned().collect(),
        })
}

/// Decode a required JSON array document
fn decode_array_value(entries: &ArchiveEntries, path: &str) -> PackageResult<Vec<Value>> {
    let bytes = required_entry(entries, path)?;
    match serde_json::from_slice::<Value>(bytes) {
        Ok(Value::Array(items)) => Ok(items),
        Ok(_) => Err(PackageError::NotAnArray {
            file: path.to_string(),
        }),
        Err(e) => Err(PackageError::malformed(path, e)),
    }
}

/// Decode a required array of records
///
/// Items that do not match the record shape are rebuilt from their fields,
/// so a mistyped optional field never fails the import. Required ids are
/// left to the integrity rules. An item that is not an object is malformed.
fn decode_records<T: DeserializeOwned>(
    entries: &ArchiveEntries,
    path: &str,
    rebuild: fn(&AttributeMap) -> T,
) -> PackageResult<Vec<T>> {
    let items = decode_array_value(entries, path)?;
    let mut records = Vec::with_capacity(items.len());

    for (index, item) in items.into_iter().enumerate() {
        let Value::Object(attrs) = &item else {
            return Err(PackageError::malformed(
                path,
                format!("item {} is not an object", index),
            ));
        };
        match serde_json::from_value::<T>(item.clone()) {
            Ok(record) => records.push(record),
            Err(e) => {
                warn!(
                    target: "eapkg::import",
                    file = path,
                    index,
                    error = %e,
                    "Record does not match its shape, rebuilding from its fields"
                );
                records.push(rebuild(attrs));
            }
        }
    }
    Ok(records)
}

fn text_field(attrs: &AttributeMap, key: &str) -> String {
    attrs.get(key).and_then(text_of).unwrap_or_default()
}

fn optional_text(attrs: &AttributeMap, key: &str) -> Option<String> {
    attrs.get(key).and_then(text_of)
}

/// Open attribute bag; anything but an object counts as empty
fn properties_of(attrs: &AttributeMap) -> AttributeMap {
    match attrs.get("properties") {
        Some(Value::Object(map)) => map.clone(),
        _ => AttributeMap::new(),
    }
}

fn rebuild_element(attrs: &AttributeMap) -> ElementRecord {
    ElementRecord {
        id: text_field(attrs, "id"),
        element_type: text_field(attrs, "type"),
        name: optional_text(attrs, "name"),
        properties: properties_of(attrs),
        workspace_id: optional_text(attrs, "workspaceId"),
        created_at: optional_text(attrs, "createdAt"),
        updated_at: optional_text(attrs, "updatedAt"),
    }
}

fn rebuild_relationship(attrs: &AttributeMap) -> RelationshipRecord {
    RelationshipRecord {
        id: text_field(attrs, "id"),
        source_id: text_field(attrs, "sourceId"),
        target_id: text_field(attrs, "targetId"),
        relationship_type: text_field(attrs, "type"),
        properties: properties_of(attrs),
    }
}

fn rebuild_diagram(attrs: &AttributeMap) -> DiagramRecord {
    let scope = attrs
        .get("scope")
        .cloned()
        .and_then(|raw| serde_json::from_value::<DiagramScope>(raw).ok())
        .unwrap_or_default();

    DiagramRecord {
        id: text_field(attrs, "id"),
        title: DIAGRAM_TITLE.resolve(attrs).unwrap_or_default(),
        viewpoint_id: VIEWPOINT_ID.resolve(attrs).unwrap_or_default(),
        description: text_field(attrs, "description"),
        scope,
        referenced_element_ids: id_list(attrs.get("referencedElementIds")),
        visible_relationship_ids: id_list(attrs.get("visibleRelationshipIds")),
        layout_metadata: attrs.get("layoutMetadata").filter(|v| !v.is_null()).cloned(),
        created_at: optional_text(attrs, "createdAt"),
        created_by: optional_text(attrs, "createdBy"),
    }
}

/// Decode layouts; anything unreadable becomes an empty layout set
fn decode_layouts(entries: &ArchiveEntries) -> LayoutsRecord {
    let Some(bytes) = entries.get(paths::LAYOUTS) else {
        return LayoutsRecord::default();
    };
    let value = match serde_json::from_slice::<Value>(bytes) {
        Ok(value) => value,
        Err(e) => {
            warn!(target: "eapkg::import", error = %e, "Layouts unreadable, using empty layouts");
            return LayoutsRecord::default();
        }
    };

    let Some(Value::Object(views)) = value.get("viewLayouts") else {
        warn!(target: "eapkg::import", "Layouts have no viewLayouts object, using empty layouts");
        return LayoutsRecord::default();
    };

    let view_layouts = views
        .iter()
        .map(|(diagram, positions)| {
            let layout: ViewLayout = match positions {
                Value::Object(map) => map.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
                _ => ViewLayout::new(),
            };
            (diagram.clone(), layout)
        })
        .collect();

    LayoutsRecord { view_layouts }
}

/// Decode an optional document, falling back to its default
///
/// A document that is present but unreadable is recorded in `unreadable`.
fn decode_optional<T: DeserializeOwned + Default>(
    entries: &ArchiveEntries,
    path: &'static str,
    unreadable: &mut Unreadable,
) -> T {
    let Some(bytes) = entries.get(path) else {
        debug!(target: "eapkg::import", file = path, "Optional document absent, using default");
        return T::default();
    };
    match serde_json::from_slice(bytes) {
        Ok(value) => value,
        Err(e) => {
            warn!(
                target: "eapkg::import",
                file = path,
                error = %e,
                "Optional document unreadable, using default"
            );
            unreadable.insert(path, e.to_string());
            T::default()
        }
    }
}
