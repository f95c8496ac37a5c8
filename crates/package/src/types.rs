//! Repository package core types
//!
//! Format constants, archive paths and the result types returned by export,
//! import and verification.

use eapkg_core::{PackageData, PackageManifest};

/// Supported archive format version (manifest `exportVersion`)
pub const EXPORT_VERSION: u32 = 1;

/// Current repository schema generation (manifest `schemaVersion`)
pub const SCHEMA_VERSION: u32 = 2;

/// File extension for repository packages
pub const EAPKG_EXTENSION: &str = ".eapkg";

/// Zip local-file-header signature every package must start with
pub const ZIP_MAGIC: [u8; 4] = [0x50, 0x4B, 0x03, 0x04];

/// Archive paths within the package
pub mod paths {
    /// Package manifest
    pub const MANIFEST: &str = "manifest.json";
    /// Element records
    pub const ELEMENTS: &str = "model/elements.json";
    /// Relationship records
    pub const RELATIONSHIPS: &str = "model/relationships.json";
    /// Diagram records
    pub const DIAGRAMS: &str = "views/diagrams.json";
    /// Per-diagram layouts
    pub const LAYOUTS: &str = "views/layouts.json";
    /// Workspace metadata
    pub const WORKSPACE: &str = "metadata/workspace.json";
    /// Import history
    pub const IMPORT_HISTORY: &str = "metadata/import-history.json";
    /// Version history
    pub const VERSION_HISTORY: &str = "metadata/version-history.json";
    /// Baselines
    pub const BASELINES: &str = "metadata/baselines.json";

    /// Entries an import cannot proceed without
    pub const REQUIRED: [&str; 5] = [MANIFEST, ELEMENTS, RELATIONSHIPS, DIAGRAMS, LAYOUTS];

    /// Documents covered by the checksum, in concatenation order.
    /// Changing this order breaks checksum interoperability.
    pub const CHECKSUM_ORDER: [&str; 8] = [
        ELEMENTS,
        RELATIONSHIPS,
        DIAGRAMS,
        LAYOUTS,
        WORKSPACE,
        IMPORT_HISTORY,
        VERSION_HISTORY,
        BASELINES,
    ];
}

// =============================================================================
// Manifest counts
// =============================================================================

/// The six collection sizes a manifest records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ManifestCounts {
    /// Elements
    pub elements: u64,
    /// Relationships
    pub relationships: u64,
    /// Diagrams
    pub diagrams: u64,
    /// Baselines
    pub baselines: u64,
    /// Diagrams with a layout entry
    pub layouts: u64,
    /// Design workspaces
    pub design_workspaces: u64,
}

impl ManifestCounts {
    /// Actual collection sizes of a package
    pub fn of(data: &PackageData) -> Self {
        Self {
            elements: data.elements.len() as u64,
            relationships: data.relationships.len() as u64,
            diagrams: data.diagrams.len() as u64,
            baselines: data.baselines.len() as u64,
            layouts: data.layouts.len() as u64,
            design_workspaces: data.workspace.design_workspaces.len() as u64,
        }
    }

    /// Sizes recorded in a manifest
    pub fn recorded(manifest: &PackageManifest) -> Self {
        Self {
            elements: manifest.element_count,
            relationships: manifest.relationship_count,
            diagrams: manifest.diagram_count,
            baselines: manifest.baseline_count,
            layouts: manifest.layout_count,
            design_workspaces: manifest.design_workspace_count,
        }
    }

    /// Write these sizes into a manifest
    pub fn apply_to(&self, manifest: &mut PackageManifest) {
        manifest.element_count = self.elements;
        manifest.relationship_count = self.relationships;
        manifest.diagram_count = self.diagrams;
        manifest.baseline_count = self.baselines;
        manifest.layout_count = self.layouts;
        manifest.design_workspace_count = self.design_workspaces;
    }

    /// (manifest field name, count) pairs in cross-check order
    pub fn fields(&self) -> [(&'static str, u64); 6] {
        [
            ("elementCount", self.elements),
            ("relationshipCount", self.relationships),
            ("diagramCount", self.diagrams),
            ("baselineCount", self.baselines),
            ("layoutCount", self.layouts),
            ("designWorkspaceCount", self.design_workspaces),
        ]
    }
}

// =============================================================================
// Export Types
// =============================================================================

/// Result of building a package
#[derive(Debug, Clone)]
pub struct ExportedPackage {
    /// Archive bytes (.eapkg)
    pub bytes: Vec<u8>,

    /// Manifest written into the archive
    pub manifest: PackageManifest,

    /// Data-quality warnings; they never block an export
    ///
    /// Source baselines that are not objects are skipped with a warning, so
    /// `manifest.baseline_count` then counts only the baselines written.
    pub warnings: Vec<String>,
}

// =============================================================================
// Import Types
// =============================================================================

/// A fully validated package
#[derive(Debug, Clone)]
pub struct ParsedPackage {
    /// Decoded documents
    pub data: PackageData,

    /// Soft warnings (older schema, checksum mismatch, ...)
    pub warnings: Vec<String>,
}

// =============================================================================
// Verify Types
// =============================================================================

/// Information returned after verifying a package
#[derive(Debug, Clone)]
pub struct PackageVerifyInfo {
    /// Manifest as stored in the package
    pub manifest: PackageManifest,

    /// Whether a checksum is recorded in the manifest
    pub checksum_present: bool,

    /// Whether the recorded checksum matches the documents
    pub checksum_valid: bool,

    /// Required entries that are absent
    pub missing_required: Vec<String>,

    /// Every entry found in the archive
    pub files: Vec<String>,
}

impl PackageVerifyInfo {
    /// True when every required entry exists and the checksum matches
    pub fn is_intact(&self) -> bool {
        self.missing_required.is_empty() && self.checksum_valid
    }
}
