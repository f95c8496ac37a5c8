//! eapkg - Portable packages for enterprise architecture repositories
//!
//! A package is a zip archive of canonical JSON documents describing one
//! repository: elements, relationships, diagrams, layouts and the workspace
//! metadata around them, plus a manifest carrying versions, counts and a
//! SHA-256 checksum.
//!
//! # Quick Start
//!
//! ```ignore
//! use eapkg::{build_package, parse_package, RepositoryPackageSource};
//!
//! let exported = build_package(&source)?;
//! for warning in &exported.warnings {
//!     eprintln!("export: {warning}");
//! }
//!
//! let parsed = parse_package(&exported.bytes)?;
//! assert_eq!(parsed.data.elements.len(), source.objects.len());
//! ```
//!
//! # Architecture
//!
//! - `eapkg-core`: record model, source model, canonical JSON
//! - `eapkg-package`: archive codec, checksum, export and import pipelines
//!
//! Everything public in `eapkg-package` is re-exported here, along with the
//! core record types.

pub use eapkg_core::{
    canonicalize, BaselineRecord, DiagramRecord, DiagramScope, ElementRecord, LayoutsRecord,
    RelationshipRecord, SourceMetadata, SourceObject, SourceRelationship, SourceView,
    WorkspaceRecord,
};
pub use eapkg_package::*;
