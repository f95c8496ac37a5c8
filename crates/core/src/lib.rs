//! Core types for repository packages
//!
//! This crate defines the values exchanged with the package engine:
//! - Records: canonical element/relationship/diagram/layout/workspace/baseline shapes
//! - Manifest: the package header with versions, counts and checksum
//! - Source: loosely-typed export input from the live repository
//! - Attributes: alias-fallback lookups over open attribute bags
//! - Canonical: deterministic key-sorted JSON encoding

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod attributes;
pub mod canonical;
pub mod error;
pub mod manifest;
pub mod records;
pub mod source;

pub use attributes::{id_list, text_of, Accessor, AttributeChain};
pub use canonical::{canonicalize, canonicalize_value, sort_keys};
pub use error::{CanonicalError, CanonicalResult};
pub use manifest::{normalize_schema_version, PackageManifest};
pub use records::{
    AttributeMap, BaselineRecord, BaselineSnapshot, DiagramRecord, DiagramScope, ElementRecord,
    ImportHistory, LayoutsRecord, PackageData, RelationshipRecord, VersionHistory, ViewLayout,
    WorkspaceRecord,
};
pub use source::{
    RepositoryPackageSource, SourceMetadata, SourceObject, SourceRelationship, SourceView,
};
