//! Repository packages: portable, integrity-checked repository archives
//!
//! This crate converts between an in-memory architecture repository and
//! `.eapkg` archives.
//!
//! ## Archive Structure
//!
//! ```text
//! repository.eapkg (zip, deflate)
//! ├── manifest.json   # versions, counts, checksum
//! ├── model/
//! │   ├── elements.json
//! │   └── relationships.json
//! ├── views/
//! │   ├── diagrams.json
//! │   └── layouts.json
//! └── metadata/
//!     ├── workspace.json
//!     ├── import-history.json
//!     ├── version-history.json
//!     └── baselines.json
//! ```
//!
//! Every document is canonical JSON (keys sorted, compact). The checksum is
//! SHA-256 over the eight non-manifest documents in the order above.
//!
//! ## Usage
//!
//! Export:
//! ```ignore
//! let exported = eapkg_package::build_package(&source)?;
//! std::fs::write("repo.eapkg", &exported.bytes)?;
//! ```
//!
//! Import:
//! ```ignore
//! let parsed = eapkg_package::parse_package(&bytes)?;
//! for warning in &parsed.warnings { println!("{warning}"); }
//! ```
//!
//! ## Integrity Policy
//!
//! - **Export warns**: duplicate ids and dangling references are reported
//!   in [`ExportedPackage::warnings`], the package is still written
//! - **Import rejects**: the same rules fail the import on the first
//!   blocking violation
//! - **Soft checks**: checksum mismatch and older schema versions only warn

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod archive;
pub mod checksum;
pub mod config;
pub mod error;
pub mod extract;
pub mod integrity;
pub mod mapping;
pub mod reader;
pub mod types;
pub mod writer;

pub use checksum::{digest, CanonicalDocuments};
pub use config::{ChecksumAlgorithm, ConfigError, PackageConfig};
pub use error::{ErrorCategory, PackageError, PackageResult};
pub use extract::{
    default_extractor, CentralDirectoryExtractor, DefaultExtractor, ExtractStrategy,
    StreamingExtractor, WithFallback,
};
pub use integrity::{
    check_strict, collect_warnings, CollectAll, DocumentSet, FirstBlocking, IntegrityViolation,
    ViolationSink,
};
pub use reader::PackageImporter;
pub use types::{
    paths, ExportedPackage, ManifestCounts, PackageVerifyInfo, ParsedPackage, EAPKG_EXTENSION,
    EXPORT_VERSION, SCHEMA_VERSION, ZIP_MAGIC,
};
pub use writer::PackageExporter;

pub use eapkg_core::{PackageData, PackageManifest, RepositoryPackageSource};

/// Build a package with the default configuration
pub fn build_package(source: &RepositoryPackageSource) -> PackageResult<ExportedPackage> {
    PackageExporter::with_defaults().build(source)
}

/// Build a package and deliver its bytes as a single final chunk
pub fn build_package_streaming<F>(
    source: &RepositoryPackageSource,
    on_chunk: F,
) -> PackageResult<ExportedPackage>
where
    F: FnMut(&[u8], bool),
{
    PackageExporter::with_defaults().build_streaming(source, on_chunk)
}

/// Re-encode package data without validating it
pub fn encode_package(data: &PackageData) -> PackageResult<Vec<u8>> {
    PackageExporter::with_defaults().encode(data)
}

/// Parse and fully validate a package
pub fn parse_package(bytes: &[u8]) -> PackageResult<ParsedPackage> {
    PackageImporter::new().parse(bytes)
}

/// Check container, manifest and checksum without full validation
pub fn verify_package(bytes: &[u8]) -> PackageResult<PackageVerifyInfo> {
    PackageImporter::new().verify(bytes)
}

/// Read the manifest of a package
pub fn read_manifest(bytes: &[u8]) -> PackageResult<PackageManifest> {
    PackageImporter::new().read_manifest(bytes)
}
