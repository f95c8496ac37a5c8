//! Package checksum
//!
//! SHA-256 over the canonical bytes of the eight package documents,
//! concatenated in [`paths::CHECKSUM_ORDER`]. The manifest is not covered.

use eapkg_core::{canonicalize, CanonicalResult, PackageData};
use sha2::{Digest, Sha256};

use crate::archive::ArchiveEntries;
use crate::config::ChecksumAlgorithm;
use crate::types::paths;

/// Digest an ordered list of buffers as if they were one concatenation
///
/// Returns lowercase hex, or an empty string when the digest is disabled.
pub fn digest(algorithm: ChecksumAlgorithm, buffers: &[&[u8]]) -> String {
    match algorithm {
        ChecksumAlgorithm::Disabled => String::new(),
        ChecksumAlgorithm::Sha256 => {
            let mut hasher = Sha256::new();
            for buffer in buffers {
                hasher.update(buffer);
            }
            hex_encode(&hasher.finalize())
        }
    }
}

/// Encode bytes as lowercase hex string.
fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Canonical bytes of the eight checksummed documents
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalDocuments {
    /// model/elements.json
    pub elements: Vec<u8>,
    /// model/relationships.json
    pub relationships: Vec<u8>,
    /// views/diagrams.json
    pub diagrams: Vec<u8>,
    /// views/layouts.json
    pub layouts: Vec<u8>,
    /// metadata/workspace.json
    pub workspace: Vec<u8>,
    /// metadata/import-history.json
    pub import_history: Vec<u8>,
    /// metadata/version-history.json
    pub version_history: Vec<u8>,
    /// metadata/baselines.json
    pub baselines: Vec<u8>,
}

impl CanonicalDocuments {
    /// Canonicalize every document of a package
    pub fn from_data(data: &PackageData) -> CanonicalResult<Self> {
        Ok(Self {
            elements: canonicalize(&data.elements)?,
            relationships: canonicalize(&data.relationships)?,
            diagrams: canonicalize(&data.diagrams)?,
            layouts: canonicalize(&data.layouts)?,
            workspace: canonicalize(&data.workspace)?,
            import_history: canonicalize(&data.import_history)?,
            version_history: canonicalize(&data.version_history)?,
            baselines: canonicalize(&data.baselines)?,
        })
    }

    /// (archive path, bytes) pairs in checksum order
    pub fn in_checksum_order(&self) -> [(&'static str, &[u8]); 8] {
        [
            (paths::ELEMENTS, self.elements.as_slice()),
            (paths::RELATIONSHIPS, self.relationships.as_slice()),
            (paths::DIAGRAMS, self.diagrams.as_slice()),
            (paths::LAYOUTS, self.layouts.as_slice()),
            (paths::WORKSPACE, self.workspace.as_slice()),
            (paths::IMPORT_HISTORY, self.import_history.as_slice()),
            (paths::VERSION_HISTORY, self.version_history.as_slice()),
            (paths::BASELINES, self.baselines.as_slice()),
        ]
    }

    /// Checksum over all eight documents
    pub fn checksum(&self, algorithm: ChecksumAlgorithm) -> String {
        let ordered = self.in_checksum_order();
        let buffers: Vec<&[u8]> = ordered.iter().map(|(_, bytes)| *bytes).collect();
        digest(algorithm, &buffers)
    }
}

/// Checksum recomputed from the entries of an extracted archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryChecksum {
    /// Digest over the documents that were present
    pub computed: String,
    /// Checksummed documents that were absent
    pub missing: Vec<&'static str>,
}

/// Recompute the checksum over whichever documents an archive contains
pub fn checksum_entries(algorithm: ChecksumAlgorithm, entries: &ArchiveEntries) -> EntryChecksum {
    let mut buffers: Vec<&[u8]> = Vec::with_capacity(paths::CHECKSUM_ORDER.len());
    let mut missing = Vec::new();
    for path in paths::CHECKSUM_ORDER {
        match entries.get(path) {
            Some(bytes) => buffers.push(bytes),
            None => missing.push(path),
        }
    }
    EntryChecksum {
        computed: digest(algorithm, &buffers),
        missing,
    }
}

/// First characters of a checksum for log lines
pub fn checksum_prefix(checksum: &str) -> &str {
    checksum.get(..12).unwrap_or(checksum)
}
