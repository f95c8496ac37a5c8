//! Repository package error types

use eapkg_core::CanonicalError;
use thiserror::Error;

use crate::config::ConfigError;
use crate::integrity::IntegrityViolation;

/// Broad class of a package failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Bytes are not a package, or could not be extracted
    Container,
    /// Required file missing or a document has the wrong shape
    Structural,
    /// Unsupported export version or too-new schema
    Version,
    /// Duplicate id, dangling reference, missing field or count mismatch
    Integrity,
    /// Configuration problem or an internal invariant failure
    Internal,
}

/// Errors that can occur during package operations
#[derive(Debug, Error)]
pub enum PackageError {
    /// Input buffer has no bytes
    #[error("Package is empty")]
    EmptyInput,

    /// Input does not start with the zip local-file-header signature
    #[error("Not a package archive: expected header 50 4B 03 04, found {found}")]
    BadMagic {
        /// Hex rendering of the first bytes actually found
        found: String,
    },

    /// Both extraction strategies failed
    #[error("Could not extract package: {primary} (fallback also failed: {fallback})")]
    Extraction {
        /// Error from the primary strategy
        primary: String,
        /// Error from the fallback strategy
        fallback: String,
    },

    /// Archive read or write failed
    #[error("Archive error: {0}")]
    Archive(String),

    /// Required entries are absent
    #[error(
        "Package is missing required files: {} (found: {})",
        .missing.join(", "),
        found_list(.found)
    )]
    MissingFiles {
        /// Required entries that were not found
        missing: Vec<String>,
        /// Entries that were found
        found: Vec<String>,
    },

    /// A document could not be decoded
    #[error("Malformed {file}: {reason}")]
    MalformedDocument {
        /// Archive path of the document
        file: String,
        /// Decoder message
        reason: String,
    },

    /// A document that must be a JSON array is not
    #[error("{file} must contain a JSON array")]
    NotAnArray {
        /// Archive path of the document
        file: String,
    },

    /// Manifest export version is not the supported one
    #[error("Unsupported export version {found} (supported: {supported})")]
    UnsupportedExportVersion {
        /// Version found in the manifest
        found: u32,
        /// Version this tool reads
        supported: u32,
    },

    /// Manifest schema version is newer than this tool
    #[error("Repository schema version {found} is newer than this tool supports ({supported}); upgrade the tool to import it")]
    SchemaTooNew {
        /// Schema version found in the manifest
        found: String,
        /// Newest schema version this tool reads
        supported: u32,
    },

    /// Manifest schema version is not numeric
    #[error("Invalid schema version '{0}'")]
    InvalidSchemaVersion(String),

    /// Referential-integrity rule failed
    #[error("Integrity check failed: {0}")]
    Integrity(#[from] IntegrityViolation),

    /// Manifest count disagrees with the decoded collection
    #[error("Manifest {field} is {expected} but the package contains {actual}")]
    CountMismatch {
        /// Manifest field name
        field: &'static str,
        /// Count recorded in the manifest
        expected: u64,
        /// Actual collection length
        actual: u64,
    },

    /// A counted optional document could not be decoded, so its count cannot match
    #[error("Manifest {field} is {expected} but {file} could not be read: {reason}")]
    UnreadableCountedDocument {
        /// Manifest field name
        field: &'static str,
        /// Count recorded in the manifest
        expected: u64,
        /// Package path of the unreadable document
        file: &'static str,
        /// Decode error
        reason: String,
    },

    /// Invalid package configuration
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// Canonical encoding failed
    #[error("Canonical encoding failed: {0}")]
    Canonical(#[from] CanonicalError),

    /// Internal invariant violated (a bug, not bad input)
    #[error("Internal invariant violated: {0}")]
    Invariant(String),
}

fn found_list(found: &[String]) -> String {
    if found.is_empty() {
        "nothing".to_string()
    } else {
        found.join(", ")
    }
}

impl PackageError {
    /// Create an archive error
    pub fn archive(msg: impl Into<String>) -> Self {
        Self::Archive(msg.into())
    }

    /// Create a malformed document error
    pub fn malformed(file: impl Into<String>, reason: impl ToString) -> Self {
        Self::MalformedDocument {
            file: file.into(),
            reason: reason.to_string(),
        }
    }

    /// Create an invariant error
    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::Invariant(msg.into())
    }

    /// Error taxonomy class of this error
    pub fn category(&self) -> ErrorCategory {
        match self {
            PackageError::EmptyInput
            | PackageError::BadMagic { .. }
            | PackageError::Extraction { .. }
            | PackageError::Archive(_) => ErrorCategory::Container,
            PackageError::MissingFiles { .. }
            | PackageError::MalformedDocument { .. }
            | PackageError::NotAnArray { .. }
            | PackageError::UnreadableCountedDocument { .. } => ErrorCategory::Structural,
            PackageError::UnsupportedExportVersion { .. }
            | PackageError::SchemaTooNew { .. }
            | PackageError::InvalidSchemaVersion(_) => ErrorCategory::Version,
            PackageError::Integrity(_) | PackageError::CountMismatch { .. } => {
                ErrorCategory::Integrity
            }
            PackageError::Config(_)
            | PackageError::Canonical(_)
            | PackageError::Invariant(_) => ErrorCategory::Internal,
        }
    }
}

/// Result type for package operations
pub type PackageResult<T> = Result<T, PackageError>;
