//! Package configuration.
//!
//! This module provides configuration for building repository packages.

/// Digest used for the package checksum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChecksumAlgorithm {
    /// SHA-256 rendered as lowercase hex (default).
    #[default]
    Sha256,

    /// No digest: the manifest carries an empty checksum and imports
    /// report the package as unverifiable.
    Disabled,
}

/// Package configuration parameters.
#[derive(Debug, Clone)]
pub struct PackageConfig {
    /// Deflate level for every archive entry (0-9, default: 6).
    pub compression_level: i32,

    /// Tool version recorded in the manifest (default: this crate's version).
    pub tool_version: String,

    /// Checksum digest (default: SHA-256).
    pub checksum_algorithm: ChecksumAlgorithm,
}

impl Default for PackageConfig {
    fn default() -> Self {
        PackageConfig {
            compression_level: 6,
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
            checksum_algorithm: ChecksumAlgorithm::Sha256,
        }
    }
}

impl PackageConfig {
    /// Create a new package configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set compression level (builder pattern).
    pub fn with_compression_level(mut self, level: i32) -> Self {
        self.compression_level = level;
        self
    }

    /// Set the recorded tool version (builder pattern).
    pub fn with_tool_version(mut self, version: impl Into<String>) -> Self {
        self.tool_version = version.into();
        self
    }

    /// Set the checksum digest (builder pattern).
    pub fn with_checksum_algorithm(mut self, algorithm: ChecksumAlgorithm) -> Self {
        self.checksum_algorithm = algorithm;
        self
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0..=9).contains(&self.compression_level) {
            return Err(ConfigError::CompressionLevelOutOfRange(
                self.compression_level,
            ));
        }
        if self.tool_version.trim().is_empty() {
            return Err(ConfigError::EmptyToolVersion);
        }
        Ok(())
    }

    /// Create a configuration optimized for testing (fastest compression).
    pub fn for_testing() -> Self {
        PackageConfig {
            compression_level: 1,
            tool_version: "0.0.0-test".to_string(),
            checksum_algorithm: ChecksumAlgorithm::Sha256,
        }
    }
}

/// Package configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// Compression level outside the deflate range.
    #[error("Compression level must be between 0 and 9, got {0}")]
    CompressionLevelOutOfRange(i32),

    /// Tool version is blank.
    #[error("Tool version must not be empty")]
    EmptyToolVersion,
}
