//! Archive extraction strategies
//!
//! Two readers exist for the zip container. The streaming reader walks
//! local file headers front to back; the central-directory reader uses the
//! index at the end of the archive. Import runs them through
//! [`WithFallback`], which tries the primary once and the fallback once.

use std::io::{Cursor, Read};

use tracing::warn;
use zip::read::read_zipfile_from_stream;
use zip::ZipArchive;

use crate::archive::{insert_entry, ArchiveEntries};
use crate::error::{PackageError, PackageResult};

/// A way of turning package bytes into extracted entries.
///
/// Implementations must be `Send + Sync` so one importer can serve
/// concurrent imports.
pub trait ExtractStrategy: Send + Sync {
    /// Short name used in logs and errors.
    fn name(&self) -> &'static str;

    /// Extract every file entry, normalised and filtered.
    fn extract(&self, bytes: &[u8]) -> PackageResult<ArchiveEntries>;
}

/// Reads entries sequentially from their local file headers.
#[derive(Debug, Clone, Copy, Default)]
pub struct StreamingExtractor;

impl ExtractStrategy for StreamingExtractor {
    fn name(&self) -> &'static str {
        "streaming"
    }

    fn extract(&self, bytes: &[u8]) -> PackageResult<ArchiveEntries> {
        let mut reader = Cursor::new(bytes);
        let mut entries = ArchiveEntries::new();

        loop {
            match read_zipfile_from_stream(&mut reader) {
                Ok(Some(mut file)) => {
                    let name = file.name().to_string();
                    let is_dir = file.is_dir();
                    let mut data = Vec::new();
                    file.read_to_end(&mut data)
                        .map_err(|e| PackageError::archive(format!("read {}: {}", name, e)))?;
                    insert_entry(&mut entries, &name, is_dir, data);
                }
                Ok(None) => break,
                Err(e) => return Err(PackageError::archive(format!("stream read: {}", e))),
            }
        }

        Ok(entries)
    }
}

/// Reads entries through the central directory index.
#[derive(Debug, Clone, Copy, Default)]
pub struct CentralDirectoryExtractor;

impl ExtractStrategy for CentralDirectoryExtractor {
    fn name(&self) -> &'static str {
        "central-directory"
    }

    fn extract(&self, bytes: &[u8]) -> PackageResult<ArchiveEntries> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))
            .map_err(|e| PackageError::archive(format!("open archive: {}", e)))?;
        let mut entries = ArchiveEntries::new();

        for index in 0..archive.len() {
            let mut file = archive
                .by_index(index)
                .map_err(|e| PackageError::archive(format!("entry {}: {}", index, e)))?;
            let name = file.name().to_string();
            let is_dir = file.is_dir();
            let mut data = Vec::new();
            file.read_to_end(&mut data)
                .map_err(|e| PackageError::archive(format!("read {}: {}", name, e)))?;
            insert_entry(&mut entries, &name, is_dir, data);
        }

        Ok(entries)
    }
}

/// Primary strategy with exactly one fallback attempt.
///
/// The fallback runs only if the primary fails; if both fail the error
/// carries both messages.
#[derive(Debug, Clone, Default)]
pub struct WithFallback<P, F> {
    primary: P,
    fallback: F,
}

impl<P, F> WithFallback<P, F> {
    /// Combine a primary and a fallback strategy.
    pub fn new(primary: P, fallback: F) -> Self {
        Self { primary, fallback }
    }
}

impl<P: ExtractStrategy, F: ExtractStrategy> ExtractStrategy for WithFallback<P, F> {
    fn name(&self) -> &'static str {
        self.primary.name()
    }

    fn extract(&self, bytes: &[u8]) -> PackageResult<ArchiveEntries> {
        let primary_err = match self.primary.extract(bytes) {
            Ok(entries) => return Ok(entries),
            Err(e) => e,
        };

        warn!(
            primary = self.primary.name(),
            fallback = self.fallback.name(),
            error = %primary_err,
            "Primary extraction failed, retrying with fallback"
        );

        self.fallback
            .extract(bytes)
            .map_err(|fallback_err| PackageError::Extraction {
                primary: primary_err.to_string(),
                fallback: fallback_err.to_string(),
            })
    }
}

/// The extractor imports use unless told otherwise.
pub type DefaultExtractor = WithFallback<StreamingExtractor, CentralDirectoryExtractor>;

/// Streaming first, central directory as the fallback.
pub fn default_extractor() -> DefaultExtractor {
    WithFallback::new(StreamingExtractor, CentralDirectoryExtractor)
}
