//! Repository package writer
//!
//! Builds .eapkg archives containing:
//! - manifest.json - Versions, collection counts and checksum
//! - model/, views/, metadata/ - The eight canonical documents
//!
//! Export never blocks on data quality: integrity problems become
//! warnings in the returned [`ExportedPackage`].

use chrono::{SecondsFormat, Utc};
use eapkg_core::{
    canonicalize, normalize_schema_version, PackageData, PackageManifest, RepositoryPackageSource,
};
use tracing::{debug, info, warn};

use crate::archive::pack;
use crate::checksum::{checksum_prefix, CanonicalDocuments};
use crate::config::PackageConfig;
use crate::error::PackageResult;
use crate::integrity::{collect_warnings, DocumentSet};
use crate::mapping::{map_source, MappedSource};
use crate::types::{paths, ExportedPackage, ManifestCounts, EXPORT_VERSION, SCHEMA_VERSION};

/// Writer for repository packages
pub struct PackageExporter {
    config: PackageConfig,
}

impl PackageExporter {
    /// Create a new exporter with the given configuration
    pub fn new(config: &PackageConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// Create a new exporter with default configuration
    pub fn with_defaults() -> Self {
        Self::new(&PackageConfig::default())
    }

    /// Configuration in use
    pub fn config(&self) -> &PackageConfig {
        &self.config
    }

    /// Build a complete package from repository source data
    ///
    /// Fails only on invalid configuration or an internal invariant
    /// violation; data-quality problems are returned as warnings.
    pub fn build(&self, source: &RepositoryPackageSource) -> PackageResult<ExportedPackage> {
        self.config.validate()?;

        let MappedSource { mut data, notes } = map_source(source);
        let mut warnings = notes;
        warnings.extend(
            collect_warnings(&DocumentSet::of(&data))
                .iter()
                .map(ToString::to_string),
        );

        let schema_version = match normalize_schema_version(&data.workspace.schema_version) {
            Some(_) => data.workspace.schema_version.clone(),
            None => {
                warnings.push(format!(
                    "Repository schema version '{}' is not numeric; recorded as {}",
                    data.workspace.schema_version, SCHEMA_VERSION
                ));
                SCHEMA_VERSION.to_string()
            }
        };

        for warning in &warnings {
            warn!(target: "eapkg::export", %warning, "Export warning");
        }

        data.manifest = PackageManifest {
            export_version: EXPORT_VERSION,
            tool_version: self.config.tool_version.clone(),
            schema_version,
            export_date: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            ..PackageManifest::default()
        };

        let bytes = self.pack_data(&mut data)?;
        let manifest = data.manifest;

        info!(
            target: "eapkg::export",
            elements = manifest.element_count,
            relationships = manifest.relationship_count,
            diagrams = manifest.diagram_count,
            baselines = manifest.baseline_count,
            layouts = manifest.layout_count,
            design_workspaces = manifest.design_workspace_count,
            schema_version = %manifest.schema_version,
            tool_version = %manifest.tool_version,
            checksum = checksum_prefix(&manifest.checksum),
            warnings = warnings.len(),
            size_bytes = bytes.len(),
            "Repository package built"
        );

        Ok(ExportedPackage {
            bytes,
            manifest,
            warnings,
        })
    }

    /// Build a package and hand the bytes to `on_chunk`
    ///
    /// The archive is assembled in memory, so `on_chunk` is called exactly
    /// once with `is_final = true`.
    pub fn build_streaming<F>(
        &self,
        source: &RepositoryPackageSource,
        mut on_chunk: F,
    ) -> PackageResult<ExportedPackage>
    where
        F: FnMut(&[u8], bool),
    {
        let exported = self.build(source)?;
        on_chunk(&exported.bytes, true);
        Ok(exported)
    }

    /// Re-encode already validated package data
    ///
    /// Recomputes the counts and checksum from the current documents and
    /// packs without running import validation. Other manifest fields are
    /// kept as they are.
    pub fn encode(&self, data: &PackageData) -> PackageResult<Vec<u8>> {
        self.config.validate()?;

        let mut data = data.clone();
        let bytes = self.pack_data(&mut data)?;

        debug!(
            target: "eapkg::export",
            checksum = checksum_prefix(&data.manifest.checksum),
            size_bytes = bytes.len(),
            "Repository package re-encoded"
        );
        Ok(bytes)
    }

    /// Refresh counts and checksum in `data.manifest`, then pack every document
    fn pack_data(&self, data: &mut PackageData) -> PackageResult<Vec<u8>> {
        ManifestCounts::of(data).apply_to(&mut data.manifest);

        let documents = CanonicalDocuments::from_data(data)?;
        data.manifest.checksum = documents.checksum(self.config.checksum_algorithm);
        let manifest_bytes = canonicalize(&data.manifest)?;

        let mut entries: Vec<(&str, &[u8])> = Vec::with_capacity(paths::CHECKSUM_ORDER.len() + 1);
        entries.push((paths::MANIFEST, manifest_bytes.as_slice()));
        entries.extend(documents.in_checksum_order());

        pack(&entries, self.config.compression_level)
    }
}
