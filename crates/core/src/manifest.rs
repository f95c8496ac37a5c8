//! manifest.json: the package header

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Package header - versions, collection counts and checksum
///
/// The six counts must always equal the lengths of the collections they
/// describe; import rejects a package where any of them disagree.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageManifest {
    /// Archive format version
    pub export_version: u32,

    /// Version of the tool that wrote the package
    pub tool_version: String,

    /// Schema generation of the contents (numeric string)
    #[serde(deserialize_with = "string_or_number")]
    pub schema_version: String,

    /// ISO-8601 export timestamp
    pub export_date: String,

    /// Length of model/elements.json
    pub element_count: u64,

    /// Length of model/relationships.json
    pub relationship_count: u64,

    /// Length of views/diagrams.json
    pub diagram_count: u64,

    /// Length of metadata/baselines.json
    pub baseline_count: u64,

    /// Number of diagrams in views/layouts.json
    pub layout_count: u64,

    /// Length of workspace.designWorkspaces
    pub design_workspace_count: u64,

    /// Lowercase hex SHA-256 over the canonical documents; empty when none was computed
    #[serde(default)]
    pub checksum: String,
}

impl PackageManifest {
    /// Schema version as a number, if it is numeric
    ///
    /// Accepts integer strings ("2") and decimal strings ("2.0"); decimal
    /// values are truncated toward zero.
    pub fn schema_generation(&self) -> Option<u32> {
        normalize_schema_version(&self.schema_version)
    }
}

/// Parse a schema version string into its generation number
pub fn normalize_schema_version(raw: &str) -> Option<u32> {
    let trimmed = raw.trim();
    if let Ok(whole) = trimmed.parse::<u32>() {
        return Some(whole);
    }
    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() && value >= 0.0 && value <= f64::from(u32::MAX) => {
            Some(value.trunc() as u32)
        }
        _ => None,
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(text) => Ok(text),
        Value::Number(number) => Ok(number.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "schemaVersion must be a string or number, got {other}"
        ))),
    }
}
