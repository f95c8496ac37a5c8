//! Error types for the record model

use thiserror::Error;

/// Failures of the canonical JSON encoder
///
/// These never come from user data quality; they indicate a value that
/// cannot be represented as JSON at all (e.g. a map with non-string keys)
/// or an encoder bug.
#[derive(Debug, Error)]
pub enum CanonicalError {
    /// Value could not be converted to JSON
    #[error("canonical encode failed: {0}")]
    Encode(#[source] serde_json::Error),

    /// Encoded text did not parse back as JSON
    #[error("canonical output is not valid JSON: {0}")]
    NotReparseable(String),
}

/// Result type for canonical encoding
pub type CanonicalResult<T> = Result<T, CanonicalError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CanonicalError::NotReparseable("trailing characters".to_string());
        assert!(err.to_string().contains("trailing characters"));
        assert!(err.to_string().contains("not valid JSON"));
    }
}
