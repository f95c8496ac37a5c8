//! Package archive writer
//!
//! Packs named documents into a deflate-compressed zip container and
//! defines how extracted entry names are normalised.

use std::collections::BTreeMap;
use std::io::{Cursor, Write};

use zip::write::FileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

use crate::error::{PackageError, PackageResult};
use crate::types::ZIP_MAGIC;

/// Extracted archive contents: normalised path -> bytes
pub type ArchiveEntries = BTreeMap<String, Vec<u8>>;

/// Pack `(path, bytes)` entries into zip bytes, in the given order
///
/// Every entry uses the same deflate level and a fixed timestamp, so the
/// same input always yields the same bytes.
pub fn pack(entries: &[(&str, &[u8])], compression_level: i32) -> PackageResult<Vec<u8>> {
    let options = FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .compression_level(Some(compression_level))
        .last_modified_time(DateTime::default())
        .unix_permissions(0o644);

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut zip = ZipWriter::new(&mut cursor);
        for (path, data) in entries {
            zip.start_file(*path, options)
                .map_err(|e| PackageError::archive(format!("add '{}': {}", path, e)))?;
            zip.write_all(data)
                .map_err(|e| PackageError::archive(format!("write '{}': {}", path, e)))?;
        }
        zip.finish()
            .map_err(|e| PackageError::archive(format!("zip finish: {}", e)))?;
    }

    let bytes = cursor.into_inner();
    if !has_zip_magic(&bytes) {
        return Err(PackageError::invariant(format!(
            "packed archive starts with {} instead of the zip local file header",
            hex_prefix(&bytes)
        )));
    }
    Ok(bytes)
}

/// True if `bytes` starts with the zip local-file-header signature
pub fn has_zip_magic(bytes: &[u8]) -> bool {
    bytes.len() >= ZIP_MAGIC.len() && bytes[..ZIP_MAGIC.len()] == ZIP_MAGIC
}

/// Space-separated uppercase hex of the first four bytes
pub fn hex_prefix(bytes: &[u8]) -> String {
    let shown: Vec<String> = bytes.iter().take(4).map(|b| format!("{b:02X}")).collect();
    if shown.is_empty() {
        "<no bytes>".to_string()
    } else {
        shown.join(" ")
    }
}

/// Normalise an entry name: backslashes become slashes, leading slashes go
pub fn normalize_entry_path(raw: &str) -> String {
    raw.replace('\\', "/").trim_start_matches('/').to_string()
}

/// Add an extracted entry unless it is a directory or empty
pub(crate) fn insert_entry(entries: &mut ArchiveEntries, raw_name: &str, is_dir: bool, data: Vec<u8>) {
    let path = normalize_entry_path(raw_name);
    if is_dir || path.is_empty() || path.ends_with('/') || data.is_empty() {
        return;
    }
    entries.insert(path, data);
}
