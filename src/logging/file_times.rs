//! Timestamp discovery for log files

use std::fs::Metadata;
use std::path::Path;
use std::time::SystemTime;

/// Modification time of a file, falling back to its creation time
///
/// Returns `None` when neither is available (including when the file is gone).
/// Retention and selection both skip such files.
pub fn file_timestamp(path: &Path) -> Option<SystemTime> {
    let metadata = std::fs::metadata(path).ok()?;
    metadata_timestamp(&metadata)
}

/// Same as [`file_timestamp`] for already-fetched metadata
pub fn metadata_timestamp(metadata: &Metadata) -> Option<SystemTime> {
    metadata.modified().or_else(|_| metadata.created()).ok()
}
