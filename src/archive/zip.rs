//! Stored-entry ZIP encoder
//!
//! Produces uncompressed archives that any standard ZIP reader can open. The
//! output depends only on the entry names, contents and timestamps, so the same
//! inputs always give byte-identical archives.

use std::collections::HashSet;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::debug;

use super::crc32;
use super::dos_time::DosDateTime;
use super::layout::{CentralDirectoryHeader, EndOfCentralDirectory, LocalFileHeader};
use crate::error::{IoContext, LoggerError, Result};
use crate::logging::file_times::file_timestamp;

/// One entry as recorded in the archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub name: String,
    pub size: u32,
    pub crc32: u32,
    pub modified: DosDateTime,
    /// Byte offset of this entry's local header
    pub local_header_offset: u32,
}

/// Builds an archive in memory, entry by entry
#[derive(Debug, Default)]
pub struct ZipEncoder {
    buffer: Vec<u8>,
    entries: Vec<ArchiveEntry>,
    used_names: HashSet<String>,
}

impl ZipEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entries added so far
    pub fn entries(&self) -> &[ArchiveEntry] {
        &self.entries
    }

    /// Append a local header, the name and the contents
    ///
    /// `index` is the input position of this entry; it disambiguates a name
    /// already used earlier in the same archive.
    pub fn add_entry(
        &mut self,
        name: &str,
        index: usize,
        data: &[u8],
        modified: DosDateTime,
    ) -> Result<&ArchiveEntry> {
        if self.entries.len() >= u16::MAX as usize {
            return Err(too_large("too many entries for a single archive"));
        }

        let name = unique_entry_name(name, index, &mut self.used_names);
        let name_len = u16::try_from(name.len())
            .map_err(|_| too_large("entry name longer than 65535 bytes"))?;
        let size = u32::try_from(data.len())
            .map_err(|_| too_large("entry larger than 4 GiB"))?;
        let local_header_offset = u32::try_from(self.buffer.len())
            .map_err(|_| too_large("archive larger than 4 GiB"))?;

        let entry = ArchiveEntry {
            crc32: crc32::checksum(data),
            name,
            size,
            modified,
            local_header_offset,
        };

        LocalFileHeader {
            dos_time: entry.modified.time,
            dos_date: entry.modified.date,
            crc32: entry.crc32,
            size: entry.size,
            name_len,
        }
        .write_to(&mut self.buffer);
        self.buffer.extend_from_slice(entry.name.as_bytes());
        self.buffer.extend_from_slice(data);

        self.entries.push(entry);
        Ok(&self.entries[self.entries.len() - 1])
    }

    /// Append the central directory and the end record, returning the archive
    pub fn finish(mut self) -> Result<Vec<u8>> {
        let directory_offset = u32::try_from(self.buffer.len())
            .map_err(|_| too_large("archive larger than 4 GiB"))?;

        for entry in &self.entries {
            CentralDirectoryHeader {
                dos_time: entry.modified.time,
                dos_date: entry.modified.date,
                crc32: entry.crc32,
                size: entry.size,
                name_len: entry.name.len() as u16,
                local_header_offset: entry.local_header_offset,
            }
            .write_to(&mut self.buffer);
            self.buffer.extend_from_slice(entry.name.as_bytes());
        }

        let directory_size = u32::try_from(self.buffer.len() - directory_offset as usize)
            .map_err(|_| too_large("central directory larger than 4 GiB"))?;
        u32::try_from(self.buffer.len() + EndOfCentralDirectory::SIZE)
            .map_err(|_| too_large("archive larger than 4 GiB"))?;

        EndOfCentralDirectory {
            entry_count: self.entries.len() as u16,
            directory_size,
            directory_offset,
        }
        .write_to(&mut self.buffer);

        Ok(self.buffer)
    }
}

fn too_large(message: &str) -> LoggerError {
    LoggerError::io(
        "Failed to encode archive",
        io::Error::new(io::ErrorKind::InvalidInput, message.to_string()),
    )
}

/// Reserve a name unique within one archive
///
/// A repeated name gets `-{index}` inserted before its extension.
pub fn unique_entry_name(name: &str, index: usize, used: &mut HashSet<String>) -> String {
    let mut candidate = name.to_string();
    while used.contains(&candidate) {
        let path = Path::new(&candidate);
        candidate = match (
            path.file_stem().and_then(|s| s.to_str()),
            path.extension().and_then(|e| e.to_str()),
        ) {
            (Some(stem), Some(ext)) => format!("{}-{}.{}", stem, index, ext),
            _ => format!("{}-{}", candidate, index),
        };
    }
    used.insert(candidate.clone());
    candidate
}

/// Encode files in the given order, reading each one whole
///
/// Entry names are the files' final path components. A file whose timestamp
/// cannot be read is stamped with the DOS epoch.
pub fn encode_files(files: &[PathBuf]) -> Result<Vec<u8>> {
    let mut encoder = ZipEncoder::new();

    for (index, path) in files.iter().enumerate() {
        let data = fs::read(path)
            .with_io_context(|| format!("Failed to read {}", path.display()))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| format!("entry-{}", index));
        let modified = file_timestamp(path)
            .map(DosDateTime::from_system_time)
            .unwrap_or(DosDateTime::EPOCH);

        encoder.add_entry(&name, index, &data, modified)?;
    }

    encoder.finish()
}

/// Encode `files` and atomically publish the archive at `destination`
///
/// The archive is written to a temporary file beside the destination and only
/// renamed into place once complete; an existing file at `destination` is
/// replaced.
pub fn write_archive(destination: &Path, files: &[PathBuf]) -> Result<()> {
    let archive = encode_files(files)?;
    publish_atomically(destination, &archive)?;

    debug!(
        path = %destination.display(),
        entries = files.len(),
        bytes = archive.len(),
        "Wrote archive"
    );
    Ok(())
}

/// Write `bytes` to a temporary file beside `destination`, then rename it into place
pub fn publish_atomically(destination: &Path, bytes: &[u8]) -> Result<()> {
    let parent = match destination.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&parent).io_context("Failed to create export directory")?;

    let mut temp = NamedTempFile::new_in(&parent).io_context("Failed to create temporary file")?;
    temp.write_all(bytes)
        .io_context("Failed to write temporary file")?;
    temp.as_file()
        .sync_all()
        .io_context("Failed to sync temporary file")?;
    temp.persist(destination)
        .map_err(|e| e.error)
        .with_io_context(|| format!("Failed to publish {}", destination.display()))?;
    Ok(())
}
