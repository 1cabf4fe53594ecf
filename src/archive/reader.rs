//! Reader for stored-entry archives
//!
//! Walks the central directory from the end record, follows every offset back
//! to its local header and checks sizes, names and CRCs along the way.

use super::crc32;
use super::dos_time::DosDateTime;
use super::layout::{
    CentralDirectoryHeader, EndOfCentralDirectory, FieldReader, LocalFileHeader,
    END_OF_CENTRAL_DIRECTORY_SIGNATURE,
};
use crate::error::{LoggerError, Result};

/// An entry read back from an archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedEntry {
    pub name: String,
    pub data: Vec<u8>,
    pub crc32: u32,
    pub modified: DosDateTime,
}

/// Decode and verify an archive produced by the encoder
pub fn read_archive(archive: &[u8]) -> Result<Vec<DecodedEntry>> {
    let end_at = find_end_record(archive)?;
    let end = EndOfCentralDirectory::read_from(&mut FieldReader::at(archive, end_at))?;

    let directory_start = end.directory_offset as usize;
    let directory_end = directory_start + end.directory_size as usize;
    if directory_end != end_at {
        return Err(malformed(format!(
            "central directory ends at {} but end record starts at {}",
            directory_end, end_at
        )));
    }

    let mut directory = FieldReader::at(archive, directory_start);
    let mut entries = Vec::with_capacity(end.entry_count as usize);

    for _ in 0..end.entry_count {
        let (header, skip) = CentralDirectoryHeader::read_from(&mut directory)?;
        let name = directory.bytes(header.name_len as usize)?;
        directory.bytes(skip)?;
        entries.push(read_entry(archive, &header, name)?);
    }

    if directory.position() != directory_end {
        return Err(malformed(format!(
            "central directory size {} does not match its {} records",
            end.directory_size, end.entry_count
        )));
    }

    Ok(entries)
}

fn read_entry(
    archive: &[u8],
    central: &CentralDirectoryHeader,
    central_name: &[u8],
) -> Result<DecodedEntry> {
    let mut local = FieldReader::at(archive, central.local_header_offset as usize);
    let (header, extra_len) = LocalFileHeader::read_from(&mut local)?;

    let name = local.bytes(header.name_len as usize)?;
    if name != central_name {
        return Err(malformed(format!(
            "local header at {} names a different entry",
            central.local_header_offset
        )));
    }
    local.bytes(extra_len as usize)?;

    if header.size != central.size || header.crc32 != central.crc32 {
        return Err(malformed(format!(
            "local and central records disagree for entry at {}",
            central.local_header_offset
        )));
    }

    let data = local.bytes(header.size as usize)?.to_vec();
    let actual = crc32::checksum(&data);
    if actual != header.crc32 {
        return Err(malformed(format!(
            "CRC mismatch for entry at {}: stored {:#010x}, computed {:#010x}",
            central.local_header_offset, header.crc32, actual
        )));
    }

    let name = String::from_utf8(name.to_vec())
        .map_err(|_| malformed("entry name is not valid UTF-8".to_string()))?;

    Ok(DecodedEntry {
        name,
        data,
        crc32: actual,
        modified: DosDateTime {
            date: header.dos_date,
            time: header.dos_time,
        },
    })
}

/// Offset of the end record, searching backwards past any archive comment
fn find_end_record(archive: &[u8]) -> Result<usize> {
    if archive.len() < EndOfCentralDirectory::SIZE {
        return Err(malformed("archive shorter than its end record".to_string()));
    }

    let signature = END_OF_CENTRAL_DIRECTORY_SIGNATURE.to_le_bytes();
    let last = archive.len() - EndOfCentralDirectory::SIZE;
    let first = last.saturating_sub(u16::MAX as usize);

    (first..=last)
        .rev()
        .find(|&pos| archive[pos..pos + 4] == signature)
        .ok_or_else(|| malformed("end of central directory record not found".to_string()))
}

fn malformed(message: String) -> LoggerError {
    LoggerError::MalformedArchive(message)
}
