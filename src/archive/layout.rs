//! Fixed-layout archive records
//!
//! Each record knows its exact byte size and writes/reads its fields as
//! little-endian integers in declaration order. Variable-length names follow
//! the fixed part and are handled by the caller.

use crate::error::{LoggerError, Result};

pub const LOCAL_HEADER_SIGNATURE: u32 = 0x0403_4b50;
pub const CENTRAL_HEADER_SIGNATURE: u32 = 0x0201_4b50;
pub const END_OF_CENTRAL_DIRECTORY_SIGNATURE: u32 = 0x0605_4b50;

/// Version 2.0: the minimum for stored entries
pub const VERSION: u16 = 20;
/// Compression method "stored"
pub const METHOD_STORED: u16 = 0;

/// Little-endian field writer over a growable buffer
pub struct FieldWriter<'a> {
    out: &'a mut Vec<u8>,
}

impl<'a> FieldWriter<'a> {
    pub fn new(out: &'a mut Vec<u8>) -> Self {
        Self { out }
    }

    pub fn u16(&mut self, value: u16) -> &mut Self {
        self.out.extend_from_slice(&value.to_le_bytes());
        self
    }

    pub fn u32(&mut self, value: u32) -> &mut Self {
        self.out.extend_from_slice(&value.to_le_bytes());
        self
    }

    pub fn bytes(&mut self, value: &[u8]) -> &mut Self {
        self.out.extend_from_slice(value);
        self
    }
}

/// Little-endian field reader with bounds checks
pub struct FieldReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> FieldReader<'a> {
    pub fn at(data: &'a [u8], pos: usize) -> Self {
        Self { data, pos }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.data.len())
            .ok_or_else(|| {
                LoggerError::MalformedArchive(format!(
                    "record at offset {} runs past end of data",
                    self.pos
                ))
            })?;
        let slice = &self.data[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    pub fn u16(&mut self) -> Result<u16> {
        let b = self.bytes(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    pub fn u32(&mut self) -> Result<u32> {
        let b = self.bytes(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn signature(&mut self, expected: u32, record: &str) -> Result<()> {
        let start = self.pos;
        let found = self.u32()?;
        if found != expected {
            return Err(LoggerError::MalformedArchive(format!(
                "expected {} signature at offset {}, found {:#010x}",
                record, start, found
            )));
        }
        Ok(())
    }
}

/// Header written immediately before each entry's name and contents
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalFileHeader {
    pub dos_time: u16,
    pub dos_date: u16,
    pub crc32: u32,
    pub size: u32,
    pub name_len: u16,
}

impl LocalFileHeader {
    pub const SIZE: usize = 30;

    pub fn write_to(&self, out: &mut Vec<u8>) {
        FieldWriter::new(out)
            .u32(LOCAL_HEADER_SIGNATURE)
            .u16(VERSION)
            .u16(0) // flags
            .u16(METHOD_STORED)
            .u16(self.dos_time)
            .u16(self.dos_date)
            .u32(self.crc32)
            .u32(self.size) // compressed
            .u32(self.size) // uncompressed
            .u16(self.name_len)
            .u16(0); // extra
    }

    /// Parse the fixed part; returns the header and the extra field length
    pub fn read_from(reader: &mut FieldReader<'_>) -> Result<(Self, u16)> {
        reader.signature(LOCAL_HEADER_SIGNATURE, "local header")?;
        let _version = reader.u16()?;
        let _flags = reader.u16()?;
        let method = reader.u16()?;
        if method != METHOD_STORED {
            return Err(LoggerError::MalformedArchive(format!(
                "unsupported compression method {}",
                method
            )));
        }
        let dos_time = reader.u16()?;
        let dos_date = reader.u16()?;
        let crc32 = reader.u32()?;
        let compressed = reader.u32()?;
        let size = reader.u32()?;
        if compressed != size {
            return Err(LoggerError::MalformedArchive(
                "stored entry sizes disagree".to_string(),
            ));
        }
        let name_len = reader.u16()?;
        let extra_len = reader.u16()?;
        Ok((
            Self {
                dos_time,
                dos_date,
                crc32,
                size,
                name_len,
            },
            extra_len,
        ))
    }
}

/// Central directory record pointing back at a local header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CentralDirectoryHeader {
    pub dos_time: u16,
    pub dos_date: u16,
    pub crc32: u32,
    pub size: u32,
    pub name_len: u16,
    pub local_header_offset: u32,
}

impl CentralDirectoryHeader {
    pub const SIZE: usize = 46;

    pub fn write_to(&self, out: &mut Vec<u8>) {
        FieldWriter::new(out)
            .u32(CENTRAL_HEADER_SIGNATURE)
            .u16(VERSION) // made by
            .u16(VERSION) // needed to extract
            .u16(0) // flags
            .u16(METHOD_STORED)
            .u16(self.dos_time)
            .u16(self.dos_date)
            .u32(self.crc32)
            .u32(self.size)
            .u32(self.size)
            .u16(self.name_len)
            .u16(0) // extra
            .u16(0) // comment
            .u16(0) // disk number start
            .u16(0) // internal attributes
            .u32(0) // external attributes
            .u32(self.local_header_offset);
    }

    /// Parse the fixed part; returns the header and the extra + comment length
    pub fn read_from(reader: &mut FieldReader<'_>) -> Result<(Self, usize)> {
        reader.signature(CENTRAL_HEADER_SIGNATURE, "central directory")?;
        let _made_by = reader.u16()?;
        let _needed = reader.u16()?;
        let _flags = reader.u16()?;
        let _method = reader.u16()?;
        let dos_time = reader.u16()?;
        let dos_date = reader.u16()?;
        let crc32 = reader.u32()?;
        let _compressed = reader.u32()?;
        let size = reader.u32()?;
        let name_len = reader.u16()?;
        let extra_len = reader.u16()?;
        let comment_len = reader.u16()?;
        let _disk = reader.u16()?;
        let _internal = reader.u16()?;
        let _external = reader.u32()?;
        let local_header_offset = reader.u32()?;
        Ok((
            Self {
                dos_time,
                dos_date,
                crc32,
                size,
                name_len,
                local_header_offset,
            },
            extra_len as usize + comment_len as usize,
        ))
    }
}

/// Trailing summary record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndOfCentralDirectory {
    pub entry_count: u16,
    pub directory_size: u32,
    pub directory_offset: u32,
}

impl EndOfCentralDirectory {
    pub const SIZE: usize = 22;

    pub fn write_to(&self, out: &mut Vec<u8>) {
        FieldWriter::new(out)
            .u32(END_OF_CENTRAL_DIRECTORY_SIGNATURE)
            .u16(0) // this disk
            .u16(0) // disk with central directory
            .u16(self.entry_count) // entries on this disk
            .u16(self.entry_count) // entries total
            .u32(self.directory_size)
            .u32(self.directory_offset)
            .u16(0); // comment
    }

    pub fn read_from(reader: &mut FieldReader<'_>) -> Result<Self> {
        reader.signature(END_OF_CENTRAL_DIRECTORY_SIGNATURE, "end of central directory")?;
        let disk = reader.u16()?;
        let directory_disk = reader.u16()?;
        let entries_on_disk = reader.u16()?;
        let entry_count = reader.u16()?;
        if disk != 0 || directory_disk != 0 || entries_on_disk != entry_count {
            return Err(LoggerError::MalformedArchive(
                "multi-volume archives are not supported".to_string(),
            ));
        }
        let directory_size = reader.u32()?;
        let directory_offset = reader.u32()?;
        let _comment_len = reader.u16()?;
        Ok(Self {
            entry_count,
            directory_size,
            directory_offset,
        })
    }
}
