//! Archive bundling for log export
//!
//! A minimal stored-only ZIP encoder built from fixed-layout records, a
//! matching reader for verification, and the seam for encrypted bundles.

pub mod crc32;
pub mod dos_time;
pub mod encrypted;
pub mod layout;
pub mod reader;
pub mod zip;

pub use dos_time::DosDateTime;
pub use encrypted::{ArchiveEncryptor, UnsupportedEncryptor};
pub use reader::{read_archive, DecodedEntry};
pub use zip::{encode_files, publish_atomically, write_archive, ArchiveEntry, ZipEncoder};
