//! Password-encrypted archive capability
//!
//! Encrypted bundles are produced by a platform backend that this crate only
//! sees through [`ArchiveEncryptor`]. Builds without a backend use
//! [`UnsupportedEncryptor`], which always fails closed.

use std::path::PathBuf;

use crate::error::{LoggerError, Result};

/// Turns a set of files into an encrypted archive
pub trait ArchiveEncryptor: Send + Sync {
    /// Whether this backend can encrypt at all
    fn is_available(&self) -> bool {
        true
    }

    /// Encrypt `files` into one archive decryptable with `password`
    fn encrypt_archive(&self, files: &[PathBuf], password: &str) -> Result<Vec<u8>>;
}

/// Backend for platforms without encrypted archive support
#[derive(Debug, Default, Clone, Copy)]
pub struct UnsupportedEncryptor;

impl ArchiveEncryptor for UnsupportedEncryptor {
    fn is_available(&self) -> bool {
        false
    }

    fn encrypt_archive(&self, _files: &[PathBuf], _password: &str) -> Result<Vec<u8>> {
        Err(LoggerError::UnsupportedFeature)
    }
}
