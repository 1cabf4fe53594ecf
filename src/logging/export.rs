//! Export of selected log files into bundles

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use super::selection::DateInterval;
use crate::archive::zip::unique_entry_name;
use crate::archive::{publish_atomically, write_archive, ArchiveEncryptor};
use crate::error::{IoContext, LoggerError, Result};

/// Extension of plain export bundles
pub const PLAIN_EXPORT_EXTENSION: &str = "zip";
/// Extension of encrypted export bundles
pub const ENCRYPTED_EXPORT_EXTENSION: &str = "aea";

/// Bundle file name: `{prefix}-{startEpochSecs}-{endEpochSecs}.{extension}`
pub fn export_file_name(prefix: &str, interval: &DateInterval, extension: &str) -> String {
    format!(
        "{}-{}-{}.{}",
        prefix,
        interval.start.timestamp(),
        interval.end.timestamp(),
        extension
    )
}

/// Write `files` as a plain archive into `export_dir`, replacing any previous bundle
pub fn export_plain(
    files: &[PathBuf],
    interval: &DateInterval,
    prefix: &str,
    export_dir: &Path,
) -> Result<PathBuf> {
    let destination = export_dir.join(export_file_name(prefix, interval, PLAIN_EXPORT_EXTENSION));
    write_archive(&destination, files)?;

    info!(path = %destination.display(), files = files.len(), "Exported logs");
    Ok(destination)
}

/// Stage copies of `files` and hand them to `encryptor`
///
/// The staging directory is removed on every exit path. The encrypted bytes
/// replace any previous bundle at the same name.
pub fn export_encrypted(
    files: &[PathBuf],
    interval: &DateInterval,
    prefix: &str,
    export_dir: &Path,
    password: &str,
    encryptor: &dyn ArchiveEncryptor,
) -> Result<PathBuf> {
    if password.is_empty() {
        return Err(LoggerError::InvalidPassword);
    }
    if !encryptor.is_available() {
        return Err(LoggerError::UnsupportedFeature);
    }

    let staging = tempfile::Builder::new()
        .prefix(&format!("{}-staging-", prefix))
        .tempdir()
        .io_context("Failed to create staging directory")?;

    let mut used = HashSet::new();
    let mut staged = Vec::with_capacity(files.len());
    for (index, file) in files.iter().enumerate() {
        let name = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| format!("entry-{}", index));
        let target = staging.path().join(unique_entry_name(&name, index, &mut used));
        fs::copy(file, &target)
            .with_io_context(|| format!("Failed to stage {}", file.display()))?;
        staged.push(target);
    }

    let encrypted = encryptor.encrypt_archive(&staged, password)?;

    let destination =
        export_dir.join(export_file_name(prefix, interval, ENCRYPTED_EXPORT_EXTENSION));
    publish_atomically(&destination, &encrypted)?;

    info!(
        path = %destination.display(),
        files = files.len(),
        "Exported encrypted logs"
    );
    Ok(destination)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::{read_archive, UnsupportedEncryptor};
    use chrono::{TimeZone, Utc};
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Records what it was asked to encrypt and returns the staged contents
    #[derive(Default)]
    struct RecordingEncryptor {
        staged: Mutex<Vec<(PathBuf, Vec<u8>)>>,
    }

    impl ArchiveEncryptor for RecordingEncryptor {
        fn encrypt_archive(&self, files: &[PathBuf], password: &str) -> Result<Vec<u8>> {
            let mut out = password.as_bytes().to_vec();
            for file in files {
                let data = fs::read(file).unwrap();
                out.extend_from_slice(&data);
                self.staged.lock().unwrap().push((file.clone(), data));
            }
            Ok(out)
        }
    }

    fn interval() -> DateInterval {
        DateInterval::new(
            Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
            Utc.timestamp_opt(1_700_003_600, 0).unwrap(),
        )
    }

    #[test]
    fn test_export_file_name() {
        assert_eq!(
            export_file_name("app", &interval(), PLAIN_EXPORT_EXTENSION),
            "app-1700000000-1700003600.zip"
        );
        assert_eq!(
            export_file_name("app", &interval(), ENCRYPTED_EXPORT_EXTENSION),
            "app-1700000000-1700003600.aea"
        );
    }

    #[test]
    fn test_export_plain_writes_named_archive() {
        let temp_dir = TempDir::new().unwrap();
        let log = temp_dir.path().join("app-1.log");
        fs::write(&log, b"line\n").unwrap();
        let export_dir = temp_dir.path().join("exports");

        let path = export_plain(&[log], &interval(), "app", &export_dir).unwrap();
        assert_eq!(path, export_dir.join("app-1700000000-1700003600.zip"));

        let entries = read_archive(&fs::read(&path).unwrap()).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "app-1.log");
        assert_eq!(entries[0].data, b"line\n");
    }

    #[test]
    fn test_encrypted_rejects_empty_password() {
        let temp_dir = TempDir::new().unwrap();
        let err = export_encrypted(
            &[temp_dir.path().join("missing.log")],
            &interval(),
            "app",
            temp_dir.path(),
            "",
            &RecordingEncryptor::default(),
        )
        .unwrap_err();
        assert!(matches!(err, LoggerError::InvalidPassword));
    }

    #[test]
    fn test_encrypted_unsupported_fails_closed() {
        let temp_dir = TempDir::new().unwrap();
        let log = temp_dir.path().join("app-1.log");
        fs::write(&log, b"line\n").unwrap();

        let err = export_encrypted(
            &[log],
            &interval(),
            "app",
            temp_dir.path(),
            "secret",
            &UnsupportedEncryptor,
        )
        .unwrap_err();
        assert!(matches!(err, LoggerError::UnsupportedFeature));
        assert!(!temp_dir.path().join("app-1700000000-1700003600.aea").exists());
    }

    #[test]
    fn test_encrypted_stages_copies_and_cleans_up() {
        let temp_dir = TempDir::new().unwrap();
        let sub = temp_dir.path().join("sub");
        fs::create_dir(&sub).unwrap();
        let first = temp_dir.path().join("app-1.log");
        let second = sub.join("app-1.log");
        fs::write(&first, b"one\n").unwrap();
        fs::write(&second, b"two\n").unwrap();
        let export_dir = temp_dir.path().join("exports");
        fs::create_dir(&export_dir).unwrap();
        let stale = export_dir.join("app-1700000000-1700003600.aea");
        fs::write(&stale, b"stale").unwrap();

        let encryptor = RecordingEncryptor::default();
        let path = export_encrypted(
            &[first.clone(), second.clone()],
            &interval(),
            "app",
            &export_dir,
            "pw",
            &encryptor,
        )
        .unwrap();

        assert_eq!(path, stale);
        assert_eq!(fs::read(&path).unwrap(), b"pwone\ntwo\n");

        let staged = encryptor.staged.lock().unwrap();
        let names: Vec<_> = staged
            .iter()
            .map(|(p, _)| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, ["app-1.log", "app-1-1.log"]);
        // staging directory is gone, sources untouched
        assert!(!staged[0].0.parent().unwrap().exists());
        assert!(first.exists() && second.exists());
    }
}
