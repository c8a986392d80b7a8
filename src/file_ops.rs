//! File encryption/decryption operations
//!
//! This module provides high-level file operations for encrypting and
//! decrypting files into and out of the lockbox container format, plus the
//! default naming convention for output files.

use crate::container::Container;
use crate::error::{ErrorCategory, ErrorKind, LockboxError, Result};
use crate::filecipher;
use crate::kdf::SaltedKey;
use crate::passphrase::PassphraseReader;
use std::ffi::OsString;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Suffix appended to a file name on encryption
pub const ENCRYPTED_SUFFIX: &str = ".encrypted";

/// Replaces [`ENCRYPTED_SUFFIX`] in a file name on decryption
pub const DECRYPTED_SUFFIX: &str = ".decrypted";

/// Encrypt a file with a passphrase
///
/// Reads plaintext from `input_path`, encrypts it using a passphrase from
/// `passphrase_reader`, and writes the container to `output_path`.
///
/// The passphrase is dropped as soon as the key has been derived. The
/// output is written atomically with mode 0o600 on Unix systems.
pub fn encrypt_file(
    input_path: &Path,
    output_path: &Path,
    passphrase_reader: &mut dyn PassphraseReader,
) -> Result<()> {
    let plaintext = fs::read(input_path).map_err(|e| LockboxError::from_io("read", input_path, e))?;
    debug!(path = %input_path.display(), len = plaintext.len(), "read plaintext");

    let key = {
        let passphrase = passphrase_reader.read_passphrase()?;
        SaltedKey::generate(&passphrase).map_err(|e| e.with_context("encryption failed"))?
    };
    let container =
        filecipher::seal(&key, &plaintext).map_err(|e| e.with_context("encryption failed"))?;
    drop(key);

    write_file_atomic(output_path, &container)
        .map_err(|e| e.with_context(format!("failed to write to {}", output_path.display())))?;
    debug!(path = %output_path.display(), len = container.len(), "wrote container");
    Ok(())
}

/// Decrypt a file with a passphrase
///
/// Reads a container from `input_path`, decrypts it using a passphrase from
/// `passphrase_reader`, and writes the plaintext to `output_path`.
///
/// The container structure is checked before the passphrase is requested,
/// and nothing is written unless the padding check succeeds. The output is
/// written atomically with mode 0o600 on Unix systems.
pub fn decrypt_file(
    input_path: &Path,
    output_path: &Path,
    passphrase_reader: &mut dyn PassphraseReader,
) -> Result<()> {
    let bytes = fs::read(input_path).map_err(|e| LockboxError::from_io("read", input_path, e))?;
    debug!(path = %input_path.display(), len = bytes.len(), "read container");
    let container = Container::parse(&bytes).map_err(|e| e.with_context("failed to decrypt"))?;

    let key = {
        let passphrase = passphrase_reader.read_passphrase()?;
        SaltedKey::derive(&passphrase, container.salt())
    };
    let plaintext =
        filecipher::open(&key, &container).map_err(|e| e.with_context("failed to decrypt"))?;
    drop(key);

    write_file_atomic(output_path, &plaintext)
        .map_err(|e| e.with_context(format!("failed to write to {}", output_path.display())))?;
    debug!(path = %output_path.display(), len = plaintext.len(), "wrote plaintext");
    Ok(())
}

/// Default output path for encrypting `path`: the path with `.encrypted`
/// appended.
pub fn encrypted_path_for(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(ENCRYPTED_SUFFIX);
    PathBuf::from(name)
}

/// Default output path for decrypting `path`.
///
/// The first `.encrypted` in the file name is replaced with `.decrypted`.
/// Only the final path component is searched: unlike a plain replacement on
/// the whole path string, a `.encrypted` in a directory name is left alone.
/// If the file name has no `.encrypted` (or is not UTF-8), `.decrypted` is
/// appended instead so the output never coincides with the input.
pub fn decrypted_path_for(path: &Path) -> PathBuf {
    if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
        if name.contains(ENCRYPTED_SUFFIX) {
            return path.with_file_name(name.replacen(ENCRYPTED_SUFFIX, DECRYPTED_SUFFIX, 1));
        }
    }
    let mut name = OsString::from(path.as_os_str());
    name.push(DECRYPTED_SUFFIX);
    PathBuf::from(name)
}

/// Write `contents` to `path` atomically (tempfile + fsync + rename)
///
/// Either the previous file or the complete new one exists afterwards,
/// never a partial file. The result has mode 0o600 on Unix systems.
fn write_file_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut temp_file = tempfile::NamedTempFile::new_in(dir)
        .map_err(|e| LockboxError::from_io("create tempfile in", dir, e))?;

    temp_file.write_all(contents).map_err(|e| {
        LockboxError::with_kind_and_source(
            ErrorCategory::Internal,
            ErrorKind::Io,
            "failed to write to tempfile",
            e,
        )
    })?;
    // Flush and fsync() such that the rename later, if it succeeds, will
    // always point to a valid file.
    temp_file.flush().map_err(|e| {
        LockboxError::with_kind_and_source(
            ErrorCategory::Internal,
            ErrorKind::Io,
            "failed to flush tempfile",
            e,
        )
    })?;
    temp_file.as_file().sync_all().map_err(|e| {
        LockboxError::with_kind_and_source(
            ErrorCategory::Internal,
            ErrorKind::Io,
            "failed to sync file prior to rename",
            e,
        )
    })?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        temp_file
            .as_file()
            .set_permissions(fs::Permissions::from_mode(0o600))
            .map_err(|e| {
                LockboxError::with_kind_and_source(
                    ErrorCategory::Internal,
                    ErrorKind::Io,
                    "failed to set tempfile permissions",
                    e,
                )
            })?;
    }

    temp_file
        .persist(path)
        .map_err(|e| LockboxError::from_io("rename tempfile to", path, e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::HEADER_LEN;
    use crate::error::ErrorKind;
    use crate::passphrase::ConstantPassphraseReader;
    use std::fs;
    use tempfile::TempDir;

    #[cfg(unix)]
    use std::os::unix::fs::PermissionsExt;

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let plain_path = temp_dir.path().join("plain.txt");
        let crypt_path = temp_dir.path().join("plain.txt.encrypted");
        let decrypted_path = temp_dir.path().join("plain.txt.decrypted");

        let plaintext = b"Hello, lockbox!";
        fs::write(&plain_path, plaintext).unwrap();

        let mut reader = ConstantPassphraseReader::new(b"test password".to_vec());
        encrypt_file(&plain_path, &crypt_path, &mut reader).unwrap();
        assert_eq!(fs::read(&crypt_path).unwrap().len(), HEADER_LEN + 16);

        let mut reader = ConstantPassphraseReader::new(b"test password".to_vec());
        decrypt_file(&crypt_path, &decrypted_path, &mut reader).unwrap();
        assert_eq!(fs::read(&decrypted_path).unwrap(), plaintext);

        // The source file is left untouched.
        assert_eq!(fs::read(&plain_path).unwrap(), plaintext);
    }

    #[test]
    #[cfg(unix)]
    fn test_file_permissions() {
        let temp_dir = TempDir::new().unwrap();
        let plain_path = temp_dir.path().join("plain.txt");
        let crypt_path = temp_dir.path().join("plain.txt.encrypted");

        fs::write(&plain_path, b"test").unwrap();

        let mut reader = ConstantPassphraseReader::new(b"test".to_vec());
        encrypt_file(&plain_path, &crypt_path, &mut reader).unwrap();

        let metadata = fs::metadata(&crypt_path).unwrap();
        assert_eq!(metadata.permissions().mode() & 0o777, 0o600);
    }

    #[test]
    fn test_decrypt_wrong_passphrase_writes_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let plain_path = temp_dir.path().join("plain.txt");
        let crypt_path = temp_dir.path().join("plain.txt.encrypted");
        let decrypted_path = temp_dir.path().join("plain.txt.decrypted");

        fs::write(&plain_path, b"secret").unwrap();

        let mut reader = ConstantPassphraseReader::new(b"correct".to_vec());
        encrypt_file(&plain_path, &crypt_path, &mut reader).unwrap();

        let mut reader = ConstantPassphraseReader::new(b"wrong".to_vec());
        match decrypt_file(&crypt_path, &decrypted_path, &mut reader) {
            Err(e) => {
                assert_eq!(e.kind, Some(ErrorKind::InvalidPadding));
                assert!(!decrypted_path.exists());
            }
            // Rare false accept of the padding check.
            Ok(()) => assert_ne!(fs::read(&decrypted_path).unwrap(), b"secret"),
        }
    }

    #[test]
    fn test_missing_input() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("missing.txt");
        let output = temp_dir.path().join("missing.txt.encrypted");

        let mut reader = ConstantPassphraseReader::new(b"test".to_vec());
        let err = encrypt_file(&missing, &output, &mut reader).expect_err("expected not found");
        assert_eq!(err.kind, Some(ErrorKind::FileNotFound));
        assert_eq!(err.category, ErrorCategory::User);
        assert!(!output.exists());
    }

    #[test]
    #[cfg(unix)]
    fn test_unreadable_input() {
        let temp_dir = TempDir::new().unwrap();
        let plain_path = temp_dir.path().join("locked.txt");
        let output = temp_dir.path().join("locked.txt.encrypted");
        fs::write(&plain_path, b"secret").unwrap();
        fs::set_permissions(&plain_path, fs::Permissions::from_mode(0o000)).unwrap();

        // Privileged users bypass file modes; nothing to check then.
        if fs::read(&plain_path).is_ok() {
            return;
        }

        let mut reader = ConstantPassphraseReader::new(b"test".to_vec());
        let err = encrypt_file(&plain_path, &output, &mut reader)
            .expect_err("expected permission denied");
        assert_eq!(err.kind, Some(ErrorKind::PermissionDenied));
        assert_eq!(err.category, ErrorCategory::User);
        assert!(!output.exists());
    }

    #[test]
    fn test_malformed_container_file() {
        let temp_dir = TempDir::new().unwrap();
        let crypt_path = temp_dir.path().join("short.encrypted");
        let output = temp_dir.path().join("short.decrypted");
        fs::write(&crypt_path, [0u8; 20]).unwrap();

        struct PanickingReader;
        impl PassphraseReader for PanickingReader {
            fn read_passphrase(&mut self) -> Result<zeroize::Zeroizing<Vec<u8>>> {
                panic!("passphrase must not be requested for a malformed container");
            }
        }

        let err = decrypt_file(&crypt_path, &output, &mut PanickingReader)
            .expect_err("expected malformed container");
        assert_eq!(err.kind, Some(ErrorKind::MalformedContainer));
        assert!(!output.exists());
    }

    #[test]
    fn test_output_into_missing_directory() {
        let temp_dir = TempDir::new().unwrap();
        let plain_path = temp_dir.path().join("plain.txt");
        let output = temp_dir.path().join("nope").join("plain.txt.encrypted");
        fs::write(&plain_path, b"x").unwrap();

        let mut reader = ConstantPassphraseReader::new(b"test".to_vec());
        let err = encrypt_file(&plain_path, &output, &mut reader).expect_err("expected io error");
        assert_eq!(err.kind, Some(ErrorKind::FileNotFound));
    }

    #[test]
    fn test_empty_file() {
        let temp_dir = TempDir::new().unwrap();
        let plain_path = temp_dir.path().join("empty.txt");
        let crypt_path = temp_dir.path().join("empty.txt.encrypted");
        let decrypted_path = temp_dir.path().join("empty.txt.decrypted");

        fs::write(&plain_path, b"").unwrap();

        let mut reader = ConstantPassphraseReader::new(b"test".to_vec());
        encrypt_file(&plain_path, &crypt_path, &mut reader).unwrap();

        let mut reader = ConstantPassphraseReader::new(b"test".to_vec());
        decrypt_file(&crypt_path, &decrypted_path, &mut reader).unwrap();

        assert_eq!(fs::read(&decrypted_path).unwrap(), b"");
    }

    #[test]
    fn test_encrypted_path_for() {
        assert_eq!(
            encrypted_path_for(Path::new("/tmp/report.pdf")),
            PathBuf::from("/tmp/report.pdf.encrypted")
        );
        assert_eq!(
            encrypted_path_for(Path::new("notes")),
            PathBuf::from("notes.encrypted")
        );
    }

    #[test]
    fn test_decrypted_path_for() {
        assert_eq!(
            decrypted_path_for(Path::new("/tmp/report.pdf.encrypted")),
            PathBuf::from("/tmp/report.pdf.decrypted")
        );
        // Only the first occurrence is replaced.
        assert_eq!(
            decrypted_path_for(Path::new("a.encrypted.encrypted")),
            PathBuf::from("a.decrypted.encrypted")
        );
        // Directories are never renamed.
        assert_eq!(
            decrypted_path_for(Path::new("x.encrypted/data")),
            PathBuf::from("x.encrypted/data.decrypted")
        );
        assert_eq!(
            decrypted_path_for(Path::new("data.bin")),
            PathBuf::from("data.bin.decrypted")
        );
    }
}
