//! The "currently selected file" a front end holds between user actions
//!
//! Encrypting and decrypting go through [`file_ops`] using the default
//! output naming. Both fail with [`ErrorKind::NoFileSelected`] while nothing
//! is selected.

use crate::error::{ErrorCategory, ErrorKind, LockboxError, Result};
use crate::file_ops;
use crate::passphrase::PassphraseReader;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Default, Clone)]
pub struct Selection {
    path: Option<PathBuf>,
}

impl Selection {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    /// Select `path`, replacing any previous selection.
    pub fn select(&mut self, path: impl Into<PathBuf>) {
        self.path = Some(path.into());
    }

    pub fn clear(&mut self) {
        self.path = None;
    }

    pub fn selected(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Encrypt the selected file to its `.encrypted` sibling and return the
    /// path written.
    pub fn encrypt(&self, passphrase_reader: &mut dyn PassphraseReader) -> Result<PathBuf> {
        let input = self.require()?;
        let output = file_ops::encrypted_path_for(input);
        file_ops::encrypt_file(input, &output, passphrase_reader)?;
        info!(path = %output.display(), "file encrypted");
        Ok(output)
    }

    /// Decrypt the selected file to its `.decrypted` sibling and return the
    /// path written.
    pub fn decrypt(&self, passphrase_reader: &mut dyn PassphraseReader) -> Result<PathBuf> {
        let input = self.require()?;
        let output = file_ops::decrypted_path_for(input);
        file_ops::decrypt_file(input, &output, passphrase_reader)?;
        info!(path = %output.display(), "file decrypted");
        Ok(output)
    }

    fn require(&self) -> Result<&Path> {
        self.selected().ok_or_else(|| {
            LockboxError::with_kind(
                ErrorCategory::User,
                ErrorKind::NoFileSelected,
                "no file selected",
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::passphrase::ConstantPassphraseReader;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_select_and_clear() {
        let mut selection = Selection::default();
        assert!(selection.selected().is_none());

        selection.select("a.txt");
        assert_eq!(selection.selected(), Some(Path::new("a.txt")));

        selection.select("b.txt");
        assert_eq!(selection.selected(), Some(Path::new("b.txt")));

        selection.clear();
        assert!(selection.selected().is_none());
    }

    #[test]
    fn test_operations_require_selection() {
        let selection = Selection::default();
        let mut reader = ConstantPassphraseReader::new(b"test".to_vec());

        let err = selection.encrypt(&mut reader).expect_err("expected no selection");
        assert_eq!(err.kind, Some(ErrorKind::NoFileSelected));

        let err = selection.decrypt(&mut reader).expect_err("expected no selection");
        assert_eq!(err.kind, Some(ErrorKind::NoFileSelected));
    }

    #[test]
    fn test_encrypt_then_decrypt_with_default_names() {
        let temp_dir = TempDir::new().unwrap();
        let plain_path = temp_dir.path().join("notes.txt");
        fs::write(&plain_path, b"meeting at noon").unwrap();

        let mut selection = Selection::new(&plain_path);
        let mut reader = ConstantPassphraseReader::new(b"test".to_vec());
        let encrypted = selection.encrypt(&mut reader).unwrap();
        assert_eq!(encrypted, temp_dir.path().join("notes.txt.encrypted"));

        selection.select(&encrypted);
        let decrypted = selection.decrypt(&mut reader).unwrap();
        assert_eq!(decrypted, temp_dir.path().join("notes.txt.decrypted"));
        assert_eq!(fs::read(&decrypted).unwrap(), b"meeting at noon");
    }
}
