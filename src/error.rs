use std::error::Error as StdError;
use std::io;
use std::path::Path;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorCategory {
    /// Any failure that cannot be confidently attributed to any other error
    /// category in this enum.
    ///
    /// In particular this means that use of Internal is never a guarantee
    /// the error is not, for example due to a user error - merely that it
    /// cannot be confidently determined by the code.
    Internal,

    /// The user provided invalid input or performed an action that is
    /// unsupported or impossible to complete.
    User,
}

/// Fine-grained condition flags for consumers that want to branch on error kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// Key derivation was asked for an empty salt, zero iterations or a
    /// zero-length key.
    InvalidParameter,
    /// The operating system random source failed to produce bytes.
    EntropyUnavailable,
    /// A file to read does not exist.
    FileNotFound,
    /// The operating system refused access to a file.
    PermissionDenied,
    /// The container is too short or its ciphertext is not a whole number
    /// of blocks.
    MalformedContainer,
    /// Padding of the decrypted data is invalid. This is what a wrong
    /// password or corrupted ciphertext looks like; the two cannot be told
    /// apart.
    InvalidPadding,
    /// Passphrase could not be obtained from the configured reader.
    PassphraseUnavailable,
    /// An operation needing a selected file was invoked with nothing selected.
    NoFileSelected,
    /// Any other interaction with the filesystem, stdin/stdout or terminal failed.
    Io,
}

#[derive(Debug, Error)]
#[error("{msg}")]
pub struct LockboxError {
    /// Broad error category, always provided.
    pub category: ErrorCategory,
    /// Optional specific condition tag for consumers that need to
    /// branch their behavior. Any code consuming errors MUST handle
    /// the absence of a defined kind.
    pub kind: Option<ErrorKind>,
    #[source]
    source: Option<Box<dyn StdError + Send + Sync + 'static>>,
    msg: String,
}

impl LockboxError {
    /// Creates a new error that also tags the failure with a kind.
    pub fn with_kind(category: ErrorCategory, kind: ErrorKind, msg: impl Into<String>) -> Self {
        Self {
            category,
            kind: Some(kind),
            source: None,
            msg: msg.into(),
        }
    }

    /// Creates a new error that carries both a kind tag and the originating source error.
    pub fn with_kind_and_source(
        category: ErrorCategory,
        kind: ErrorKind,
        msg: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self {
            category,
            kind: Some(kind),
            source: Some(Box::new(source)),
            msg: msg.into(),
        }
    }

    /// Maps an I/O failure on `path` to the matching kind.
    ///
    /// Missing files and permission problems are reported as user errors,
    /// everything else as internal.
    pub fn from_io(action: &str, path: &Path, err: io::Error) -> Self {
        let (category, kind) = match err.kind() {
            io::ErrorKind::NotFound => (ErrorCategory::User, ErrorKind::FileNotFound),
            io::ErrorKind::PermissionDenied => (ErrorCategory::User, ErrorKind::PermissionDenied),
            _ => (ErrorCategory::Internal, ErrorKind::Io),
        };
        Self::with_kind_and_source(
            category,
            kind,
            format!("failed to {} {}", action, path.display()),
            err,
        )
    }

    /// The user-facing message carried by the error.
    pub fn message(&self) -> &str {
        &self.msg
    }

    /// Wraps the current error with a higher-level message while preserving the original as source.
    pub fn with_context(self, msg: impl Into<String>) -> Self {
        let category = self.category;
        let kind = self.kind;
        Self {
            category,
            kind,
            source: Some(Box::new(self)),
            msg: msg.into(),
        }
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, LockboxError>;
