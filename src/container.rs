//! On-disk container layout
//!
//! The container carries everything needed for decryption except the
//! password:
//! - salt: 16 bytes
//! - iv: 16 bytes
//! - ciphertext: a positive multiple of 16 bytes
//!
//! There is no magic marker and no version field.

use crate::error::{ErrorCategory, ErrorKind, LockboxError, Result};
use crate::kdf::SALT_LEN;

/// Cipher block size in bytes (AES)
pub const BLOCK_LEN: usize = 16;

/// Length of the initialization vector in bytes (one cipher block)
pub const IV_LEN: usize = BLOCK_LEN;

/// Bytes preceding the ciphertext
pub const HEADER_LEN: usize = SALT_LEN + IV_LEN;

/// A borrowed, structurally validated view of a container.
#[derive(Debug, Clone, Copy)]
pub struct Container<'a> {
    salt: &'a [u8; SALT_LEN],
    iv: &'a [u8; IV_LEN],
    ciphertext: &'a [u8],
}

impl<'a> Container<'a> {
    /// Split `bytes` into salt, IV and ciphertext.
    ///
    /// Rejects input shorter than the header, or whose ciphertext is not a
    /// whole number of blocks, with [`ErrorKind::MalformedContainer`]. An
    /// empty ciphertext passes here and fails later at the padding check.
    pub fn parse(bytes: &'a [u8]) -> Result<Self> {
        if bytes.len() < HEADER_LEN {
            return Err(malformed(format!(
                "input likely truncated: {} bytes is shorter than the {}-byte header",
                bytes.len(),
                HEADER_LEN
            )));
        }
        let (header, ciphertext) = bytes.split_at(HEADER_LEN);
        if ciphertext.len() % BLOCK_LEN != 0 {
            return Err(malformed(format!(
                "ciphertext length {} is not a multiple of the {}-byte block size",
                ciphertext.len(),
                BLOCK_LEN
            )));
        }
        let (salt, iv) = header.split_at(SALT_LEN);
        Ok(Self {
            salt: salt.try_into().map_err(|_| malformed("failed to read salt"))?,
            iv: iv.try_into().map_err(|_| malformed("failed to read iv"))?,
            ciphertext,
        })
    }

    pub fn salt(&self) -> &'a [u8; SALT_LEN] {
        self.salt
    }

    pub fn iv(&self) -> &'a [u8; IV_LEN] {
        self.iv
    }

    pub fn ciphertext(&self) -> &'a [u8] {
        self.ciphertext
    }
}

/// Concatenate the container parts into a single buffer.
pub fn assemble(salt: &[u8; SALT_LEN], iv: &[u8; IV_LEN], ciphertext: &[u8]) -> Vec<u8> {
    let mut output = Vec::with_capacity(HEADER_LEN + ciphertext.len());
    output.extend_from_slice(salt);
    output.extend_from_slice(iv);
    output.extend_from_slice(ciphertext);
    output
}

fn malformed(msg: impl Into<String>) -> LockboxError {
    LockboxError::with_kind(ErrorCategory::User, ErrorKind::MalformedContainer, msg)
}
