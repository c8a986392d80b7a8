//! Encryption/decryption using PBKDF2 + AES-256-CBC
//!
//! This module implements password-based encryption using:
//! - PBKDF2-HMAC-SHA1 (200,000 iterations) for key derivation from a password
//! - AES-256 in CBC mode with PKCS#7 padding
//!
//! The binary format is described in [`crate::container`]:
//! salt(16) + iv(16) + ciphertext(multiple of 16).
//!
//! CBC provides confidentiality only. The padding check on decryption is
//! the sole signal of a wrong password or corrupted input and will accept
//! roughly one in 256 wrong keys.

use crate::container::{self, Container, IV_LEN};
use crate::error::{ErrorCategory, ErrorKind, LockboxError, Result};
use crate::kdf::{self, SALT_LEN, SaltedKey};
use aes::Aes256;
use cbc::cipher::block_padding::Pkcs7;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use tracing::debug;
use zeroize::Zeroizing;

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

/// Encrypt plaintext with a password using random salt and IV
///
/// Returns the container: salt(16) + iv(16) + ciphertext
pub fn encrypt(password: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
    let key = SaltedKey::generate(password)?;
    seal(&key, plaintext)
}

/// Encrypt plaintext under an already derived key with a fresh random IV.
pub fn seal(key: &SaltedKey, plaintext: &[u8]) -> Result<Vec<u8>> {
    let mut iv = [0u8; IV_LEN];
    kdf::fill_random(&mut iv)?;
    Ok(seal_with_iv(key, &iv, plaintext))
}

/// Encrypt plaintext with a password using provided salt and IV
///
/// This function is ONLY for testing purposes to generate deterministic output.
/// NEVER use this in production - always use `encrypt()` which generates random salt/IV.
pub fn encrypt_deterministic(
    password: &[u8],
    plaintext: &[u8],
    salt: &[u8; SALT_LEN],
    iv: &[u8; IV_LEN],
) -> Vec<u8> {
    let key = SaltedKey::derive(password, salt);
    seal_with_iv(&key, iv, plaintext)
}

fn seal_with_iv(key: &SaltedKey, iv: &[u8; IV_LEN], plaintext: &[u8]) -> Vec<u8> {
    let ciphertext = Aes256CbcEnc::new(key.key().into(), iv.into())
        .encrypt_padded_vec_mut::<Pkcs7>(plaintext);
    debug!(
        plaintext_len = plaintext.len(),
        ciphertext_len = ciphertext.len(),
        "sealed container"
    );
    container::assemble(key.salt(), iv, &ciphertext)
}

/// Decrypt a container with a password
pub fn decrypt(password: &[u8], container: &[u8]) -> Result<Vec<u8>> {
    let container = Container::parse(container)?;
    let key = SaltedKey::derive(password, container.salt());
    open(&key, &container)
}

/// Decrypt a parsed container under a key derived from its salt.
///
/// The padding is validated before anything is returned; on failure the
/// decrypted bytes are wiped. An empty ciphertext has no padding block and
/// fails the same way.
pub fn open(key: &SaltedKey, container: &Container<'_>) -> Result<Vec<u8>> {
    let mut buf = Zeroizing::new(container.ciphertext().to_vec());
    let len = Aes256CbcDec::new(key.key().into(), container.iv().into())
        .decrypt_padded_mut::<Pkcs7>(&mut buf)
        .map_err(|_| {
            LockboxError::with_kind(
                ErrorCategory::User,
                ErrorKind::InvalidPadding,
                "invalid padding: wrong password, or corrupt or tampered-with data",
            )
        })?
        .len();

    let mut plaintext = std::mem::take(&mut *buf);
    plaintext.truncate(len);
    debug!(plaintext_len = len, "opened container");
    Ok(plaintext)
}
