//! Password-based key derivation
//!
//! Keys are derived with PBKDF2 using HMAC-SHA1 as the pseudorandom
//! function. The iteration count and key length are fixed at compile time
//! and are not recorded in the container, so both must stay unchanged for
//! existing containers to remain decryptable.

use crate::error::{ErrorCategory, ErrorKind, LockboxError, Result};
use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use rand::rngs::OsRng;
use sha1::Sha1;
use tracing::debug;
use zeroize::Zeroizing;

/// Length of salt in bytes
pub const SALT_LEN: usize = 16;

/// Length of derived key in bytes (AES-256)
pub const KEY_LEN: usize = 32;

/// PBKDF2 iteration count
pub const ITERATIONS: u32 = 200_000;

/// Derive `output_len` bytes of key material from a password and salt.
///
/// Fails with [`ErrorKind::InvalidParameter`] for an empty salt, zero
/// iterations or a zero output length. An empty password is accepted.
pub fn derive(
    password: &[u8],
    salt: &[u8],
    iterations: u32,
    output_len: usize,
) -> Result<Zeroizing<Vec<u8>>> {
    if salt.is_empty() {
        return Err(invalid_parameter("salt must not be empty"));
    }
    if iterations == 0 {
        return Err(invalid_parameter("iteration count must be positive"));
    }
    if output_len == 0 {
        return Err(invalid_parameter("output length must be positive"));
    }

    let mut key = Zeroizing::new(vec![0u8; output_len]);
    pbkdf2_hmac::<Sha1>(password, salt, iterations, &mut key);
    Ok(key)
}

/// Derive a 32-byte key from a password and salt using the fixed parameters.
pub fn derive_key(password: &[u8], salt: &[u8; SALT_LEN]) -> Zeroizing<[u8; KEY_LEN]> {
    debug!(iterations = ITERATIONS, "deriving key");
    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    pbkdf2_hmac::<Sha1>(password, salt, ITERATIONS, &mut key[..]);
    key
}

/// A derived key together with the salt it was derived under.
///
/// The key bytes are wiped when this value is dropped.
pub struct SaltedKey {
    salt: [u8; SALT_LEN],
    key: Zeroizing<[u8; KEY_LEN]>,
}

impl SaltedKey {
    /// Draw a fresh random salt and derive a key from `password` under it.
    pub fn generate(password: &[u8]) -> Result<Self> {
        let mut salt = [0u8; SALT_LEN];
        fill_random(&mut salt)?;
        Ok(Self::derive(password, &salt))
    }

    /// Derive the key for a known salt, e.g. one read back from a container.
    pub fn derive(password: &[u8], salt: &[u8; SALT_LEN]) -> Self {
        Self {
            salt: *salt,
            key: derive_key(password, salt),
        }
    }

    pub fn salt(&self) -> &[u8; SALT_LEN] {
        &self.salt
    }

    pub fn key(&self) -> &[u8; KEY_LEN] {
        &self.key
    }
}

/// Fill `buf` from the operating system's CSPRNG.
///
/// Failure is reported as [`ErrorKind::EntropyUnavailable`] and is never
/// retried.
pub(crate) fn fill_random(buf: &mut [u8]) -> Result<()> {
    OsRng.try_fill_bytes(buf).map_err(|e| {
        LockboxError::with_kind_and_source(
            ErrorCategory::Internal,
            ErrorKind::EntropyUnavailable,
            format!("system random source unavailable: {}", e),
            e,
        )
    })
}

fn invalid_parameter(msg: &str) -> LockboxError {
    LockboxError::with_kind(ErrorCategory::Internal, ErrorKind::InvalidParameter, msg)
}
