//! Lockbox - password-based file encryption using PBKDF2 and AES-256-CBC

#![forbid(unsafe_code)]

pub mod container;
pub mod error;
pub mod file_ops;
pub mod filecipher;
pub mod kdf;
pub mod passphrase;
pub mod selection;
