// SPDX-License-Identifier: MIT OR Apache-2.0

//! Errors shared by every layer of the crate.
//!
//! Decryption, malformed input and key-derivation failures are all terminal: retrying with the
//! same input will never succeed. Error messages never contain key material or plaintext.
use thiserror::Error;

use crate::crypto::RngError;

#[derive(Debug, Error)]
pub enum Error {
    /// Authenticated decryption failed. Deliberately does not say whether the key was wrong or
    /// the ciphertext was tampered with.
    #[error("could not decrypt")]
    Decryption,

    #[error("invalid blob: {0}")]
    InvalidBlob(#[from] InvalidBlobError),

    #[error("key derivation failed: {0}")]
    KeyDerivation(#[from] KeyDerivationError),

    #[error("could not encrypt")]
    Encryption,

    /// The recipient public key is a low-order point, sealing to it would not be confidential.
    #[error("public key is not a valid recipient")]
    InvalidPublicKey,

    #[error(transparent)]
    Rng(#[from] RngError),
}

impl Error {
    /// Returns true if the input can never be decrypted or derived, independent of how often the
    /// operation is repeated.
    pub fn is_undecryptable(&self) -> bool {
        matches!(
            self,
            Error::Decryption | Error::InvalidBlob(_) | Error::KeyDerivation(_)
        )
    }
}

/// Structural problems which are detected before any cryptographic operation takes place.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InvalidBlobError {
    #[error("expected at least {expected} bytes, got {actual}")]
    TooShort { expected: usize, actual: usize },

    #[error("unsupported version {0}")]
    UnsupportedVersion(u8),

    #[error("unknown message encoding flag {0}")]
    UnknownEncoding(u8),

    #[error("unknown chain link kind {0}")]
    UnknownChainLink(u8),

    #[error("sealed key has invalid length {0}")]
    InvalidKeyLength(usize),

    #[error("decoded message is not valid utf-8")]
    InvalidUtf8,

    #[error("compressed payload is corrupt")]
    Decompression,

    #[error("decoded message exceeds {limit} bytes")]
    TooLarge { limit: usize },

    #[error("invalid hex encoding")]
    InvalidHex,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeyDerivationError {
    #[error("seed must be at least {minimum} bytes, got {actual}")]
    SeedTooShort { minimum: usize, actual: usize },

    #[error("invalid recovery phrase: {0}")]
    InvalidPhrase(String),

    #[error("memory-hard hash failed: {0}")]
    Argon2(String),

    #[error("could not expand key material")]
    ExpansionFailed,
}
