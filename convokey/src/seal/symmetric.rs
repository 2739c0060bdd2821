// SPDX-License-Identifier: MIT OR Apache-2.0

//! Symmetric authenticated encryption with a random 192-bit nonce per seal.
use crate::crypto::xchacha20::{
    XAEAD_KEY_SIZE, XAEAD_NONCE_SIZE, XAEAD_TAG_SIZE, XAeadNonce, x_aead_decrypt, x_aead_encrypt,
};
use crate::crypto::{Rng, Secret};
use crate::error::{Error, InvalidBlobError};

/// Nonce followed by the authentication tag of an empty plaintext.
pub const SYMMETRIC_SEAL_MIN_SIZE: usize = XAEAD_NONCE_SIZE + XAEAD_TAG_SIZE;

/// 256-bit key shared by both sides of a symmetric seal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SymmetricKey(Secret<XAEAD_KEY_SIZE>);

impl SymmetricKey {
    pub fn from_bytes(bytes: [u8; XAEAD_KEY_SIZE]) -> Self {
        Self(Secret::from_bytes(bytes))
    }

    pub fn generate(rng: &Rng) -> Result<Self, Error> {
        Ok(Self(rng.random_secret()?))
    }

    pub(crate) fn from_secret(secret: Secret<XAEAD_KEY_SIZE>) -> Self {
        Self(secret)
    }

    pub(crate) fn as_bytes(&self) -> &[u8; XAEAD_KEY_SIZE] {
        self.0.as_bytes()
    }
}

/// Encrypts `plaintext` under `key` with a fresh random nonce.
pub fn seal_symmetric(key: &SymmetricKey, plaintext: &[u8], rng: &Rng) -> Result<Vec<u8>, Error> {
    let nonce: XAeadNonce = rng.random_array()?;
    let ciphertext =
        x_aead_encrypt(key.as_bytes(), plaintext, nonce, None).map_err(|_| Error::Encryption)?;

    let mut blob = Vec::with_capacity(XAEAD_NONCE_SIZE + ciphertext.len());
    blob.extend_from_slice(&nonce);
    blob.extend_from_slice(&ciphertext);
    Ok(blob)
}

/// Decrypts a blob created by [`seal_symmetric`].
pub fn open_symmetric(key: &SymmetricKey, blob: &[u8]) -> Result<Vec<u8>, Error> {
    if blob.len() < SYMMETRIC_SEAL_MIN_SIZE {
        return Err(InvalidBlobError::TooShort {
            expected: SYMMETRIC_SEAL_MIN_SIZE,
            actual: blob.len(),
        }
        .into());
    }

    let mut nonce: XAeadNonce = [0u8; XAEAD_NONCE_SIZE];
    nonce.copy_from_slice(&blob[..XAEAD_NONCE_SIZE]);

    x_aead_decrypt(key.as_bytes(), &blob[XAEAD_NONCE_SIZE..], nonce, None)
        .map_err(|_| Error::Decryption)
}
