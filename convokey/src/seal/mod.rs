// SPDX-License-Identifier: MIT OR Apache-2.0

//! Authenticated encryption of opaque payloads.
//!
//! Asymmetric seals address a payload to a public key without revealing the sender, symmetric
//! seals are used where both sides already share a key. Both produce byte-exact blobs which
//! storage treats as inert bytes:
//!
//! ```text
//! asymmetric: version(1) || ephemeral public key(32) || ciphertext || tag(16)    >= 49 bytes
//! symmetric:  nonce(24) || ciphertext || tag(16)                                 >= 40 bytes
//! ```
pub mod asymmetric;
pub mod symmetric;

pub use asymmetric::{SEAL_MIN_SIZE, SEAL_VERSION, open, seal};
pub use symmetric::{SYMMETRIC_SEAL_MIN_SIZE, SymmetricKey, open_symmetric, seal_symmetric};

use zeroize::Zeroizing;

use crate::crypto::Rng;
use crate::crypto::x25519::{PublicKey, SECRET_KEY_SIZE, SecretKey};
use crate::error::{Error, InvalidBlobError};

/// Seals a raw secret key to `recipient`. This is what identity, epoch and invite wraps are.
pub(crate) fn wrap_secret_key(
    secret_key: &SecretKey,
    recipient: &PublicKey,
    rng: &Rng,
) -> Result<Vec<u8>, Error> {
    seal(recipient, secret_key.as_bytes(), rng)
}

/// Opens a wrap created by [`wrap_secret_key`].
pub(crate) fn unwrap_secret_key(recipient: &SecretKey, wrap: &[u8]) -> Result<SecretKey, Error> {
    let plaintext = Zeroizing::new(open(recipient, wrap)?);
    secret_key_from_slice(&plaintext)
}

pub(crate) fn secret_key_from_slice(bytes: &[u8]) -> Result<SecretKey, Error> {
    let bytes: [u8; SECRET_KEY_SIZE] = bytes
        .try_into()
        .map_err(|_| InvalidBlobError::InvalidKeyLength(bytes.len()))?;
    Ok(SecretKey::from_bytes(bytes))
}
