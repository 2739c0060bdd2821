// SPDX-License-Identifier: MIT OR Apache-2.0

//! Anonymous-sender public-key encryption (ECIES over X25519, HKDF-SHA256 and
//! XChaCha20-Poly1305).
//!
//! Every seal generates a fresh ephemeral key pair and hence a fresh symmetric key. This is what
//! makes the constant all-zero nonce safe: no key is ever used for more than one encryption.
use crate::crypto::{Rng, Secret};
use crate::crypto::x25519::{KeyPair, PUBLIC_KEY_SIZE, PublicKey, SecretKey};
use crate::crypto::xchacha20::{
    XAEAD_KEY_SIZE, XAEAD_NONCE_SIZE, XAEAD_TAG_SIZE, XAeadNonce, x_aead_decrypt, x_aead_encrypt,
};
use crate::derive::{DerivationLabel, derive_key};
use crate::error::{Error, InvalidBlobError};

/// Current wire format version, first byte of every asymmetric seal.
pub const SEAL_VERSION: u8 = 0x01;

/// Version byte followed by the ephemeral public key.
pub const SEAL_HEADER_SIZE: usize = 1 + PUBLIC_KEY_SIZE;

/// Smallest possible seal, produced by an empty plaintext.
pub const SEAL_MIN_SIZE: usize = SEAL_HEADER_SIZE + XAEAD_TAG_SIZE;

const ZERO_NONCE: XAeadNonce = [0u8; XAEAD_NONCE_SIZE];

/// Encrypts `plaintext` for the holder of the secret key belonging to `recipient`.
///
/// Sealing the same plaintext twice never yields the same blob.
pub fn seal(recipient: &PublicKey, plaintext: &[u8], rng: &Rng) -> Result<Vec<u8>, Error> {
    let ephemeral = KeyPair::generate(rng)?;
    let shared_secret = ephemeral
        .secret_key()
        .calculate_agreement(recipient)
        .map_err(|_| Error::InvalidPublicKey)?;
    let key = seal_key(shared_secret.as_bytes(), ephemeral.public_key(), recipient)?;

    let ciphertext = x_aead_encrypt(key.as_bytes(), plaintext, ZERO_NONCE, None)
        .map_err(|_| Error::Encryption)?;

    let mut blob = Vec::with_capacity(SEAL_HEADER_SIZE + ciphertext.len());
    blob.push(SEAL_VERSION);
    blob.extend_from_slice(ephemeral.public_key().as_bytes());
    blob.extend_from_slice(&ciphertext);
    Ok(blob)
}

/// Decrypts a blob created by [`seal`].
///
/// Structural problems (too short, unknown version) are reported as
/// [`Error::InvalidBlob`] before any cryptography takes place, everything else as
/// [`Error::Decryption`].
pub fn open(recipient: &SecretKey, blob: &[u8]) -> Result<Vec<u8>, Error> {
    if blob.len() < SEAL_MIN_SIZE {
        return Err(InvalidBlobError::TooShort {
            expected: SEAL_MIN_SIZE,
            actual: blob.len(),
        }
        .into());
    }

    if blob[0] != SEAL_VERSION {
        return Err(InvalidBlobError::UnsupportedVersion(blob[0]).into());
    }

    let mut ephemeral_bytes = [0u8; PUBLIC_KEY_SIZE];
    ephemeral_bytes.copy_from_slice(&blob[1..SEAL_HEADER_SIZE]);
    let ephemeral_public_key = PublicKey::from_bytes(ephemeral_bytes);

    // A low-order ephemeral key can only come from a forged blob, report it like any other
    // authentication failure.
    let shared_secret = recipient
        .calculate_agreement(&ephemeral_public_key)
        .map_err(|_| Error::Decryption)?;
    let key = seal_key(
        shared_secret.as_bytes(),
        &ephemeral_public_key,
        &recipient.public_key(),
    )?;

    x_aead_decrypt(key.as_bytes(), &blob[SEAL_HEADER_SIZE..], ZERO_NONCE, None)
        .map_err(|_| Error::Decryption)
}

/// HKDF over the shared secret, salted with both public keys so the key is bound to this exact
/// sender-recipient pair.
fn seal_key(
    shared_secret: &[u8],
    ephemeral_public_key: &PublicKey,
    recipient: &PublicKey,
) -> Result<Secret<XAEAD_KEY_SIZE>, Error> {
    let mut salt = [0u8; 2 * PUBLIC_KEY_SIZE];
    salt[..PUBLIC_KEY_SIZE].copy_from_slice(ephemeral_public_key.as_bytes());
    salt[PUBLIC_KEY_SIZE..].copy_from_slice(recipient.as_bytes());
    derive_key(DerivationLabel::AsymmetricSeal, &salt, shared_secret)
}

#[cfg(test)]
mod tests {
    use crate::crypto::Rng;
    use crate::crypto::x25519::{KeyPair, PublicKey};
    use crate::error::{Error, InvalidBlobError};

    use super::{SEAL_MIN_SIZE, SEAL_VERSION, open, seal};

    #[test]
    fn seal_open() {
        let rng = Rng::from_seed([1; 32]);
        let bob = KeyPair::generate(&rng).unwrap();

        let blob = seal(bob.public_key(), b"Hello, Panda!", &rng).unwrap();
        assert_eq!(blob.len(), SEAL_MIN_SIZE + b"Hello, Panda!".len());
        assert_eq!(blob[0], SEAL_VERSION);

        let plaintext = open(bob.secret_key(), &blob).unwrap();
        assert_eq!(plaintext, b"Hello, Panda!");
    }

    #[test]
    fn empty_plaintext() {
        let rng = Rng::from_seed([1; 32]);
        let bob = KeyPair::generate(&rng).unwrap();

        let blob = seal(bob.public_key(), b"", &rng).unwrap();
        assert_eq!(blob.len(), SEAL_MIN_SIZE);
        assert!(open(bob.secret_key(), &blob).unwrap().is_empty());
    }

    #[test]
    fn seals_are_not_deterministic() {
        let rng = Rng::from_seed([1; 32]);
        let bob = KeyPair::generate(&rng).unwrap();

        let blob_1 = seal(bob.public_key(), b"same", &rng).unwrap();
        let blob_2 = seal(bob.public_key(), b"same", &rng).unwrap();
        assert_ne!(blob_1, blob_2);
        assert_ne!(blob_1[1..33], blob_2[1..33]);
    }

    #[test]
    fn wrong_key() {
        let rng = Rng::from_seed([1; 32]);
        let bob = KeyPair::generate(&rng).unwrap();
        let charlie = KeyPair::generate(&rng).unwrap();

        let blob = seal(bob.public_key(), b"for bob only", &rng).unwrap();
        assert!(matches!(
            open(charlie.secret_key(), &blob),
            Err(Error::Decryption)
        ));
    }

    #[test]
    fn every_bit_flip_is_detected() {
        let rng = Rng::from_seed([1; 32]);
        let bob = KeyPair::generate(&rng).unwrap();
        let blob = seal(bob.public_key(), b"tamper with me", &rng).unwrap();

        // The version byte is checked structurally, every other bit through authentication.
        for byte in 1..blob.len() {
            for bit in 0..8 {
                let mut tampered = blob.clone();
                tampered[byte] ^= 1 << bit;
                assert!(
                    matches!(open(bob.secret_key(), &tampered), Err(Error::Decryption)),
                    "flipped bit {bit} of byte {byte}"
                );
            }
        }
    }

    #[test]
    fn malformed_blobs() {
        let rng = Rng::from_seed([1; 32]);
        let bob = KeyPair::generate(&rng).unwrap();
        let blob = seal(bob.public_key(), b"", &rng).unwrap();

        assert!(matches!(
            open(bob.secret_key(), &blob[..SEAL_MIN_SIZE - 1]),
            Err(Error::InvalidBlob(InvalidBlobError::TooShort {
                expected: 49,
                actual: 48
            }))
        ));
        assert!(matches!(
            open(bob.secret_key(), &[]),
            Err(Error::InvalidBlob(InvalidBlobError::TooShort { .. }))
        ));

        let mut wrong_version = blob.clone();
        wrong_version[0] = 0x02;
        assert!(matches!(
            open(bob.secret_key(), &wrong_version),
            Err(Error::InvalidBlob(InvalidBlobError::UnsupportedVersion(2)))
        ));
    }

    #[test]
    fn low_order_recipient_is_refused() {
        let rng = Rng::from_seed([1; 32]);
        let result = seal(&PublicKey::from_bytes([0; 32]), b"nobody", &rng);
        assert!(matches!(result, Err(Error::InvalidPublicKey)));
    }
}
