// SPDX-License-Identifier: MIT OR Apache-2.0

use zeroize::Zeroizing;

use crate::crypto::Rng;
use crate::crypto::x25519::{PUBLIC_KEY_SIZE, PublicKey, SECRET_KEY_SIZE, SecretKey};
use crate::epoch::{Epoch, EpochError};
use crate::error::{Error, InvalidBlobError};
use crate::seal::{open, seal, secret_key_from_slice};

/// Link carries the next epoch's secret key.
pub const CHAIN_LINK_FORWARD_KEY: u8 = 0x01;

/// Link only commits to the next epoch's public key.
pub const CHAIN_LINK_COMMITMENT: u8 = 0x02;

const CHAIN_LINK_PAYLOAD_SIZE: usize = 1 + SECRET_KEY_SIZE;

/// Decrypted content of a chain link.
///
/// Serialized as `kind(1) || payload(32)` and sealed to the previous epoch's public key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChainLink {
    ForwardKey(SecretKey),
    Commitment(PublicKey),
}

impl ChainLink {
    pub(crate) fn seal(&self, previous_public_key: &PublicKey, rng: &Rng) -> Result<Vec<u8>, Error> {
        let mut plaintext = Zeroizing::new([0u8; CHAIN_LINK_PAYLOAD_SIZE]);
        match self {
            ChainLink::ForwardKey(secret_key) => {
                plaintext[0] = CHAIN_LINK_FORWARD_KEY;
                plaintext[1..].copy_from_slice(secret_key.as_bytes());
            }
            ChainLink::Commitment(public_key) => {
                plaintext[0] = CHAIN_LINK_COMMITMENT;
                plaintext[1..].copy_from_slice(public_key.as_bytes());
            }
        }
        seal(previous_public_key, &plaintext[..], rng)
    }

    fn decode(bytes: &[u8]) -> Result<Self, Error> {
        if bytes.len() != CHAIN_LINK_PAYLOAD_SIZE {
            return Err(InvalidBlobError::InvalidKeyLength(bytes.len().saturating_sub(1)).into());
        }

        match bytes[0] {
            CHAIN_LINK_FORWARD_KEY => Ok(ChainLink::ForwardKey(secret_key_from_slice(&bytes[1..])?)),
            CHAIN_LINK_COMMITMENT => {
                let mut public_key = [0u8; PUBLIC_KEY_SIZE];
                public_key.copy_from_slice(&bytes[1..]);
                Ok(ChainLink::Commitment(PublicKey::from_bytes(public_key)))
            }
            kind => Err(InvalidBlobError::UnknownChainLink(kind).into()),
        }
    }

    /// Public key of the epoch this link leads to.
    pub fn next_public_key(&self) -> PublicKey {
        match self {
            ChainLink::ForwardKey(secret_key) => secret_key.public_key(),
            ChainLink::Commitment(public_key) => *public_key,
        }
    }
}

/// Opens a sealed chain link with the previous epoch's secret key.
pub fn open_chain_link(previous_secret_key: &SecretKey, link: &[u8]) -> Result<ChainLink, Error> {
    let plaintext = Zeroizing::new(open(previous_secret_key, link)?);
    ChainLink::decode(&plaintext)
}

/// Walks from the previous epoch's secret key into `next` through its chain link.
///
/// Only works for links which carry the next secret key. Rotations which removed a member only
/// publish a commitment, continuing members reach those epochs through their direct wrap and get
/// [`EpochError::NoAccess`] here.
pub fn traverse_chain_link(
    previous_secret_key: &SecretKey,
    next: &Epoch,
) -> Result<SecretKey, EpochError> {
    match open_next_link(previous_secret_key, next)? {
        ChainLink::ForwardKey(secret_key) => {
            if !next.verify_key(&secret_key) {
                return Err(EpochError::ChainLinkMismatch {
                    epoch: next.epoch_number,
                });
            }
            Ok(secret_key)
        }
        ChainLink::Commitment(_) => Err(EpochError::NoAccess {
            epoch: next.epoch_number,
        }),
    }
}

/// Checks that `next` is the successor the holder of the previous epoch's key has been told
/// about.
pub fn verify_chain_link(previous_secret_key: &SecretKey, next: &Epoch) -> Result<(), EpochError> {
    let link = open_next_link(previous_secret_key, next)?;
    if link.next_public_key() != next.epoch_public_key {
        return Err(EpochError::ChainLinkMismatch {
            epoch: next.epoch_number,
        });
    }
    Ok(())
}

fn open_next_link(previous_secret_key: &SecretKey, next: &Epoch) -> Result<ChainLink, EpochError> {
    let link = next
        .chain_link
        .as_ref()
        .ok_or(EpochError::MissingChainLink {
            epoch: next.epoch_number,
        })?;
    Ok(open_chain_link(previous_secret_key, link)?)
}

#[cfg(test)]
mod tests {
    use crate::crypto::Rng;
    use crate::crypto::x25519::KeyPair;
    use crate::error::{Error, InvalidBlobError};
    use crate::seal::seal;

    use super::{CHAIN_LINK_COMMITMENT, ChainLink, open_chain_link};

    #[test]
    fn links_open_with_previous_key_only() {
        let rng = Rng::from_seed([1; 32]);
        let previous = KeyPair::generate(&rng).unwrap();
        let next = KeyPair::generate(&rng).unwrap();

        let link = ChainLink::ForwardKey(next.secret_key().clone());
        let sealed = link.seal(previous.public_key(), &rng).unwrap();

        assert_eq!(open_chain_link(previous.secret_key(), &sealed).unwrap(), link);
        assert_eq!(link.next_public_key(), *next.public_key());

        // Holding the next key does not open the link.
        assert!(matches!(
            open_chain_link(next.secret_key(), &sealed),
            Err(Error::Decryption)
        ));
    }

    #[test]
    fn commitment_link() {
        let rng = Rng::from_seed([2; 32]);
        let previous = KeyPair::generate(&rng).unwrap();
        let next = KeyPair::generate(&rng).unwrap();

        let link = ChainLink::Commitment(*next.public_key());
        let sealed = link.seal(previous.public_key(), &rng).unwrap();
        let opened = open_chain_link(previous.secret_key(), &sealed).unwrap();
        assert_eq!(opened, link);
        assert_eq!(opened.next_public_key(), *next.public_key());
    }

    #[test]
    fn unknown_kind_and_length() {
        let rng = Rng::from_seed([3; 32]);
        let previous = KeyPair::generate(&rng).unwrap();

        let mut plaintext = [0u8; 33];
        plaintext[0] = 0x07;
        let sealed = seal(previous.public_key(), &plaintext, &rng).unwrap();
        assert!(matches!(
            open_chain_link(previous.secret_key(), &sealed),
            Err(Error::InvalidBlob(InvalidBlobError::UnknownChainLink(0x07)))
        ));

        let mut plaintext = [0u8; 20];
        plaintext[0] = CHAIN_LINK_COMMITMENT;
        let sealed = seal(previous.public_key(), &plaintext, &rng).unwrap();
        assert!(matches!(
            open_chain_link(previous.secret_key(), &sealed),
            Err(Error::InvalidBlob(InvalidBlobError::InvalidKeyLength(19)))
        ));
    }
}
