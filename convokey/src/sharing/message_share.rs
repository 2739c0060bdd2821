// SPDX-License-Identifier: MIT OR Apache-2.0

use std::fmt;

use crate::config::Config;
use crate::crypto::{Rng, Secret};
use crate::derive::{DerivationLabel, derive_key};
use crate::error::Error;
use crate::message::{decode_message, encode_message};
use crate::seal::{SymmetricKey, open_symmetric, seal_symmetric};
use crate::sharing::{SHARE_SECRET_SIZE, secret_from_hex};

/// One-off secret of a single shared message.
///
/// Unrelated to any epoch or account key. Must never be sent to or stored by the server.
#[derive(Clone, PartialEq, Eq)]
pub struct ShareSecret(Secret<SHARE_SECRET_SIZE>);

impl ShareSecret {
    pub fn generate(rng: &Rng) -> Result<Self, Error> {
        Ok(Self(rng.random_secret()?))
    }

    pub fn from_bytes(bytes: [u8; SHARE_SECRET_SIZE]) -> Self {
        Self(Secret::from_bytes(bytes))
    }

    pub fn from_fragment(fragment: &str) -> Result<Self, Error> {
        let bytes = secret_from_hex(fragment)?;
        Ok(Self::from_bytes(*bytes))
    }

    pub fn to_fragment(&self) -> String {
        hex::encode(self.0.as_bytes())
    }

    fn symmetric_key(&self) -> Result<SymmetricKey, Error> {
        let key = derive_key(DerivationLabel::MessageShare, &[], self.0.as_bytes())?;
        Ok(SymmetricKey::from_secret(key))
    }
}

impl fmt::Debug for ShareSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ShareSecret").field(&"***").finish()
    }
}

/// Result of [`create_message_share`]. Only `share_blob` goes to the server.
#[derive(Debug)]
pub struct MessageShare {
    pub share_secret: ShareSecret,
    pub share_blob: Vec<u8>,
}

/// Encrypts a single message under a fresh share secret.
pub fn create_message_share(
    plaintext: &str,
    config: &Config,
    rng: &Rng,
) -> Result<MessageShare, Error> {
    let share_secret = ShareSecret::generate(rng)?;
    let encoded = encode_message(plaintext, config);
    let share_blob = seal_symmetric(&share_secret.symmetric_key()?, &encoded, rng)?;
    Ok(MessageShare {
        share_secret,
        share_blob,
    })
}

/// Decrypts a shared message with the secret from the link.
pub fn decrypt_message_share(
    share_secret: &ShareSecret,
    share_blob: &[u8],
    config: &Config,
) -> Result<String, Error> {
    let encoded = open_symmetric(&share_secret.symmetric_key()?, share_blob)?;
    decode_message(&encoded, config)
}
