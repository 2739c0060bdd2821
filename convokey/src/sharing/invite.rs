// SPDX-License-Identifier: MIT OR Apache-2.0

use std::fmt;

use tracing::debug;

use crate::crypto::x25519::{KeyPair, PublicKey, SecretKey};
use crate::crypto::{Rng, Secret};
use crate::derive::{DerivationLabel, derive_key_pair_from_seed};
use crate::epoch::{Epoch, EpochError, EpochMember, Member};
use crate::error::Error;
use crate::seal::wrap_secret_key;
use crate::sharing::{SHARE_SECRET_SIZE, secret_from_hex};

/// Secret carried in the fragment of a group invite link.
#[derive(Clone, PartialEq, Eq)]
pub struct LinkSecret(Secret<SHARE_SECRET_SIZE>);

impl LinkSecret {
    pub fn generate(rng: &Rng) -> Result<Self, Error> {
        Ok(Self(rng.random_secret()?))
    }

    pub fn from_bytes(bytes: [u8; SHARE_SECRET_SIZE]) -> Self {
        Self(Secret::from_bytes(bytes))
    }

    /// Parses the hex fragment of an invite link, with or without the leading `#`.
    pub fn from_fragment(fragment: &str) -> Result<Self, Error> {
        let bytes = secret_from_hex(fragment)?;
        Ok(Self::from_bytes(*bytes))
    }

    /// Hex encoding to put into the link's fragment.
    pub fn to_fragment(&self) -> String {
        hex::encode(self.0.as_bytes())
    }

    /// Key pair which stands in for the link in the conversation's member set.
    pub fn key_pair(&self) -> Result<KeyPair, Error> {
        derive_keys_from_link_secret(self.0.as_bytes())
    }
}

impl fmt::Debug for LinkSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("LinkSecret").field(&"***").finish()
    }
}

/// Deterministically turns an out-of-band secret into the key pair of an invite link.
pub fn derive_keys_from_link_secret(link_secret: &[u8]) -> Result<KeyPair, Error> {
    derive_key_pair_from_seed(link_secret, DerivationLabel::InviteLink)
}

/// Wraps the current epoch secret key for a new member or an invite link.
///
/// The new key joins `roster` and becomes visible from the current epoch. The returned roster
/// replaces the current one, so the next rotation treats the key as removed unless it is part of
/// the new member set. The wrap is opened with
/// [`unwrap_epoch_key`](crate::epoch::unwrap_epoch_key).
pub fn wrap_epoch_key_for_new_member(
    epoch: &Epoch,
    epoch_secret_key: &SecretKey,
    roster: &[Member],
    new_member_public_key: &PublicKey,
    rng: &Rng,
) -> Result<(Vec<Member>, EpochMember), EpochError> {
    if !epoch.verify_key(epoch_secret_key) {
        return Err(EpochError::NoAccess {
            epoch: epoch.epoch_number,
        });
    }

    let mut roster = roster.to_vec();
    let member = match roster
        .iter()
        .find(|member| &member.public_key == new_member_public_key)
    {
        Some(member) => *member,
        None => {
            let member = Member {
                public_key: *new_member_public_key,
                visible_from_epoch: epoch.epoch_number,
            };
            roster.push(member);
            member
        }
    };

    let wrap = EpochMember {
        epoch_number: epoch.epoch_number,
        member_public_key: member.public_key,
        wrap: wrap_secret_key(epoch_secret_key, &member.public_key, rng)?,
        visible_from_epoch: member.visible_from_epoch,
    };

    debug!(
        conversation = %epoch.conversation_id,
        epoch = epoch.epoch_number,
        members = roster.len(),
        "wrapped epoch key for new member"
    );

    Ok((roster, wrap))
}
