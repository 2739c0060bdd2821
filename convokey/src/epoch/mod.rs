// SPDX-License-Identifier: MIT OR Apache-2.0

//! Forward-secret group keys ("epochs") for conversations.
//!
//! Every conversation has exactly one current epoch. Each epoch is a fresh curve25519 key pair
//! whose secret half reaches members in one of two ways:
//!
//! 1. A direct wrap (asymmetric seal of the epoch secret key) addressed to the member's public
//!    key. New members always get one, marking the epoch they joined at as their
//!    `visible_from_epoch`.
//! 2. The chain link of the epoch, sealed to the previous epoch's public key. Members who already
//!    hold epoch `N - 1` open it to walk forward into epoch `N`.
//!
//! Nothing is ever sealed to a later epoch's key, holding epoch `N` therefore never yields epoch
//! `N - 1`. When a rotation removes a member, that member still holds epoch `N - 1` and could open
//! a link carrying the new secret. Such rotations therefore publish a link which only commits to
//! the new public key, and every remaining member receives a direct wrap instead.
//!
//! ```text
//! epoch 1        epoch 2 (B added)     epoch 3 (A removed)
//! wraps: A       link: key(2) -> 1     link: commit(3) -> 2
//!                wraps: B              wraps: B, C
//! ```
//!
//! All functions here are pure. Storage has to serialize rotations per conversation, a unique
//! constraint on `(conversation_id, epoch_number)` is enough.
mod chain;
mod keyring;

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use thiserror::Error;
use tracing::{debug, trace};

use crate::crypto::Rng;
use crate::crypto::sha2::{SHA256_DIGEST_SIZE, sha2_256};
use crate::crypto::x25519::{KeyPair, PublicKey, SecretKey};
use crate::derive::DerivationLabel;
use crate::error::Error;
use crate::seal::{unwrap_secret_key, wrap_secret_key};

pub use chain::{
    CHAIN_LINK_COMMITMENT, CHAIN_LINK_FORWARD_KEY, ChainLink, open_chain_link,
    traverse_chain_link, verify_chain_link,
};
pub use keyring::EpochKeyring;

/// Sequence number of an epoch, starting at 1.
pub type EpochNumber = u64;

/// Number of the first epoch of every conversation.
pub const FIRST_EPOCH: EpochNumber = 1;

/// Opaque identifier of a conversation, assigned by the application.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConversationId(String);

impl ConversationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ConversationId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Binding commitment over an epoch's number and public key.
///
/// Clients recompute it from values they derived locally and compare, they never take the
/// server's word for which key belongs to an epoch.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConfirmationHash(#[serde(with = "serde_bytes")] [u8; SHA256_DIGEST_SIZE]);

impl ConfirmationHash {
    pub fn compute(epoch_number: EpochNumber, epoch_public_key: &PublicKey) -> Self {
        Self(sha2_256(&[
            DerivationLabel::EpochConfirmation.as_bytes(),
            &epoch_number.to_be_bytes(),
            epoch_public_key.as_bytes(),
        ]))
    }

    pub fn from_bytes(bytes: [u8; SHA256_DIGEST_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; SHA256_DIGEST_SIZE] {
        &self.0
    }

    /// Constant-time comparison.
    pub fn matches(&self, other: &ConfirmationHash) -> bool {
        bool::from(self.0.ct_eq(&other.0))
    }
}

impl fmt::Display for ConfirmationHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

/// Public record of one epoch of a conversation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Epoch {
    pub conversation_id: ConversationId,
    pub epoch_number: EpochNumber,
    pub epoch_public_key: PublicKey,
    pub confirmation_hash: ConfirmationHash,

    /// Absent on the first epoch, present on every later one.
    #[serde(with = "serde_bytes")]
    pub chain_link: Option<Vec<u8>>,
}

impl Epoch {
    /// Returns true if `epoch_secret_key` is the secret key of this epoch.
    pub fn verify_key(&self, epoch_secret_key: &SecretKey) -> bool {
        epoch_secret_key.public_key() == self.epoch_public_key
            && verify_epoch_key_confirmation(
                epoch_secret_key,
                self.epoch_number,
                &self.confirmation_hash,
            )
    }
}

/// Wrap of an epoch secret key for one member.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpochMember {
    pub epoch_number: EpochNumber,
    pub member_public_key: PublicKey,

    #[serde(with = "serde_bytes")]
    pub wrap: Vec<u8>,

    /// Epoch the member joined at. Never changes for as long as the member stays.
    pub visible_from_epoch: EpochNumber,
}

/// Member of the current epoch.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Member {
    pub public_key: PublicKey,
    pub visible_from_epoch: EpochNumber,
}

/// Result of creating or rotating an epoch.
#[derive(Debug)]
pub struct EpochUpdate {
    pub epoch: Epoch,

    /// Secret key of the new epoch, for the client which performed the rotation. Must only be
    /// persisted through a wrap.
    pub epoch_secret_key: SecretKey,

    /// Everyone who can access the new epoch.
    pub roster: Vec<Member>,

    /// Direct wraps created for this epoch. Members missing here reach the epoch through its
    /// chain link.
    pub wraps: Vec<EpochMember>,
}

/// Creates epoch 1 of a conversation and wraps its secret key for every initial member.
pub fn create_first_epoch(
    conversation_id: ConversationId,
    member_public_keys: &[PublicKey],
    rng: &Rng,
) -> Result<EpochUpdate, EpochError> {
    let members = dedup(member_public_keys);
    if members.is_empty() {
        return Err(EpochError::EmptyMemberSet);
    }

    let epoch_key_pair = KeyPair::generate(rng).map_err(Error::from)?;
    let roster: Vec<Member> = members
        .iter()
        .map(|public_key| Member {
            public_key: *public_key,
            visible_from_epoch: FIRST_EPOCH,
        })
        .collect();
    let wraps = wrap_for_members(FIRST_EPOCH, epoch_key_pair.secret_key(), &roster, rng)?;

    let epoch = Epoch {
        conversation_id,
        epoch_number: FIRST_EPOCH,
        epoch_public_key: *epoch_key_pair.public_key(),
        confirmation_hash: ConfirmationHash::compute(FIRST_EPOCH, epoch_key_pair.public_key()),
        chain_link: None,
    };

    debug!(
        conversation = %epoch.conversation_id,
        members = roster.len(),
        "created first epoch"
    );
    trace!(epoch_public_key = %epoch.epoch_public_key, "epoch key");

    Ok(EpochUpdate {
        epoch,
        epoch_secret_key: epoch_key_pair.into_secret_key(),
        roster,
        wraps,
    })
}

/// Rotates a conversation to the next epoch with the given member set.
///
/// `previous_roster` is the roster returned by the last rotation (or the first epoch). Members
/// present in both sets keep their `visible_from_epoch`, new members become visible from the new
/// epoch and members missing from `member_public_keys` lose access to it.
pub fn perform_epoch_rotation(
    previous: &Epoch,
    previous_secret_key: &SecretKey,
    previous_roster: &[Member],
    member_public_keys: &[PublicKey],
    rng: &Rng,
) -> Result<EpochUpdate, EpochError> {
    if !previous.verify_key(previous_secret_key) {
        return Err(EpochError::NoAccess {
            epoch: previous.epoch_number,
        });
    }

    let members = dedup(member_public_keys);
    if members.is_empty() {
        return Err(EpochError::EmptyMemberSet);
    }

    let epoch_number = previous
        .epoch_number
        .checked_add(1)
        .ok_or(EpochError::EpochOverflow)?;

    let mut roster = Vec::with_capacity(members.len());
    let mut added = Vec::new();
    for public_key in &members {
        match previous_roster
            .iter()
            .find(|member| &member.public_key == public_key)
        {
            Some(member) => roster.push(*member),
            None => {
                let member = Member {
                    public_key: *public_key,
                    visible_from_epoch: epoch_number,
                };
                roster.push(member);
                added.push(member);
            }
        }
    }
    let removed = previous_roster
        .iter()
        .filter(|member| !members.contains(&member.public_key))
        .count();

    let epoch_key_pair = KeyPair::generate(rng).map_err(Error::from)?;

    // Removed members still hold the previous epoch and must not find the new secret behind its
    // link.
    let (chain_link, wraps) = if removed == 0 {
        let link = ChainLink::ForwardKey(epoch_key_pair.secret_key().clone());
        let wraps = wrap_for_members(epoch_number, epoch_key_pair.secret_key(), &added, rng)?;
        (link, wraps)
    } else {
        let link = ChainLink::Commitment(*epoch_key_pair.public_key());
        let wraps = wrap_for_members(epoch_number, epoch_key_pair.secret_key(), &roster, rng)?;
        (link, wraps)
    };

    let epoch = Epoch {
        conversation_id: previous.conversation_id.clone(),
        epoch_number,
        epoch_public_key: *epoch_key_pair.public_key(),
        confirmation_hash: ConfirmationHash::compute(epoch_number, epoch_key_pair.public_key()),
        chain_link: Some(chain_link.seal(&previous.epoch_public_key, rng)?),
    };

    debug!(
        conversation = %epoch.conversation_id,
        epoch = epoch_number,
        members = roster.len(),
        added = added.len(),
        removed,
        wraps = wraps.len(),
        "rotated epoch"
    );
    trace!(epoch_public_key = %epoch.epoch_public_key, "epoch key");

    Ok(EpochUpdate {
        epoch,
        epoch_secret_key: epoch_key_pair.into_secret_key(),
        roster,
        wraps,
    })
}

/// Opens a direct wrap with the member's own secret key.
pub fn unwrap_epoch_key(member_secret_key: &SecretKey, wrap: &[u8]) -> Result<SecretKey, Error> {
    unwrap_secret_key(member_secret_key, wrap)
}

/// Recomputes the confirmation hash from a locally held epoch secret key and compares it in
/// constant time.
pub fn verify_epoch_key_confirmation(
    epoch_secret_key: &SecretKey,
    epoch_number: EpochNumber,
    confirmation_hash: &ConfirmationHash,
) -> bool {
    ConfirmationHash::compute(epoch_number, &epoch_secret_key.public_key())
        .matches(confirmation_hash)
}

/// Checks the structure of a conversation's epochs, ordered by epoch number.
///
/// Numbering has to start at 1 without gaps, only the first epoch may lack a chain link and
/// every confirmation hash has to match its public key. This needs no secrets, links themselves
/// are checked with [`verify_chain_link`].
pub fn verify_epoch_chain(epochs: &[Epoch]) -> Result<(), EpochError> {
    let Some(first) = epochs.first() else {
        return Ok(());
    };

    for (expected, epoch) in (FIRST_EPOCH..).zip(epochs) {
        if epoch.conversation_id != first.conversation_id {
            return Err(EpochError::ConversationMismatch);
        }

        if epoch.epoch_number != expected {
            return Err(EpochError::BrokenChain {
                expected,
                found: epoch.epoch_number,
            });
        }

        match (&epoch.chain_link, expected == FIRST_EPOCH) {
            (Some(_), true) => return Err(EpochError::UnexpectedChainLink),
            (None, false) => return Err(EpochError::MissingChainLink { epoch: expected }),
            _ => (),
        }

        let confirmation_hash = ConfirmationHash::compute(expected, &epoch.epoch_public_key);
        if !confirmation_hash.matches(&epoch.confirmation_hash) {
            return Err(EpochError::ConfirmationMismatch { epoch: expected });
        }
    }

    Ok(())
}

fn wrap_for_members(
    epoch_number: EpochNumber,
    epoch_secret_key: &SecretKey,
    members: &[Member],
    rng: &Rng,
) -> Result<Vec<EpochMember>, Error> {
    members
        .iter()
        .map(|member| {
            Ok(EpochMember {
                epoch_number,
                member_public_key: member.public_key,
                wrap: wrap_secret_key(epoch_secret_key, &member.public_key, rng)?,
                visible_from_epoch: member.visible_from_epoch,
            })
        })
        .collect()
}

/// Removes duplicate keys, keeping the first occurrence.
fn dedup(public_keys: &[PublicKey]) -> Vec<PublicKey> {
    let mut seen = HashSet::with_capacity(public_keys.len());
    public_keys
        .iter()
        .filter(|public_key| seen.insert(**public_key))
        .copied()
        .collect()
}

#[derive(Debug, Error)]
pub enum EpochError {
    #[error("an epoch needs at least one member")]
    EmptyMemberSet,

    #[error("epoch number overflow")]
    EpochOverflow,

    #[error("epoch {epoch} is before the member's first visible epoch {visible_from}")]
    NotVisible {
        epoch: EpochNumber,
        visible_from: EpochNumber,
    },

    #[error("no key material available for epoch {epoch}")]
    NoAccess { epoch: EpochNumber },

    #[error("expected epoch {expected}, found {found}")]
    BrokenChain {
        expected: EpochNumber,
        found: EpochNumber,
    },

    #[error("epoch {epoch} has no chain link")]
    MissingChainLink { epoch: EpochNumber },

    #[error("first epoch must not have a chain link")]
    UnexpectedChainLink,

    #[error("chain link of epoch {epoch} does not lead to its public key")]
    ChainLinkMismatch { epoch: EpochNumber },

    #[error("epochs belong to different conversations")]
    ConversationMismatch,

    #[error("confirmation hash of epoch {epoch} does not match")]
    ConfirmationMismatch { epoch: EpochNumber },

    #[error(transparent)]
    Crypto(#[from] Error),
}

impl EpochError {
    /// See [`Error::is_undecryptable`].
    pub fn is_undecryptable(&self) -> bool {
        match self {
            EpochError::Crypto(err) => err.is_undecryptable(),
            EpochError::EmptyMemberSet | EpochError::EpochOverflow => false,
            _ => true,
        }
    }
}
