// SPDX-License-Identifier: MIT OR Apache-2.0

use std::collections::BTreeMap;

use tracing::{debug, trace};

use crate::crypto::x25519::{PublicKey, SecretKey};
use crate::epoch::{
    Epoch, EpochError, EpochMember, EpochNumber, traverse_chain_link, unwrap_epoch_key,
    verify_epoch_chain,
};

/// Client-side store of the epoch keys one member was able to derive.
///
/// Keys are only cached after they were checked against the epoch's public key and confirmation
/// hash.
#[derive(Debug)]
pub struct EpochKeyring {
    member_secret_key: SecretKey,
    member_public_key: PublicKey,
    keys: BTreeMap<EpochNumber, SecretKey>,
}

impl EpochKeyring {
    pub fn new(member_secret_key: SecretKey) -> Self {
        let member_public_key = member_secret_key.public_key();
        Self {
            member_secret_key,
            member_public_key,
            keys: BTreeMap::new(),
        }
    }

    pub fn member_public_key(&self) -> &PublicKey {
        &self.member_public_key
    }

    /// Previously derived key of an epoch.
    pub fn get(&self, epoch_number: EpochNumber) -> Option<&SecretKey> {
        self.keys.get(&epoch_number)
    }

    /// Derives the secret key of epoch `target`.
    ///
    /// `epochs` are all epochs of the conversation ordered by number, `wraps` are the direct
    /// wraps storage returned for them (rows addressed to other members are ignored). Starts from
    /// the newest key this member holds at or below `target`, either cached or from a direct wrap,
    /// and walks the chain links forward from there.
    pub fn derive(
        &mut self,
        epochs: &[Epoch],
        wraps: &[EpochMember],
        target: EpochNumber,
    ) -> Result<SecretKey, EpochError> {
        if let Some(secret_key) = self.keys.get(&target) {
            return Ok(secret_key.clone());
        }

        verify_epoch_chain(epochs)?;
        let target_epoch = epoch_at(epochs, target).ok_or(EpochError::NoAccess { epoch: target })?;

        let own_wraps: Vec<&EpochMember> = wraps
            .iter()
            .filter(|wrap| wrap.member_public_key == self.member_public_key)
            .collect();

        if let Some(visible_from) = own_wraps
            .iter()
            .map(|wrap| wrap.visible_from_epoch)
            .min()
        {
            if target < visible_from {
                return Err(EpochError::NotVisible {
                    epoch: target,
                    visible_from,
                });
            }
        }

        let newest_wrap = own_wraps
            .iter()
            .filter(|wrap| wrap.epoch_number <= target)
            .max_by_key(|wrap| wrap.epoch_number);
        let newest_cached = self
            .keys
            .range(..=target)
            .next_back()
            .map(|(epoch_number, secret_key)| (*epoch_number, secret_key.clone()));

        let (mut epoch_number, mut secret_key) = match (newest_wrap, newest_cached) {
            (Some(wrap), Some(cached)) if cached.0 >= wrap.epoch_number => cached,
            (Some(wrap), _) => {
                let epoch = epoch_at(epochs, wrap.epoch_number).ok_or(EpochError::NoAccess {
                    epoch: wrap.epoch_number,
                })?;
                let secret_key = unwrap_epoch_key(&self.member_secret_key, &wrap.wrap)?;
                if !epoch.verify_key(&secret_key) {
                    return Err(EpochError::ConfirmationMismatch {
                        epoch: wrap.epoch_number,
                    });
                }
                self.keys.insert(wrap.epoch_number, secret_key.clone());
                (wrap.epoch_number, secret_key)
            }
            (None, Some(cached)) => cached,
            (None, None) => return Err(EpochError::NoAccess { epoch: target }),
        };

        while epoch_number < target_epoch.epoch_number {
            epoch_number += 1;
            let next = epoch_at(epochs, epoch_number).ok_or(EpochError::NoAccess {
                epoch: epoch_number,
            })?;
            secret_key = traverse_chain_link(&secret_key, next)?;
            self.keys.insert(epoch_number, secret_key.clone());
            trace!(epoch = epoch_number, "walked chain link");
        }

        debug!(
            conversation = %target_epoch.conversation_id,
            epoch = target,
            "derived epoch key"
        );

        Ok(secret_key)
    }
}

/// Looks up an epoch in a list which passed [`verify_epoch_chain`].
fn epoch_at(epochs: &[Epoch], epoch_number: EpochNumber) -> Option<&Epoch> {
    let index = usize::try_from(epoch_number.checked_sub(1)?).ok()?;
    epochs.get(index)
}
