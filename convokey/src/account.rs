// SPDX-License-Identifier: MIT OR Apache-2.0

//! Account lifecycle: one long-term identity key pair per user, stored only in wrapped form.
//!
//! The identity secret key is sealed twice, under two independent secrets:
//!
//! 1. The password wrap is sealed to a key pair derived from the password protocol's export key.
//! 2. The recovery wrap is sealed to a key pair derived from a 12-word recovery phrase, stretched
//!    with Argon2id.
//!
//! Both wraps always contain the same identity key. Changing the password or regenerating the
//! recovery phrase only replaces one of the wraps, the identity key pair itself never changes.
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::config::Config;
use crate::crypto::Rng;
use crate::crypto::x25519::{KeyPair, PublicKey, SecretKey};
use crate::derive::{derive_recovery_key_pair, derive_wrapping_key_pair};
use crate::error::Error;
use crate::mnemonic::RecoveryPhrase;
use crate::seal::{unwrap_secret_key, wrap_secret_key};

/// Account record as it is handed to storage.
///
/// Every field is safe to persist: the wraps can only be opened with the export key or the
/// recovery phrase, neither of which ever reaches the server.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountWraps {
    pub public_key: PublicKey,

    #[serde(with = "serde_bytes")]
    pub password_wrapped_private_key: Vec<u8>,

    #[serde(with = "serde_bytes")]
    pub recovery_wrapped_private_key: Vec<u8>,
}

/// Result of [`create_account`].
///
/// The recovery phrase is only ever returned here, it has to be shown to the user right away.
#[derive(Debug)]
pub struct NewAccount {
    pub wraps: AccountWraps,
    pub recovery_phrase: RecoveryPhrase,
}

impl NewAccount {
    pub fn public_key(&self) -> &PublicKey {
        &self.wraps.public_key
    }

    pub fn password_wrapped_private_key(&self) -> &[u8] {
        &self.wraps.password_wrapped_private_key
    }

    pub fn recovery_wrapped_private_key(&self) -> &[u8] {
        &self.wraps.recovery_wrapped_private_key
    }
}

/// Fresh recovery phrase and the wrap which belongs to it.
#[derive(Debug)]
pub struct RegeneratedRecovery {
    pub recovery_phrase: RecoveryPhrase,
    pub recovery_wrapped_private_key: Vec<u8>,
}

/// Generates the identity key pair of a new account and wraps it under both secrets.
///
/// Runs the memory-hard hash once, with the cost parameters in [`Config::recovery_kdf`].
pub fn create_account(
    export_key: &[u8],
    config: &Config,
    rng: &Rng,
) -> Result<NewAccount, Error> {
    let identity = KeyPair::generate(rng)?;

    let password_wrapped_private_key = wrap_for_password(identity.secret_key(), export_key, rng)?;
    let RegeneratedRecovery {
        recovery_phrase,
        recovery_wrapped_private_key,
    } = wrap_for_new_recovery_phrase(identity.secret_key(), config, rng)?;

    debug!("created account");
    trace!(public_key = %identity.public_key(), "account identity key");

    Ok(NewAccount {
        wraps: AccountWraps {
            public_key: *identity.public_key(),
            password_wrapped_private_key,
            recovery_wrapped_private_key,
        },
        recovery_phrase,
    })
}

/// Opens the password wrap with the export key of a successful login.
pub fn unwrap_account_key_with_password(
    export_key: &[u8],
    wrapped: &[u8],
) -> Result<SecretKey, Error> {
    let wrapping = derive_wrapping_key_pair(export_key)?;
    unwrap_secret_key(wrapping.secret_key(), wrapped)
}

/// Opens the recovery wrap with the phrase the user typed in.
///
/// A well-formed phrase which is not the current one fails with [`Error::Decryption`].
pub fn recover_account_from_mnemonic(
    phrase: &str,
    wrapped: &[u8],
    config: &Config,
) -> Result<SecretKey, Error> {
    let phrase = RecoveryPhrase::parse(phrase)?;
    let stretched = phrase.stretch(&config.recovery_kdf)?;
    let recovery = derive_recovery_key_pair(stretched.as_bytes())?;
    let secret_key = unwrap_secret_key(recovery.secret_key(), wrapped)?;
    debug!("recovered account key from phrase");
    Ok(secret_key)
}

/// Opens either wrap and checks the result against the stored identity public key.
///
/// Detects wraps which were swapped between accounts by storage.
pub fn unwrap_account_key_checked(
    wrapping_secret_key: &SecretKey,
    wrapped: &[u8],
    expected_public_key: &PublicKey,
) -> Result<SecretKey, Error> {
    let secret_key = unwrap_secret_key(wrapping_secret_key, wrapped)?;
    if secret_key.public_key() != *expected_public_key {
        return Err(Error::Decryption);
    }
    Ok(secret_key)
}

/// Seals the same identity key under a new export key.
///
/// The caller has to swap the stored password wrap atomically.
pub fn rewrap_account_key_for_password_change(
    identity_secret_key: &SecretKey,
    new_export_key: &[u8],
    rng: &Rng,
) -> Result<Vec<u8>, Error> {
    let wrapped = wrap_for_password(identity_secret_key, new_export_key, rng)?;
    debug!("rewrapped account key for password change");
    Ok(wrapped)
}

/// Generates a new recovery phrase and wraps the identity key under it.
///
/// The previous phrase stops working as soon as the returned wrap replaces the stored one.
pub fn regenerate_recovery_phrase(
    identity_secret_key: &SecretKey,
    config: &Config,
    rng: &Rng,
) -> Result<RegeneratedRecovery, Error> {
    let regenerated = wrap_for_new_recovery_phrase(identity_secret_key, config, rng)?;
    debug!("regenerated recovery phrase");
    Ok(regenerated)
}

fn wrap_for_password(
    identity_secret_key: &SecretKey,
    export_key: &[u8],
    rng: &Rng,
) -> Result<Vec<u8>, Error> {
    let wrapping = derive_wrapping_key_pair(export_key)?;
    wrap_secret_key(identity_secret_key, wrapping.public_key(), rng)
}

fn wrap_for_new_recovery_phrase(
    identity_secret_key: &SecretKey,
    config: &Config,
    rng: &Rng,
) -> Result<RegeneratedRecovery, Error> {
    let recovery_phrase = RecoveryPhrase::generate(rng)?;
    let stretched = recovery_phrase.stretch(&config.recovery_kdf)?;
    let recovery = derive_recovery_key_pair(stretched.as_bytes())?;
    let recovery_wrapped_private_key =
        wrap_secret_key(identity_secret_key, recovery.public_key(), rng)?;
    Ok(RegeneratedRecovery {
        recovery_phrase,
        recovery_wrapped_private_key,
    })
}
