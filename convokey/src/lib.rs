// SPDX-License-Identifier: MIT OR Apache-2.0

//! `convokey` is the end-to-end key-management core of a group chat: it decides who can read
//! which messages, while the server only ever stores opaque blobs.
//!
//! All operations are pure functions over bytes. Storage, transport and the password protocol
//! are the caller's business, randomness is passed in explicitly as an [`Rng`].
//!
//! ## Accounts
//!
//! Every user has one long-term X25519 identity key pair. Its secret half is stored twice, sealed
//! to a key pair derived from the password protocol's export key and sealed to a key pair derived
//! from a 12-word recovery phrase (BIP39, stretched with Argon2id). Changing the password or
//! regenerating the phrase replaces one wrap, the identity never changes. See [`account`].
//!
//! ## Epochs
//!
//! Conversations encrypt under an epoch key pair which is rotated whenever the membership
//! changes. Members joining at epoch `k` receive a direct wrap and can never reach epochs before
//! `k`. Continuing members walk forward through chain links sealed to the previous epoch. Members
//! removed at epoch `k` keep what they had but never see epoch `k` or later. See [`epoch`].
//!
//! ## Messages and sharing
//!
//! Messages are optionally zstd-compressed and sealed to the current epoch's public key (see
//! [`message`]). Group invite links and single-message share links carry a random secret in the
//! URL fragment (see [`sharing`]).
//!
//! ## Wire formats
//!
//! ```text
//! asymmetric seal: version(1) || ephemeral public key(32) || ciphertext || tag(16)
//! symmetric seal:  nonce(24) || ciphertext || tag(16)
//! message:         flag(1) || payload
//! ```
//!
//! ## Security
//!
//! Key material lives in zeroize-on-drop containers and is never printed by `Debug`. Decryption
//! failures never reveal whether the key was wrong or the ciphertext was tampered with.
pub mod account;
pub mod config;
pub mod crypto;
pub mod derive;
pub mod epoch;
pub mod error;
pub mod message;
pub mod mnemonic;
pub mod replay;
pub mod seal;
pub mod sharing;
#[cfg(any(test, feature = "test_utils"))]
pub mod test_utils;
pub mod traits;

pub use account::{
    AccountWraps, NewAccount, RegeneratedRecovery, create_account, recover_account_from_mnemonic,
    regenerate_recovery_phrase, rewrap_account_key_for_password_change,
    unwrap_account_key_checked, unwrap_account_key_with_password,
};
pub use config::Config;
pub use crypto::x25519::{KeyPair, PublicKey, SecretKey};
pub use crypto::{Rng, RngError};
pub use epoch::{
    ConfirmationHash, ConversationId, Epoch, EpochError, EpochKeyring, EpochMember, EpochNumber,
    EpochUpdate, Member, create_first_epoch, perform_epoch_rotation, traverse_chain_link,
    unwrap_epoch_key, verify_chain_link, verify_epoch_chain, verify_epoch_key_confirmation,
};
pub use error::{Error, InvalidBlobError, KeyDerivationError};
pub use message::{decode_message, decrypt_message, encode_message, encrypt_message_for_storage};
pub use mnemonic::RecoveryPhrase;
pub use replay::{ReplayError, TotpReplayGuard, TotpVerdict};
pub use sharing::{
    LinkSecret, MessageShare, ShareSecret, create_message_share, decrypt_message_share,
    derive_keys_from_link_secret, wrap_epoch_key_for_new_member,
};
