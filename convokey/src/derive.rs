// SPDX-License-Identifier: MIT OR Apache-2.0

//! Label-namespaced key derivation.
//!
//! Every place in the crate which turns one secret into another goes through [`derive_key`] with
//! a [`DerivationLabel`]. Keeping the labels in one enum makes every derivation domain explicit:
//! two call sites can only produce related keys if they use the same label, the same salt and the
//! same input.
use crate::crypto::Secret;
use crate::crypto::hkdf::hkdf;
use crate::crypto::x25519::{KeyPair, SECRET_KEY_SIZE, SecretKey};
use crate::error::{Error, KeyDerivationError};

/// Seeds shorter than this are rejected as malformed input.
pub const MIN_SEED_SIZE: usize = 16;

/// Versioned context strings, used as HKDF "info" or as hash domain separator.
///
/// Changing any of these strings changes every key derived under it, so a new label (with a new
/// version suffix) has to be introduced instead.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DerivationLabel {
    /// Symmetric key of an asymmetric seal, derived from the ephemeral-static DH secret.
    AsymmetricSeal,

    /// Key pair wrapping the identity key under the password protocol's export key.
    AccountWrap,

    /// Key pair wrapping the identity key under the stretched recovery-phrase seed.
    RecoveryWrap,

    /// Key pair derived from an invite link secret.
    InviteLink,

    /// Symmetric key of a single shared message.
    MessageShare,

    /// Domain separator of the epoch confirmation hash.
    EpochConfirmation,
}

impl DerivationLabel {
    pub const fn as_str(&self) -> &'static str {
        match self {
            DerivationLabel::AsymmetricSeal => "asymmetric-seal-v1",
            DerivationLabel::AccountWrap => "account-wrap-v1",
            DerivationLabel::RecoveryWrap => "recovery-wrap-v1",
            DerivationLabel::InviteLink => "invite-link-v1",
            DerivationLabel::MessageShare => "message-share-v1",
            DerivationLabel::EpochConfirmation => "epoch-confirmation-v1",
        }
    }

    pub const fn as_bytes(&self) -> &'static [u8] {
        self.as_str().as_bytes()
    }
}

/// Derives `N` bytes of key material from `ikm` under the given label with HKDF-SHA256.
///
/// An empty `salt` means "no salt".
pub fn derive_key<const N: usize>(
    label: DerivationLabel,
    salt: &[u8],
    ikm: &[u8],
) -> Result<Secret<N>, Error> {
    let mut okm: [u8; N] =
        hkdf(salt, ikm, label.as_bytes()).map_err(|_| KeyDerivationError::ExpansionFailed)?;
    let secret = Secret::from_bytes(okm);
    zeroize::Zeroize::zeroize(&mut okm);
    Ok(secret)
}

/// Deterministically derives a curve25519 key pair from a high-entropy seed.
///
/// The same `(seed, label)` always yields the same key pair, different labels yield unrelated
/// key pairs.
pub fn derive_key_pair_from_seed(seed: &[u8], label: DerivationLabel) -> Result<KeyPair, Error> {
    if seed.len() < MIN_SEED_SIZE {
        return Err(KeyDerivationError::SeedTooShort {
            minimum: MIN_SEED_SIZE,
            actual: seed.len(),
        }
        .into());
    }

    let secret: Secret<SECRET_KEY_SIZE> = derive_key(label, &[], seed)?;
    Ok(KeyPair::from_secret_key(SecretKey::from_bytes(
        *secret.as_bytes(),
    )))
}

/// Key pair used to wrap the identity key under the password protocol's export key.
pub fn derive_wrapping_key_pair(export_key: &[u8]) -> Result<KeyPair, Error> {
    derive_key_pair_from_seed(export_key, DerivationLabel::AccountWrap)
}

/// Key pair used to wrap the identity key under a recovery phrase.
///
/// `stretched_seed` is the output of the memory-hard hash over the phrase's seed, see
/// [`RecoveryPhrase::stretch`](crate::mnemonic::RecoveryPhrase::stretch).
pub fn derive_recovery_key_pair(stretched_seed: &[u8]) -> Result<KeyPair, Error> {
    derive_key_pair_from_seed(stretched_seed, DerivationLabel::RecoveryWrap)
}

#[cfg(test)]
mod tests {
    use crate::error::{Error, KeyDerivationError};

    use super::{
        DerivationLabel, derive_key, derive_key_pair_from_seed, derive_recovery_key_pair,
        derive_wrapping_key_pair,
    };

    const SEED: [u8; 32] = [7; 32];

    #[test]
    fn deterministic() {
        let key_pair_1 = derive_key_pair_from_seed(&SEED, DerivationLabel::InviteLink).unwrap();
        let key_pair_2 = derive_key_pair_from_seed(&SEED, DerivationLabel::InviteLink).unwrap();
        assert_eq!(key_pair_1, key_pair_2);
    }

    #[test]
    fn labels_separate_domains() {
        let account = derive_wrapping_key_pair(&SEED).unwrap();
        let recovery = derive_recovery_key_pair(&SEED).unwrap();
        let invite = derive_key_pair_from_seed(&SEED, DerivationLabel::InviteLink).unwrap();

        assert_ne!(account.public_key(), recovery.public_key());
        assert_ne!(account.public_key(), invite.public_key());
        assert_ne!(recovery.public_key(), invite.public_key());

        assert_eq!(
            account,
            derive_key_pair_from_seed(&SEED, DerivationLabel::AccountWrap).unwrap()
        );
    }

    #[test]
    fn seeds_separate_key_pairs() {
        let key_pair_1 = derive_wrapping_key_pair(&[1; 32]).unwrap();
        let key_pair_2 = derive_wrapping_key_pair(&[2; 32]).unwrap();
        assert_ne!(key_pair_1.public_key(), key_pair_2.public_key());
    }

    #[test]
    fn short_seed_is_rejected() {
        let result = derive_key_pair_from_seed(&[1; 15], DerivationLabel::AccountWrap);
        assert!(matches!(
            result,
            Err(Error::KeyDerivation(KeyDerivationError::SeedTooShort {
                minimum: 16,
                actual: 15
            }))
        ));
    }

    #[test]
    fn label_strings_are_unique() {
        let labels = [
            DerivationLabel::AsymmetricSeal,
            DerivationLabel::AccountWrap,
            DerivationLabel::RecoveryWrap,
            DerivationLabel::InviteLink,
            DerivationLabel::MessageShare,
            DerivationLabel::EpochConfirmation,
        ];
        for (i, a) in labels.iter().enumerate() {
            for b in labels.iter().skip(i + 1) {
                assert_ne!(a.as_str(), b.as_str());
            }
        }
        assert_eq!(DerivationLabel::AccountWrap.as_str(), "account-wrap-v1");
        assert_eq!(DerivationLabel::RecoveryWrap.as_str(), "recovery-wrap-v1");
    }

    #[test]
    fn derived_keys_depend_on_salt() {
        let key_1 = derive_key::<32>(DerivationLabel::AsymmetricSeal, b"salt-1", &SEED).unwrap();
        let key_2 = derive_key::<32>(DerivationLabel::AsymmetricSeal, b"salt-2", &SEED).unwrap();
        assert_ne!(key_1, key_2);
    }
}
