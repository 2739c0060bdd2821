// SPDX-License-Identifier: MIT OR Apache-2.0

//! Human-readable recovery phrases (BIP39, English wordlist, 12 words).
//!
//! A phrase carries 128 bits of entropy plus a 4-bit checksum. Turning it into wrapping keys is a
//! two-step process: the standard BIP39 seed (PBKDF2-HMAC-SHA512) is stretched further with
//! Argon2id, since a phrase someone wrote on paper is a weaker secret than a key coming out of
//! the password protocol.
use std::fmt;

use bip39::{Language, Mnemonic};
use zeroize::Zeroizing;

use crate::crypto::argon2::{Argon2Params, argon2id};
use crate::crypto::{Rng, Secret};
use crate::error::{Error, KeyDerivationError};

/// Number of words in every generated phrase.
pub const RECOVERY_PHRASE_WORDS: usize = 12;

/// Entropy encoded by a 12-word phrase.
const RECOVERY_ENTROPY_SIZE: usize = 16;

/// Size of the BIP39 seed.
pub const RECOVERY_SEED_SIZE: usize = 64;

/// Size of the stretched seed fed into the recovery key derivation.
pub const STRETCHED_SEED_SIZE: usize = 32;

/// Fixed Argon2 salt. The phrase is the only secret, storage keeps no per-account salt.
const RECOVERY_SALT: &[u8] = b"convokey-recovery-v1";

/// Validated recovery phrase.
///
/// The phrase is zeroized when dropped and never printed by `Debug`.
#[derive(Clone, PartialEq, Eq)]
pub struct RecoveryPhrase(Zeroizing<String>);

impl RecoveryPhrase {
    /// Generates a new random phrase.
    pub fn generate(rng: &Rng) -> Result<Self, Error> {
        let entropy: Secret<RECOVERY_ENTROPY_SIZE> = rng.random_secret()?;
        let mnemonic = Mnemonic::from_entropy_in(Language::English, entropy.as_bytes())
            .map_err(|err| KeyDerivationError::InvalidPhrase(err.to_string()))?;
        Ok(Self(Zeroizing::new(mnemonic.to_string())))
    }

    /// Parses and validates a phrase typed in by a user.
    ///
    /// Surrounding and repeated whitespace as well as upper-case letters are tolerated. Unknown
    /// words, the wrong number of words and checksum mismatches are rejected.
    pub fn parse(phrase: &str) -> Result<Self, Error> {
        let normalized = normalize(phrase);
        let mnemonic = Mnemonic::parse_in_normalized(Language::English, &normalized)
            .map_err(|err| KeyDerivationError::InvalidPhrase(err.to_string()))?;
        if mnemonic.word_count() != RECOVERY_PHRASE_WORDS {
            return Err(KeyDerivationError::InvalidPhrase(format!(
                "expected {RECOVERY_PHRASE_WORDS} words, got {}",
                mnemonic.word_count()
            ))
            .into());
        }
        Ok(Self(normalized))
    }

    /// Returns true if the phrase passes the word list and checksum validation.
    pub fn is_valid(phrase: &str) -> bool {
        Self::parse(phrase).is_ok()
    }

    /// The phrase to show to the user, words separated by single spaces.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn words(&self) -> impl Iterator<Item = &str> {
        self.0.split(' ')
    }

    /// BIP39 seed of this phrase with an empty passphrase.
    pub fn to_seed(&self) -> Result<Secret<RECOVERY_SEED_SIZE>, Error> {
        let mnemonic = Mnemonic::parse_in_normalized(Language::English, &self.0)
            .map_err(|err| KeyDerivationError::InvalidPhrase(err.to_string()))?;
        let mut seed = mnemonic.to_seed_normalized("");
        let secret = Secret::from_bytes(seed);
        zeroize::Zeroize::zeroize(&mut seed);
        Ok(secret)
    }

    /// Memory-hard stretch of the BIP39 seed, input to the recovery wrapping key pair.
    ///
    /// Blocks for as long as the configured Argon2 cost requires.
    pub fn stretch(&self, params: &Argon2Params) -> Result<Secret<STRETCHED_SEED_SIZE>, Error> {
        let seed = self.to_seed()?;
        argon2id(seed.as_bytes(), RECOVERY_SALT, params)
            .map_err(|err| KeyDerivationError::Argon2(err.to_string()).into())
    }
}

impl fmt::Debug for RecoveryPhrase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RecoveryPhrase").field(&"***").finish()
    }
}

/// Lower-cases the phrase and joins its words with single spaces.
///
/// Writes straight into a zeroizing buffer, no copy of the words outlives this call.
fn normalize(phrase: &str) -> Zeroizing<String> {
    let mut normalized = Zeroizing::new(String::with_capacity(phrase.len()));
    for (index, word) in phrase.split_whitespace().enumerate() {
        if index > 0 {
            normalized.push(' ');
        }
        normalized.extend(word.chars().flat_map(char::to_lowercase));
    }
    normalized
}

#[cfg(test)]
mod tests {
    use crate::crypto::Rng;
    use crate::crypto::argon2::Argon2Params;
    use crate::error::{Error, KeyDerivationError};

    use super::{RECOVERY_PHRASE_WORDS, RecoveryPhrase, normalize};

    const ZERO_ENTROPY_PHRASE: &str =
        "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

    #[test]
    fn generated_phrases_validate() {
        let rng = Rng::from_seed([1; 32]);
        for _ in 0..16 {
            let phrase = RecoveryPhrase::generate(&rng).unwrap();
            assert_eq!(phrase.words().count(), RECOVERY_PHRASE_WORDS);
            assert!(RecoveryPhrase::is_valid(phrase.as_str()));
        }
    }

    #[test]
    fn generated_phrases_differ() {
        let rng = Rng::from_seed([1; 32]);
        let phrase_1 = RecoveryPhrase::generate(&rng).unwrap();
        let phrase_2 = RecoveryPhrase::generate(&rng).unwrap();
        assert_ne!(phrase_1, phrase_2);
    }

    #[test]
    fn altered_word_fails_checksum() {
        assert!(RecoveryPhrase::is_valid(ZERO_ENTROPY_PHRASE));

        // Valid words, but the checksum does not match anymore.
        let altered_first = ZERO_ENTROPY_PHRASE.replacen("abandon", "ability", 1);
        assert!(!RecoveryPhrase::is_valid(&altered_first));
        let altered_last = ZERO_ENTROPY_PHRASE.replace("about", "above");
        assert!(!RecoveryPhrase::is_valid(&altered_last));
        let altered_last = ZERO_ENTROPY_PHRASE.replace("about", "abandon");
        assert!(!RecoveryPhrase::is_valid(&altered_last));

        // Not a word of the list at all.
        let unknown = ZERO_ENTROPY_PHRASE.replace("about", "pandas");
        assert!(matches!(
            RecoveryPhrase::parse(&unknown),
            Err(Error::KeyDerivation(KeyDerivationError::InvalidPhrase(_)))
        ));
    }

    #[test]
    fn word_count_is_enforced() {
        let twenty_four = format!("{ZERO_ENTROPY_PHRASE} {ZERO_ENTROPY_PHRASE}");
        assert!(!RecoveryPhrase::is_valid(&twenty_four));
        assert!(!RecoveryPhrase::is_valid("abandon abandon about"));
        assert!(!RecoveryPhrase::is_valid(""));
    }

    #[test]
    fn whitespace_and_case_are_normalized() {
        let messy = format!("  {}  ", ZERO_ENTROPY_PHRASE.to_uppercase().replace(' ', "   "));
        let phrase = RecoveryPhrase::parse(&messy).unwrap();
        assert_eq!(phrase.as_str(), ZERO_ENTROPY_PHRASE);
    }

    #[test]
    fn tabs_and_newlines_separate_words() {
        let words: Vec<&str> = ZERO_ENTROPY_PHRASE.split(' ').collect();
        let messy = format!(
            "\t{}\n{}\r\n{}",
            words[..4].join("\t").to_uppercase(),
            words[4..8].join(" \n "),
            words[8..].join("\t\t"),
        );

        assert_eq!(normalize(&messy).as_str(), ZERO_ENTROPY_PHRASE);
        assert_eq!(
            RecoveryPhrase::parse(&messy).unwrap().as_str(),
            ZERO_ENTROPY_PHRASE
        );
        assert_eq!(normalize(" \t\n ").as_str(), "");
    }

    #[test]
    fn bip39_seed_vector() {
        // BIP39 reference vector, empty passphrase.
        let phrase = RecoveryPhrase::parse(ZERO_ENTROPY_PHRASE).unwrap();
        let seed = phrase.to_seed().unwrap();
        assert_eq!(
            hex::encode(seed.as_bytes()),
            "5eb00bbddcf069084889a8ab9155568165f5c453ccb85e70811aaed6f6da5fc19a5ac40b389cd370d086206dec8aa6c43daea6690f20ad3d8d48b2d2ce9e38e4"
        );
    }

    #[test]
    fn seeds_are_phrase_sensitive() {
        let rng = Rng::from_seed([3; 32]);
        let phrase_1 = RecoveryPhrase::generate(&rng).unwrap();
        let phrase_2 = RecoveryPhrase::generate(&rng).unwrap();

        assert_eq!(phrase_1.to_seed().unwrap(), phrase_1.to_seed().unwrap());
        assert_ne!(phrase_1.to_seed().unwrap(), phrase_2.to_seed().unwrap());

        let params = Argon2Params::insecure_for_tests();
        assert_eq!(
            phrase_1.stretch(&params).unwrap(),
            phrase_1.stretch(&params).unwrap()
        );
        assert_ne!(
            phrase_1.stretch(&params).unwrap(),
            phrase_2.stretch(&params).unwrap()
        );
    }

    #[test]
    fn debug_does_not_reveal_phrase() {
        let phrase = RecoveryPhrase::parse(ZERO_ENTROPY_PHRASE).unwrap();
        assert!(!format!("{phrase:?}").contains("abandon"));
    }
}
