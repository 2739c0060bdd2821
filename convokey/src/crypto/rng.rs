// SPDX-License-Identifier: MIT OR Apache-2.0

use std::sync::Mutex;

use rand_chacha::ChaCha20Rng;
use rand_chacha::rand_core::{SeedableRng, TryRngCore};
use thiserror::Error;

use crate::crypto::Secret;

/// Source of every ephemeral key, nonce, recovery phrase and link secret in this crate.
///
/// ChaCha20 seeded from the operating system. The generator is shared behind a lock so one
/// instance can be handed to all operations by reference.
#[derive(Debug)]
pub struct Rng {
    inner: Mutex<ChaCha20Rng>,
}

impl Default for Rng {
    fn default() -> Self {
        Self::with_generator(ChaCha20Rng::from_os_rng())
    }
}

#[cfg(any(test, feature = "test_utils"))]
impl Rng {
    /// Deterministic generator, only available to tests.
    pub fn from_seed(seed: [u8; 32]) -> Self {
        Self::with_generator(ChaCha20Rng::from_seed(seed))
    }
}

impl Rng {
    fn with_generator(generator: ChaCha20Rng) -> Self {
        Self {
            inner: Mutex::new(generator),
        }
    }

    /// Fills a fixed-size array, used for nonces and public randomness.
    pub fn random_array<const N: usize>(&self) -> Result<[u8; N], RngError> {
        let mut bytes = [0u8; N];
        self.inner
            .lock()
            .map_err(|_| RngError::LockPoisoned)?
            .try_fill_bytes(&mut bytes)
            .map_err(|_| RngError::NotEnoughRandomness)?;
        Ok(bytes)
    }

    /// Key material which is zeroized when dropped.
    pub fn random_secret<const N: usize>(&self) -> Result<Secret<N>, RngError> {
        Ok(Secret::from_bytes(self.random_array()?))
    }
}

#[derive(Debug, Error)]
pub enum RngError {
    #[error("random number generator lock is poisoned")]
    LockPoisoned,

    #[error("random number generator failed to produce bytes")]
    NotEnoughRandomness,
}

#[cfg(test)]
mod tests {
    use super::Rng;

    #[test]
    fn same_seed_same_stream() {
        let rng_1 = Rng::from_seed([1; 32]);
        let rng_2 = Rng::from_seed([1; 32]);

        let nonce_1: [u8; 24] = rng_1.random_array().unwrap();
        let nonce_2: [u8; 24] = rng_2.random_array().unwrap();
        assert_eq!(nonce_1, nonce_2);

        // Both generators advanced by the same amount.
        let key_1 = rng_1.random_secret::<32>().unwrap();
        let key_2 = rng_2.random_secret::<32>().unwrap();
        assert_eq!(key_1, key_2);
        assert_ne!(&key_1.as_bytes()[..24], &nonce_1[..]);
    }

    #[test]
    fn different_seeds_diverge() {
        let key_1 = Rng::from_seed([1; 32]).random_secret::<32>().unwrap();
        let key_2 = Rng::from_seed([2; 32]).random_secret::<32>().unwrap();
        assert_ne!(key_1, key_2);
    }

    #[test]
    fn os_seeded_generators_diverge() {
        let sample_1: [u8; 32] = Rng::default().random_array().unwrap();
        let sample_2: [u8; 32] = Rng::default().random_array().unwrap();
        assert_ne!(sample_1, sample_2);
    }
}
