// SPDX-License-Identifier: MIT OR Apache-2.0

//! Argon2id memory-hard password hashing.
//!
//! Only used to stretch recovery-phrase seeds. The cost parameters are part of the derivation: a
//! wrap created under one parameter set can not be opened with another, so they must never be
//! changed for existing accounts.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::crypto::Secret;

/// Minimum salt length accepted by Argon2.
pub const ARGON2_MIN_SALT_SIZE: usize = 8;

/// Tuning parameters for Argon2id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Argon2Params {
    /// Memory cost in KiB.
    pub m_cost_kib: u32,

    /// Number of passes over memory.
    pub t_cost: u32,

    /// Degree of parallelism (lanes).
    pub p_cost: u32,
}

impl Default for Argon2Params {
    fn default() -> Self {
        Self {
            m_cost_kib: 64 * 1024, // 64 MiB
            t_cost: 3,
            p_cost: 1,
        }
    }
}

#[cfg(any(test, feature = "test_utils"))]
impl Argon2Params {
    /// Cheap profile for unit tests. Never use this for real accounts.
    pub fn insecure_for_tests() -> Self {
        Self {
            m_cost_kib: 256,
            t_cost: 1,
            p_cost: 1,
        }
    }
}

/// Hashes `password` with Argon2id into `N` output bytes.
///
/// This blocks for tens to hundreds of milliseconds with the default parameters.
pub fn argon2id<const N: usize>(
    password: &[u8],
    salt: &[u8],
    params: &Argon2Params,
) -> Result<Secret<N>, Argon2Error> {
    if salt.len() < ARGON2_MIN_SALT_SIZE {
        return Err(Argon2Error::SaltTooShort(salt.len()));
    }

    let argon2_params = argon2::Params::new(params.m_cost_kib, params.t_cost, params.p_cost, Some(N))
        .map_err(|err| Argon2Error::InvalidParams(err.to_string()))?;
    let argon2 = argon2::Argon2::new(
        argon2::Algorithm::Argon2id,
        argon2::Version::V0x13,
        argon2_params,
    );

    let mut output = [0u8; N];
    let result = argon2
        .hash_password_into(password, salt, &mut output)
        .map_err(|err| Argon2Error::Hashing(err.to_string()));
    let secret = Secret::from_bytes(output);
    zeroize::Zeroize::zeroize(&mut output);
    result.map(|_| secret)
}

#[derive(Debug, Error)]
pub enum Argon2Error {
    #[error("argon2 salt must be at least {ARGON2_MIN_SALT_SIZE} bytes, got {0}")]
    SaltTooShort(usize),

    #[error("invalid argon2 parameters: {0}")]
    InvalidParams(String),

    #[error("argon2 hashing failed: {0}")]
    Hashing(String),
}
