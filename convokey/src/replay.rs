// SPDX-License-Identifier: MIT OR Apache-2.0

//! Replay protection for one-time login codes.
//!
//! Generating and checking TOTP codes is done elsewhere. This module only answers "has this exact
//! code been accepted for this user before" and records a code once it was accepted.
use std::error::Error as StdError;

use thiserror::Error;
use tracing::debug;

use crate::traits::ReplayStore;

/// Prefix of every key written to the replay store.
pub const REPLAY_KEY_PREFIX: &str = "totp-used";

/// Outcome of a verification attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TotpVerdict {
    Accepted,
    Rejected,
    Replayed,
}

impl TotpVerdict {
    pub fn is_accepted(&self) -> bool {
        matches!(self, TotpVerdict::Accepted)
    }
}

/// Guards an external TOTP verifier against replayed codes.
#[derive(Clone, Copy, Debug, Default)]
pub struct TotpReplayGuard;

impl TotpReplayGuard {
    /// Store key marking `code` as used by `user_id`.
    pub fn key(user_id: &str, code: &str) -> String {
        format!("{REPLAY_KEY_PREFIX}:{user_id}:{code}")
    }

    /// Runs `verifier` on `code` unless it was accepted before.
    ///
    /// The code is only recorded after the verifier accepted it. A store failure while recording
    /// is returned as an error, the caller must then treat the login as failed.
    pub fn verify<S, F, E>(
        store: &mut S,
        user_id: &str,
        code: &str,
        verifier: F,
    ) -> Result<TotpVerdict, ReplayError<S::Error, E>>
    where
        S: ReplayStore,
        F: FnOnce(&str) -> Result<bool, E>,
        E: StdError,
    {
        let key = Self::key(user_id, code);

        if store.get(&key).map_err(ReplayError::Store)?.is_some() {
            debug!(user_id, "rejected replayed one-time code");
            return Ok(TotpVerdict::Replayed);
        }

        if !verifier(code).map_err(ReplayError::Verifier)? {
            return Ok(TotpVerdict::Rejected);
        }

        store.set(&key, "1".to_string()).map_err(ReplayError::Store)?;
        Ok(TotpVerdict::Accepted)
    }
}

#[derive(Debug, Error)]
pub enum ReplayError<S, E>
where
    S: StdError,
    E: StdError,
{
    #[error("replay store failed: {0}")]
    Store(S),

    #[error("code verifier failed: {0}")]
    Verifier(E),
}
