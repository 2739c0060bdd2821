// SPDX-License-Identifier: MIT OR Apache-2.0

//! Helpers for tests of this crate and of applications integrating it.
use std::collections::HashMap;
use std::convert::Infallible;

use thiserror::Error;

use crate::traits::ReplayStore;

/// Installs a `tracing` subscriber when `RUST_LOG` is set.
pub fn setup_logging() {
    if std::env::var("RUST_LOG").is_ok() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .try_init();
    }
}

/// Replay store keeping everything in memory.
#[derive(Clone, Debug, Default)]
pub struct MemoryReplayStore {
    entries: HashMap<String, String>,
}

impl MemoryReplayStore {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ReplayStore for MemoryReplayStore {
    type Error = Infallible;

    fn get(&self, key: &str) -> Result<Option<String>, Self::Error> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), Self::Error> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }
}

#[derive(Debug, Error)]
#[error("store unavailable")]
pub struct StoreUnavailable;

/// Replay store which is always down.
#[derive(Clone, Copy, Debug, Default)]
pub struct FailingReplayStore;

impl ReplayStore for FailingReplayStore {
    type Error = StoreUnavailable;

    fn get(&self, _key: &str) -> Result<Option<String>, Self::Error> {
        Err(StoreUnavailable)
    }

    fn set(&mut self, _key: &str, _value: String) -> Result<(), Self::Error> {
        Err(StoreUnavailable)
    }
}
