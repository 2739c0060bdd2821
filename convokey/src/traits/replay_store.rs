// SPDX-License-Identifier: MIT OR Apache-2.0

use std::error::Error;

/// Key-value cache remembering which one-time codes were already accepted.
///
/// Usually backed by the application's cache (Redis or similar) with an expiry of at least one
/// TOTP step window.
pub trait ReplayStore {
    type Error: Error;

    fn get(&self, key: &str) -> Result<Option<String>, Self::Error>;

    fn set(&mut self, key: &str, value: String) -> Result<(), Self::Error>;
}
