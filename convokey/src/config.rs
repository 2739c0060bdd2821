// SPDX-License-Identifier: MIT OR Apache-2.0

use serde::{Deserialize, Serialize};

use crate::crypto::argon2::Argon2Params;

/// Default upper bound for a decoded message, 16 MiB.
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 16 * 1024 * 1024;

/// Default zstd compression level.
pub const DEFAULT_COMPRESSION_LEVEL: i32 = 3;

/// Configuration of the key-management core.
///
/// Can be embedded in the host application's own configuration file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Cost of the memory-hard hash on the recovery-phrase path.
    ///
    /// Changing these parameters after accounts were created makes their recovery wraps
    /// unreadable.
    pub recovery_kdf: Argon2Params,

    /// Messages which decompress to more than this many bytes are rejected.
    pub max_message_size: usize,

    /// zstd level used when encoding messages.
    pub compression_level: i32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            recovery_kdf: Argon2Params::default(),
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
            compression_level: DEFAULT_COMPRESSION_LEVEL,
        }
    }
}

#[cfg(any(test, feature = "test_utils"))]
impl Config {
    /// Configuration with a light Argon2 profile so tests don't allocate 64 MiB per hash.
    pub fn insecure_for_tests() -> Self {
        Self {
            recovery_kdf: Argon2Params::insecure_for_tests(),
            ..Default::default()
        }
    }
}
