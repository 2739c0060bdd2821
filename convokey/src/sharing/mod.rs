// SPDX-License-Identifier: MIT OR Apache-2.0

//! Link-based sharing.
//!
//! Both schemes put a random 32-byte secret into a URL fragment, which browsers never send to the
//! server. The secret is the whole security boundary: whoever holds the link holds the access.
mod invite;
mod message_share;

pub use invite::{LinkSecret, derive_keys_from_link_secret, wrap_epoch_key_for_new_member};
pub use message_share::{MessageShare, ShareSecret, create_message_share, decrypt_message_share};

use crate::error::{Error, InvalidBlobError};

/// Size of link and share secrets.
pub const SHARE_SECRET_SIZE: usize = 32;

/// Decodes a lowercase or uppercase hex URL fragment into a fixed-size secret.
fn secret_from_hex(fragment: &str) -> Result<zeroize::Zeroizing<[u8; SHARE_SECRET_SIZE]>, Error> {
    let mut bytes = zeroize::Zeroizing::new([0u8; SHARE_SECRET_SIZE]);
    hex::decode_to_slice(fragment.trim().trim_start_matches('#'), bytes.as_mut_slice())
        .map_err(|_| InvalidBlobError::InvalidHex)?;
    Ok(bytes)
}
