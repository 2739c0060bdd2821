// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message encoding and storage encryption.
//!
//! An encoded message is one flag byte followed by the payload:
//!
//! ```text
//! 0x00 || utf-8 bytes
//! 0x01 || zstd frame of the utf-8 bytes
//! ```
//!
//! Compression is only used when it makes the payload strictly smaller.
use std::io::Read;

use tracing::trace;

use crate::config::Config;
use crate::crypto::Rng;
use crate::crypto::x25519::{PublicKey, SecretKey};
use crate::error::{Error, InvalidBlobError};
use crate::seal::{open, seal};

/// Payload is stored as is.
pub const ENCODING_RAW: u8 = 0x00;

/// Payload is a zstd frame.
pub const ENCODING_ZSTD: u8 = 0x01;

/// Encodes `plaintext`, compressing it if that saves space.
pub fn encode_message(plaintext: &str, config: &Config) -> Vec<u8> {
    let bytes = plaintext.as_bytes();

    // Failing to compress is not an error, the raw form is always valid.
    if let Ok(compressed) = zstd::bulk::compress(bytes, config.compression_level) {
        if compressed.len() < bytes.len() {
            let mut encoded = Vec::with_capacity(1 + compressed.len());
            encoded.push(ENCODING_ZSTD);
            encoded.extend_from_slice(&compressed);
            return encoded;
        }
    }

    let mut encoded = Vec::with_capacity(1 + bytes.len());
    encoded.push(ENCODING_RAW);
    encoded.extend_from_slice(bytes);
    encoded
}

/// Decodes a message, detecting the encoding from its flag byte.
pub fn decode_message(encoded: &[u8], config: &Config) -> Result<String, Error> {
    let Some((flag, payload)) = encoded.split_first() else {
        return Err(InvalidBlobError::TooShort {
            expected: 1,
            actual: 0,
        }
        .into());
    };

    let bytes = match *flag {
        ENCODING_RAW => {
            if payload.len() > config.max_message_size {
                return Err(InvalidBlobError::TooLarge {
                    limit: config.max_message_size,
                }
                .into());
            }
            payload.to_vec()
        }
        ENCODING_ZSTD => decompress(payload, config.max_message_size)?,
        flag => return Err(InvalidBlobError::UnknownEncoding(flag).into()),
    };

    String::from_utf8(bytes).map_err(|_| InvalidBlobError::InvalidUtf8.into())
}

/// Encodes and seals a message to an epoch (or any other recipient) public key.
pub fn encrypt_message_for_storage(
    recipient: &PublicKey,
    plaintext: &str,
    config: &Config,
    rng: &Rng,
) -> Result<Vec<u8>, Error> {
    let encoded = encode_message(plaintext, config);
    trace!(
        plaintext_len = plaintext.len(),
        encoded_len = encoded.len(),
        "encoded message"
    );
    seal(recipient, &encoded, rng)
}

/// Opens and decodes a message created by [`encrypt_message_for_storage`].
pub fn decrypt_message(
    secret_key: &SecretKey,
    blob: &[u8],
    config: &Config,
) -> Result<String, Error> {
    let encoded = open(secret_key, blob)?;
    decode_message(&encoded, config)
}

/// Decompresses a zstd frame, refusing to produce more than `limit` bytes.
fn decompress(payload: &[u8], limit: usize) -> Result<Vec<u8>, Error> {
    let decoder =
        zstd::stream::read::Decoder::new(payload).map_err(|_| InvalidBlobError::Decompression)?;

    let mut bytes = Vec::new();
    decoder
        .take((limit as u64).saturating_add(1))
        .read_to_end(&mut bytes)
        .map_err(|_| InvalidBlobError::Decompression)?;

    if bytes.len() > limit {
        return Err(InvalidBlobError::TooLarge { limit }.into());
    }

    Ok(bytes)
}
