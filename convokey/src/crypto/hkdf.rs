// SPDX-License-Identifier: MIT OR Apache-2.0

//! Hashed Message Authentication Code (HMAC)-based key derivation function (HKDF) using
//! "hash-mode" with SHA256.
//!
//! <https://www.rfc-editor.org/rfc/rfc5869>
use hkdf::Hkdf;
use sha2::Sha256;
use thiserror::Error;

/// Derives `N` bytes of output keying material.
///
/// An empty `salt` is treated as "no salt", in which case HKDF falls back to a zero-filled salt of
/// hash length.
pub fn hkdf<const N: usize>(salt: &[u8], ikm: &[u8], info: &[u8]) -> Result<[u8; N], HkdfError> {
    let salt = if salt.is_empty() { None } else { Some(salt) };
    let hk = Hkdf::<Sha256>::new(salt, ikm);
    let mut okm = [0u8; N];
    hk.expand(info, &mut okm)
        .map_err(|_| HkdfError::InvalidArguments)?;
    Ok(okm)
}

#[derive(Debug, Error)]
pub enum HkdfError {
    #[error("arguments too large for hkdf")]
    InvalidArguments,
}

#[cfg(test)]
mod tests {
    use super::{HkdfError, hkdf};

    #[test]
    fn info_needs_to_match() {
        let result_1: [u8; 32] = hkdf(b"salt", b"ikm", b"info").unwrap();
        let result_2: [u8; 32] = hkdf(b"salt", b"ikm", b"info").unwrap();
        let result_3: [u8; 32] = hkdf(b"salt", b"ikm", b"different info").unwrap();
        assert_eq!(result_1, result_2);
        assert_ne!(result_2, result_3);
    }

    #[test]
    fn salt_needs_to_match() {
        let result_1: [u8; 32] = hkdf(b"salt", b"ikm", b"info").unwrap();
        let result_2: [u8; 32] = hkdf(b"other salt", b"ikm", b"info").unwrap();
        assert_ne!(result_1, result_2);
    }

    #[test]
    fn rfc5869_test_case_1() {
        let ikm = [0x0b; 22];
        let salt = hex::decode("000102030405060708090a0b0c").unwrap();
        let info = hex::decode("f0f1f2f3f4f5f6f7f8f9").unwrap();
        let okm: [u8; 42] = hkdf(&salt, &ikm, &info).unwrap();
        assert_eq!(
            hex::encode(okm),
            "3cb25f25faacd57a90434f64d0362f2a2d2d0a90cf1a5a4c5db02d56ecc4c5bf34007208d5b887185865"
        );
    }

    #[test]
    fn output_too_long() {
        let result: Result<[u8; 255 * 32 + 1], HkdfError> = hkdf(b"salt", b"ikm", b"info");
        assert!(matches!(result, Err(HkdfError::InvalidArguments)));
    }
}
