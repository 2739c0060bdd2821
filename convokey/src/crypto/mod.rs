// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cryptographic primitives used by all higher layers.
//!
//! Nothing outside of this module touches the underlying cipher, curve or hash crates directly.
pub mod argon2;
pub mod hkdf;
mod rng;
mod secret;
pub mod sha2;
pub mod x25519;
pub mod xchacha20;

pub use rng::{Rng, RngError};
pub use secret::Secret;
