// SPDX-License-Identifier: MIT OR Apache-2.0

//! Interfaces to the collaborators this crate relies on but does not implement.
mod replay_store;

pub use replay_store::ReplayStore;
