//! # rdchain Types
//!
//! Core data structures shared across the rdchain workspace: content
//! hashes, addresses, signatures, key material, canonical fixed-width
//! encodings, RLP helpers, and the merkle tree used for block transaction
//! roots.
#![cfg_attr(
    not(test),
    deny(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::indexing_slicing
    )
)]

pub mod address;
pub mod enc;
pub mod error;
pub mod hash;
pub mod keys;
pub mod merkle;
pub mod rlp_util;
pub mod signature;

pub use address::Address;
pub use error::TypesError;
pub use hash::Hash;
pub use keys::{PrivKey, PubKey, UPubKey};
pub use merkle::MerkleTree;
pub use signature::Signature;
