//! # rdchain Crypto
//!
//! Cryptographic primitives for the rdchain core: keccak256 hashing and
//! secp256k1 ECDSA sign/recover/verify. Operates on raw byte arrays so
//! that higher layers (`rdchain-types`) can wrap results in their own
//! newtypes without creating a dependency cycle.
#![cfg_attr(
    not(test),
    deny(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::indexing_slicing
    )
)]

pub mod ecdsa;
pub mod error;
pub mod keccak;

pub use ecdsa::{
    derive_pubkey, derive_upubkey, in_curve_order, recover, sign, upub_to_address, verify,
};
pub use error::CryptoError;
pub use keccak::{keccak256, keccak256_concat};
