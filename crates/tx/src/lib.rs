//! # rdchain Transactions
//!
//! The two signed transaction shapes used by the core: [`TxBlock`], an
//! EVM-compatible value/data transfer, and [`TxValidator`], a consensus
//! vote (commit or reveal) used by the rdPoS randomness protocol.
#![cfg_attr(
    not(test),
    deny(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::indexing_slicing
    )
)]

pub mod error;
pub mod tx_block;
pub mod tx_validator;

pub use error::TxError;
pub use tx_block::TxBlock;
pub use tx_validator::{TxValidator, COMMIT_SELECTOR, REVEAL_SELECTOR};
