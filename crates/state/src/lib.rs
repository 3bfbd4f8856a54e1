//! Native account ledger, tx mempool, and block validate/apply/create.
#![cfg_attr(
    not(test),
    deny(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::indexing_slicing
    )
)]

pub mod account;
pub mod error;
pub mod mempool;
pub mod state;

pub use account::Account;
pub use error::{RpcError, StateError};
pub use mempool::TxMempool;
pub use state::State;
