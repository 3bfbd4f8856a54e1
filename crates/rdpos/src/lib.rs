//! Validator rotation, two-phase randomness, and block validation for rdPoS.
#![cfg_attr(
    not(test),
    deny(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::indexing_slicing
    )
)]

pub mod constants;
pub mod error;
pub mod mempool;
pub mod random_gen;
pub mod rdpos;

pub use constants::MIN_VALIDATORS;
pub use error::RdPosError;
pub use mempool::ValidatorMempool;
pub use random_gen::RandomGen;
pub use rdpos::{recompute_randomness, RdPos};
