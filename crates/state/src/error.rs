//! Internal state errors and RPC-facing transaction error codes.

use ethereum_types::U256;
use rdchain_types::{Address, Hash};
use thiserror::Error;

pub trait ErrorCode {
    fn code(&self) -> &'static str;
}

#[derive(Error, Debug)]
pub enum StateError {
    #[error("storage error: {0}")]
    Storage(#[from] rdchain_storage::StorageError),
    #[error("block error: {0}")]
    Block(#[from] rdchain_block::BlockError),
    #[error("rdpos error: {0}")]
    RdPos(#[from] rdchain_rdpos::RdPosError),
    #[error("corrupt {what}: expected 36 bytes, got {len}")]
    Corrupt { what: &'static str, len: usize },
    #[error("no latest block in storage")]
    NoLatestBlock,
    #[error("block prev_hash {found} does not match latest {expected}")]
    WrongPrevHash { expected: Hash, found: Hash },
    #[error("block height {found} is not latest+1 ({expected})")]
    WrongHeight { expected: u64, found: u64 },
    #[error("transaction {0} already applied in an earlier block")]
    TxAlreadyProcessed(Hash),
    #[error("transaction rejected: {0}")]
    TxRejected(#[from] RpcError),
    #[error("no linked commit/reveal pair from randomizer {0} for this height yet")]
    MissingValidatorVote(Address),
}

impl ErrorCode for StateError {
    fn code(&self) -> &'static str {
        match self {
            Self::Storage(_) => "STATE_STORAGE_ERROR",
            Self::Block(_) => "STATE_BLOCK_ERROR",
            Self::RdPos(_) => "STATE_RDPOS_ERROR",
            Self::Corrupt { .. } => "STATE_CORRUPT_ACCOUNT",
            Self::NoLatestBlock => "STATE_NO_LATEST_BLOCK",
            Self::WrongPrevHash { .. } => "STATE_WRONG_PREV_HASH",
            Self::WrongHeight { .. } => "STATE_WRONG_HEIGHT",
            Self::TxAlreadyProcessed(_) => "STATE_TX_ALREADY_PROCESSED",
            Self::TxRejected(_) => "STATE_TX_REJECTED",
            Self::MissingValidatorVote(_) => "STATE_MISSING_VALIDATOR_VOTE",
        }
    }
}

/// A non-fatal, JSON-RPC-style transaction admission error. `code` is part
/// of the RPC-facing contract; callers match on the associated constants
/// rather than the `Display` text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message} (code {code})")]
pub struct RpcError {
    pub code: i64,
    pub message: String,
}

impl RpcError {
    pub const INVALID_NONCE: i64 = -32001;
    pub const INSUFFICIENT_BALANCE: i64 = -32002;
    pub const ACCOUNT_NOT_FOUND: i64 = -32003;
    /// Not part of `spec.md`'s three named codes; `-32000` is the low end of
    /// JSON-RPC's reserved server-error range, used here for the
    /// non-protocol "already known" case.
    pub const ALREADY_IN_MEMPOOL: i64 = -32000;

    pub fn account_not_found(addr: Address) -> Self {
        RpcError {
            code: Self::ACCOUNT_NOT_FOUND,
            message: format!("account {addr} not found"),
        }
    }

    pub fn insufficient_balance(have: U256, need: U256) -> Self {
        RpcError {
            code: Self::INSUFFICIENT_BALANCE,
            message: format!("insufficient balance: have {have}, need {need}"),
        }
    }

    pub fn invalid_nonce(expected: U256, got: U256) -> Self {
        RpcError {
            code: Self::INVALID_NONCE,
            message: format!("invalid nonce: expected {expected}, got {got}"),
        }
    }

    pub fn already_in_mempool(hash: Hash) -> Self {
        RpcError {
            code: Self::ALREADY_IN_MEMPOOL,
            message: format!("transaction {hash} already in mempool"),
        }
    }
}
