//! Errors for block construction, finalization, and (de)serialization.

use thiserror::Error;

pub trait ErrorCode {
    fn code(&self) -> &'static str;
}

#[derive(Error, Debug)]
pub enum BlockError {
    #[error("cannot mutate a finalized block")]
    AlreadyFinalized,
    #[error("signing the header failed: {0}")]
    SignFailed(String),
    #[error("buffer too short decoding {what}: need {need}, have {have}")]
    Truncated {
        what: &'static str,
        need: usize,
        have: usize,
    },
    #[error("transaction decode failed: {0}")]
    Tx(#[from] rdchain_tx::TxError),
    #[error("type decode failed: {0}")]
    Types(#[from] rdchain_types::TypesError),
    #[error("transaction belongs to chain {found}, expected {expected}")]
    WrongChain { expected: u64, found: u64 },
    #[error("trailing bytes after decoding block body")]
    TrailingBytes,
}

impl ErrorCode for BlockError {
    fn code(&self) -> &'static str {
        match self {
            Self::AlreadyFinalized => "BLOCK_ALREADY_FINALIZED",
            Self::SignFailed(_) => "BLOCK_SIGN_FAILED",
            Self::Truncated { .. } => "BLOCK_TRUNCATED",
            Self::Tx(_) => "BLOCK_TX_DECODE_FAILED",
            Self::Types(_) => "BLOCK_TYPE_DECODE_FAILED",
            Self::WrongChain { .. } => "BLOCK_WRONG_CHAIN",
            Self::TrailingBytes => "BLOCK_TRAILING_BYTES",
        }
    }
}
