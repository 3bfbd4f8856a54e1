//! Errors for decoding and constructing transactions.

use thiserror::Error;

pub trait ErrorCode {
    fn code(&self) -> &'static str;
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TxError {
    #[error("rlp decode error: {0}")]
    Rlp(String),
    #[error("expected an rlp list header")]
    NotAList,
    #[error("expected {expected} rlp fields, got {got}")]
    WrongFieldCount { expected: usize, got: usize },
    #[error("legacy (pre-EIP-155) signatures are not accepted: v = {0}")]
    LegacySignature(u64),
    #[error("ecrecover failed")]
    RecoveryFailed,
    #[error("signature is not in canonical low-s / normalized-v form")]
    InvalidSignature,
    #[error("reveal secret does not match its commit hash")]
    CommitRevealMismatch,
    #[error("unrecognized validator-tx selector")]
    UnknownSelector,
}

impl ErrorCode for TxError {
    fn code(&self) -> &'static str {
        match self {
            Self::Rlp(_) => "TX_RLP_DECODE_ERROR",
            Self::NotAList => "TX_NOT_A_LIST",
            Self::WrongFieldCount { .. } => "TX_WRONG_FIELD_COUNT",
            Self::LegacySignature(_) => "TX_LEGACY_SIGNATURE_REJECTED",
            Self::RecoveryFailed => "TX_RECOVERY_FAILED",
            Self::InvalidSignature => "TX_INVALID_SIGNATURE",
            Self::CommitRevealMismatch => "TX_COMMIT_REVEAL_MISMATCH",
            Self::UnknownSelector => "TX_UNKNOWN_SELECTOR",
        }
    }
}

impl From<rdchain_types::TypesError> for TxError {
    fn from(e: rdchain_types::TypesError) -> Self {
        TxError::Rlp(e.to_string())
    }
}
