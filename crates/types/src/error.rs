//! Error types for decoding and constructing core data types.

use thiserror::Error;

pub trait ErrorCode {
    fn code(&self) -> &'static str;
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TypesError {
    #[error("invalid byte length for {what}: expected {expected}, got {got}")]
    LengthMismatch {
        what: &'static str,
        expected: usize,
        got: usize,
    },
    #[error("invalid hex string: {0}")]
    InvalidHex(String),
    #[error("invalid signature: {0}")]
    InvalidSignature(String),
}

impl ErrorCode for TypesError {
    fn code(&self) -> &'static str {
        match self {
            Self::LengthMismatch { .. } => "TYPES_LENGTH_MISMATCH",
            Self::InvalidHex(_) => "TYPES_INVALID_HEX",
            Self::InvalidSignature(_) => "TYPES_INVALID_SIGNATURE",
        }
    }
}
