//! Error type for the `rdchain-crypto` crate.

use thiserror::Error;

/// A stable, machine-readable code for a crypto failure.
pub trait ErrorCode {
    fn code(&self) -> &'static str;
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    #[error("secp256k1 signing failed: {0}")]
    SignFailed(String),
    #[error("secp256k1 recovery failed: {0}")]
    RecoveryFailed(String),
    #[error("invalid recovery id {0}")]
    InvalidRecoveryId(u8),
    #[error("invalid digest length: expected 32, got {0}")]
    InvalidDigestLength(usize),
    #[error("invalid signature length: expected 65, got {0}")]
    InvalidSignatureLength(usize),
}

impl ErrorCode for CryptoError {
    fn code(&self) -> &'static str {
        match self {
            Self::SignFailed(_) => "CRYPTO_SIGN_FAILED",
            Self::RecoveryFailed(_) => "CRYPTO_RECOVERY_FAILED",
            Self::InvalidRecoveryId(_) => "CRYPTO_INVALID_RECOVERY_ID",
            Self::InvalidDigestLength(_) => "CRYPTO_INVALID_DIGEST_LENGTH",
            Self::InvalidSignatureLength(_) => "CRYPTO_INVALID_SIGNATURE_LENGTH",
        }
    }
}
