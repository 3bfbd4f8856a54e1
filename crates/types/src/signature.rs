//! A fixed 65-byte `r || s || v` ECDSA signature.

use crate::error::TypesError;
use rdchain_crypto::ecdsa::{in_curve_order, SECP256K1_ORDER};

/// `r(32) || s(32) || v(1)`, produced in low-s canonical form by
/// [`rdchain_crypto::sign`].
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Signature([u8; 65]);

impl Signature {
    pub const fn from_bytes(bytes: [u8; 65]) -> Self {
        Signature(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 65] {
        &self.0
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, TypesError> {
        if bytes.len() != 65 {
            return Err(TypesError::LengthMismatch {
                what: "Signature",
                expected: 65,
                got: bytes.len(),
            });
        }
        let mut out = [0u8; 65];
        out.copy_from_slice(bytes);
        Ok(Signature(out))
    }

    pub fn r(&self) -> &[u8] {
        &self.0[0..32]
    }

    pub fn s(&self) -> &[u8] {
        &self.0[32..64]
    }

    pub fn v(&self) -> u8 {
        self.0[64]
    }

    fn r_array(&self) -> [u8; 32] {
        let mut out = [0u8; 32];
        out.copy_from_slice(self.r());
        out
    }

    fn s_array(&self) -> [u8; 32] {
        let mut out = [0u8; 32];
        out.copy_from_slice(self.s());
        out
    }

    /// `r, s ∈ (0, n)` and `v ∈ {0, 1}` (post-normalization).
    pub fn is_valid(&self) -> bool {
        in_curve_order(&self.r_array()) && in_curve_order(&self.s_array()) && self.v() <= 1
    }

    /// A signature with all-zero components, used as a placeholder before a
    /// block is finalized.
    pub const fn empty() -> Self {
        Signature([0u8; 65])
    }

    pub fn is_empty(&self) -> bool {
        self.0 == [0u8; 65]
    }
}

impl std::fmt::Debug for Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Signature(0x{})", hex::encode(self.0))
    }
}

/// Re-exported so callers never need to depend on `rdchain-crypto` directly
/// just to check `SECP256K1_ORDER`.
pub const CURVE_ORDER: [u8; 32] = SECP256K1_ORDER;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_signature_is_invalid() {
        assert!(!Signature::empty().is_valid());
    }

    #[test]
    fn real_signature_is_valid() {
        let priv_key = [9u8; 32];
        let msg = rdchain_crypto::keccak256(b"sig validity");
        let raw = rdchain_crypto::sign(&msg, &priv_key).unwrap();
        let sig = Signature::from_bytes(raw);
        assert!(sig.is_valid());
    }

    #[test]
    fn v_above_one_is_invalid() {
        let mut raw = [1u8; 65];
        raw[64] = 2;
        let sig = Signature::from_bytes(raw);
        assert!(!sig.is_valid());
    }
}
