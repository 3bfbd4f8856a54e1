//! A fixed 20-byte account address, derived from a secp256k1 public key.

use crate::error::TypesError;
use std::fmt;
use std::str::FromStr;

/// `keccak256(pubkey_uncompressed[1..65])[12..32]`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Address([u8; 20]);

impl Address {
    pub const fn zero() -> Self {
        Address([0u8; 20])
    }

    pub const fn from_bytes(bytes: [u8; 20]) -> Self {
        Address(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.0.to_vec()
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, TypesError> {
        if bytes.len() != 20 {
            return Err(TypesError::LengthMismatch {
                what: "Address",
                expected: 20,
                got: bytes.len(),
            });
        }
        let mut out = [0u8; 20];
        out.copy_from_slice(bytes);
        Ok(Address(out))
    }

    /// Derives the address from a 65-byte uncompressed secp256k1 public key.
    pub fn from_uncompressed_pubkey(upub: &[u8; 65]) -> Self {
        Address(rdchain_crypto::upub_to_address(upub))
    }

    /// Lower-case hex with `0x` prefix (no checksum casing).
    pub fn to_hex_lower(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    /// EIP-55 mixed-case checksum encoding: a hex nibble of the address is
    /// upper-cased iff the corresponding nibble of
    /// `keccak256(lowercase_hex_without_0x)` is `>= 8`.
    pub fn to_checksum(&self) -> String {
        let lower = hex::encode(self.0);
        let digest = rdchain_crypto::keccak256(lower.as_bytes());

        let mut out = String::with_capacity(42);
        out.push_str("0x");
        for (i, c) in lower.chars().enumerate() {
            if c.is_ascii_digit() {
                out.push(c);
                continue;
            }
            let nibble = if i % 2 == 0 {
                digest[i / 2] >> 4
            } else {
                digest[i / 2] & 0x0f
            };
            if nibble >= 8 {
                out.push(c.to_ascii_uppercase());
            } else {
                out.push(c);
            }
        }
        out
    }

    /// Validates that `s` is a correctly-checksummed EIP-55 representation
    /// of `self` (case-sensitive).
    pub fn is_checksum(&self, s: &str) -> bool {
        s == self.to_checksum()
    }
}

impl AsRef<[u8]> for Address {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; 20]> for Address {
    fn from(bytes: [u8; 20]) -> Self {
        Address(bytes)
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_checksum())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_checksum())
    }
}

impl FromStr for Address {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(trimmed).map_err(|e| TypesError::InvalidHex(e.to_string()))?;
        Address::from_slice(&bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derivation_matches_crypto_primitive() {
        let priv_key = [7u8; 32];
        let upub = rdchain_crypto::derive_upubkey(&priv_key).unwrap();
        let addr = Address::from_uncompressed_pubkey(&upub);
        let expected = rdchain_crypto::upub_to_address(&upub);
        assert_eq!(addr.as_bytes(), &expected);
    }

    #[test]
    fn checksum_roundtrips_through_parse() {
        let addr = Address::from_bytes([0xabu8; 20]);
        let checksummed = addr.to_checksum();
        let parsed: Address = checksummed.parse().unwrap();
        assert_eq!(addr, parsed);
        assert!(addr.is_checksum(&checksummed));
    }

    #[test]
    fn known_eip55_vector() {
        // From EIP-55's own test vectors.
        let addr: Address = "0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed"
            .parse()
            .unwrap();
        assert_eq!(addr.to_checksum(), "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed");
    }
}
