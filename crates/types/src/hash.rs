//! A fixed 32-byte content hash.

use crate::error::TypesError;
use ethereum_types::U256;
use rand::RngCore;
use std::fmt;
use std::str::FromStr;

/// A 32-byte keccak256 digest, block hash, or merkle node.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Hash([u8; 32]);

impl Hash {
    pub const fn zero() -> Self {
        Hash([0u8; 32])
    }

    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Hash(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.0.to_vec()
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, TypesError> {
        if bytes.len() != 32 {
            return Err(TypesError::LengthMismatch {
                what: "Hash",
                expected: 32,
                got: bytes.len(),
            });
        }
        let mut out = [0u8; 32];
        out.copy_from_slice(bytes);
        Ok(Hash(out))
    }

    /// Generates a random hash using a cryptographic RNG.
    pub fn random() -> Self {
        let mut out = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut out);
        Hash(out)
    }

    /// Interprets the hash as a big-endian unsigned 256-bit integer.
    pub fn to_u256(&self) -> U256 {
        U256::from_big_endian(&self.0)
    }

    /// Builds a hash from a big-endian unsigned 256-bit integer.
    pub fn from_u256(value: U256) -> Self {
        let mut out = [0u8; 32];
        value.to_big_endian(&mut out);
        Hash(out)
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }
}

impl AsRef<[u8]> for Hash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; 32]> for Hash {
    fn from(bytes: [u8; 32]) -> Self {
        Hash(bytes)
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash({})", self.to_hex())
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl FromStr for Hash {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(trimmed).map_err(|e| TypesError::InvalidHex(e.to_string()))?;
        Hash::from_slice(&bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn u256_roundtrip_is_big_endian() {
        let mut bytes = [0u8; 32];
        bytes[31] = 0x01;
        bytes[30] = 0x02;
        let h = Hash::from_bytes(bytes);
        let n = h.to_u256();
        assert_eq!(n, U256::from(0x0201u32));
        assert_eq!(Hash::from_u256(n), h);
    }

    #[test]
    fn hex_roundtrip() {
        let h = Hash::random();
        let s = h.to_hex();
        let parsed: Hash = s.parse().unwrap();
        assert_eq!(h, parsed);
    }

    #[test]
    fn rejects_wrong_length() {
        assert!(Hash::from_slice(&[0u8; 31]).is_err());
    }
}
