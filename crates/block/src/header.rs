//! Canonical block header layout.
//!
//! Wire order: `prev_hash(32) || [sig(65)] || randomness(32) ||
//! validator_tx_merkle_root(32) || tx_merkle_root(32) || timestamp(8) ||
//! n_height(8) || validator_tx_count(4) || tx_count(4)`.
//!
//! The signature is present only in the *signed* (post-finalize) form; the
//! unsigned form is what gets hashed and signed during finalization.

use crate::error::BlockError;
use rdchain_types::{enc, Hash, Signature};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Header {
    pub prev_hash: Hash,
    pub sig: Signature,
    pub randomness: Hash,
    pub validator_tx_merkle_root: Hash,
    pub tx_merkle_root: Hash,
    pub timestamp: u64,
    pub n_height: u64,
    pub validator_tx_count: u32,
    pub tx_count: u32,
}

impl Header {
    pub fn encode(&self, include_sig: bool) -> Vec<u8> {
        let mut out = Vec::with_capacity(if include_sig { 217 } else { 152 });
        out.extend_from_slice(self.prev_hash.as_bytes());
        if include_sig {
            out.extend_from_slice(self.sig.as_bytes());
        }
        out.extend_from_slice(self.randomness.as_bytes());
        out.extend_from_slice(self.validator_tx_merkle_root.as_bytes());
        out.extend_from_slice(self.tx_merkle_root.as_bytes());
        out.extend_from_slice(&enc::encode_u64(self.timestamp));
        out.extend_from_slice(&enc::encode_u64(self.n_height));
        out.extend_from_slice(&enc::encode_u32(self.validator_tx_count));
        out.extend_from_slice(&enc::encode_u32(self.tx_count));
        out
    }

    pub fn decode(bytes: &[u8], include_sig: bool) -> Result<Self, BlockError> {
        let want = if include_sig { 217 } else { 152 };
        if bytes.len() != want {
            return Err(BlockError::Truncated {
                what: "header",
                need: want,
                have: bytes.len(),
            });
        }

        fn take<'a>(bytes: &'a [u8], cursor: &mut usize, n: usize) -> Result<&'a [u8], BlockError> {
            let slice = bytes.get(*cursor..*cursor + n).ok_or(BlockError::Truncated {
                what: "header field",
                need: *cursor + n,
                have: bytes.len(),
            })?;
            *cursor += n;
            Ok(slice)
        }

        let mut cursor = 0usize;
        let prev_hash = Hash::from_bytes(enc::decode_32(take(bytes, &mut cursor, 32)?)?);

        let sig = if include_sig {
            Signature::from_slice(take(bytes, &mut cursor, 65)?)?
        } else {
            Signature::empty()
        };

        let randomness = Hash::from_bytes(enc::decode_32(take(bytes, &mut cursor, 32)?)?);
        let validator_tx_merkle_root = Hash::from_bytes(enc::decode_32(take(bytes, &mut cursor, 32)?)?);
        let tx_merkle_root = Hash::from_bytes(enc::decode_32(take(bytes, &mut cursor, 32)?)?);
        let timestamp = enc::decode_u64(take(bytes, &mut cursor, 8)?)?;
        let n_height = enc::decode_u64(take(bytes, &mut cursor, 8)?)?;
        let validator_tx_count = enc::decode_u32(take(bytes, &mut cursor, 4)?)?;
        let tx_count = enc::decode_u32(take(bytes, &mut cursor, 4)?)?;

        debug_assert_eq!(cursor, want);

        Ok(Header {
            prev_hash,
            sig,
            randomness,
            validator_tx_merkle_root,
            tx_merkle_root,
            timestamp,
            n_height,
            validator_tx_count,
            tx_count,
        })
    }

    pub fn hash(&self, include_sig: bool) -> Hash {
        Hash::from_bytes(rdchain_crypto::keccak256(&self.encode(include_sig)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(sig: Signature) -> Header {
        Header {
            prev_hash: Hash::random(),
            sig,
            randomness: Hash::random(),
            validator_tx_merkle_root: Hash::random(),
            tx_merkle_root: Hash::random(),
            timestamp: 1_700_000_000,
            n_height: 42,
            validator_tx_count: 4,
            tx_count: 7,
        }
    }

    #[test]
    fn unsigned_roundtrip() {
        let header = sample(Signature::empty());
        let encoded = header.encode(false);
        assert_eq!(encoded.len(), 152);
        let decoded = Header::decode(&encoded, false).unwrap();
        assert_eq!(decoded.prev_hash, header.prev_hash);
        assert_eq!(decoded.n_height, header.n_height);
    }

    #[test]
    fn signed_roundtrip_includes_signature() {
        let raw = rdchain_crypto::sign(&[7u8; 32], &[9u8; 32]).unwrap();
        let header = sample(Signature::from_bytes(raw));
        let encoded = header.encode(true);
        assert_eq!(encoded.len(), 217);
        let decoded = Header::decode(&encoded, true).unwrap();
        assert_eq!(decoded.sig.as_bytes(), header.sig.as_bytes());
    }

    #[test]
    fn unsigned_and_signed_hashes_differ() {
        let raw = rdchain_crypto::sign(&[1u8; 32], &[2u8; 32]).unwrap();
        let header = sample(Signature::from_bytes(raw));
        assert_ne!(header.hash(false), header.hash(true));
    }

    #[test]
    fn rejects_wrong_length() {
        assert!(Header::decode(&[0u8; 100], false).is_err());
    }
}
