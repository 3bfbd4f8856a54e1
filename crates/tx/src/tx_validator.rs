//! `TxValidator`: a signed consensus vote (commit or reveal).

use crate::error::TxError;
use rdchain_types::rlp_util::{chain_id_from_v, ensure_exact_consumption, v_from_chain_id};
use rdchain_types::{Address, Hash, Signature};
use rlp::{Rlp, RlpStream};

/// 4-byte function selector for a commit vote: `0xcfffe746 || keccak256(secret)`.
pub const COMMIT_SELECTOR: [u8; 4] = [0xcf, 0xff, 0xe7, 0x46];
/// 4-byte function selector for a reveal vote: `0x6fc5a2d6 || secret`.
pub const REVEAL_SELECTOR: [u8; 4] = [0x6f, 0xc5, 0xa2, 0xd6];

const FIELD_COUNT: usize = 5;

/// A signed consensus-layer vote. `data` carries one of two recognized
/// shapes, distinguished by a 4-byte selector: a randomness commit or a
/// randomness reveal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TxValidator {
    pub data: Vec<u8>,
    pub n_height: u64,
    pub chain_id: u64,
    pub v: u64,
    pub r: ethereum_types::U256,
    pub s: ethereum_types::U256,
    pub from: Address,
}

impl TxValidator {
    pub fn new_commit(
        secret: &[u8; 32],
        n_height: u64,
        chain_id: u64,
        priv_key: &rdchain_types::PrivKey,
    ) -> Result<Self, TxError> {
        let commit_hash = rdchain_crypto::keccak256(secret);
        let mut data = Vec::with_capacity(36);
        data.extend_from_slice(&COMMIT_SELECTOR);
        data.extend_from_slice(&commit_hash);
        Self::new_signed(data, n_height, chain_id, priv_key)
    }

    pub fn new_reveal(
        secret: &[u8; 32],
        n_height: u64,
        chain_id: u64,
        priv_key: &rdchain_types::PrivKey,
    ) -> Result<Self, TxError> {
        let mut data = Vec::with_capacity(36);
        data.extend_from_slice(&REVEAL_SELECTOR);
        data.extend_from_slice(secret);
        Self::new_signed(data, n_height, chain_id, priv_key)
    }

    fn new_signed(
        data: Vec<u8>,
        n_height: u64,
        chain_id: u64,
        priv_key: &rdchain_types::PrivKey,
    ) -> Result<Self, TxError> {
        let unsigned_hash = Self::signing_hash(&data, n_height, chain_id);
        let raw_sig = rdchain_crypto::sign(unsigned_hash.as_bytes(), priv_key.as_bytes())
            .map_err(|_| TxError::InvalidSignature)?;
        let sig = Signature::from_bytes(raw_sig);
        let v = v_from_chain_id(chain_id, sig.v());
        let r = ethereum_types::U256::from_big_endian(sig.r());
        let s = ethereum_types::U256::from_big_endian(sig.s());
        let upub = priv_key.derive_upubkey().map_err(|_| TxError::InvalidSignature)?;
        let from = Address::from_uncompressed_pubkey(upub.as_bytes());
        Ok(TxValidator {
            data,
            n_height,
            chain_id,
            v,
            r,
            s,
            from,
        })
    }

    fn signing_hash(data: &[u8], n_height: u64, chain_id: u64) -> Hash {
        let mut stream = RlpStream::new_list(FIELD_COUNT);
        stream.append(&data);
        stream.append(&n_height);
        stream.append(&chain_id);
        stream.append(&0u8);
        stream.append(&0u8);
        Hash::from_bytes(rdchain_crypto::keccak256(&stream.out()))
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut stream = RlpStream::new_list(FIELD_COUNT);
        stream.append(&self.data);
        stream.append(&self.n_height);
        stream.append(&self.v);
        stream.append(&self.r);
        stream.append(&self.s);
        stream.out().to_vec()
    }

    pub fn hash(&self) -> Hash {
        Hash::from_bytes(rdchain_crypto::keccak256(&self.encode()))
    }

    /// `from` is always recovered via ecrecover; there is no database-trust
    /// shortcut for validator votes.
    pub fn decode(bytes: &[u8]) -> Result<Self, TxError> {
        let rlp = Rlp::new(bytes);
        ensure_exact_consumption(&rlp, bytes.len())?;
        if !rlp.is_list() {
            return Err(TxError::NotAList);
        }
        let item_count = rlp.item_count().map_err(|e| TxError::Rlp(e.to_string()))?;
        if item_count != FIELD_COUNT {
            return Err(TxError::WrongFieldCount {
                expected: FIELD_COUNT,
                got: item_count,
            });
        }

        let data: Vec<u8> = rlp.val_at(0).map_err(|e| TxError::Rlp(e.to_string()))?;
        let n_height: u64 = rlp.val_at(1).map_err(|e| TxError::Rlp(e.to_string()))?;
        let v: u64 = rlp.val_at(2).map_err(|e| TxError::Rlp(e.to_string()))?;
        let r: ethereum_types::U256 = rlp.val_at(3).map_err(|e| TxError::Rlp(e.to_string()))?;
        let s: ethereum_types::U256 = rlp.val_at(4).map_err(|e| TxError::Rlp(e.to_string()))?;

        let chain_id = chain_id_from_v(v).ok_or(TxError::LegacySignature(v))?;
        let parity = rdchain_types::rlp_util::recovery_parity_from_v(v);

        let mut r_bytes = [0u8; 32];
        r.to_big_endian(&mut r_bytes);
        let mut s_bytes = [0u8; 32];
        s.to_big_endian(&mut s_bytes);
        let mut raw_sig = [0u8; 65];
        raw_sig[0..32].copy_from_slice(&r_bytes);
        raw_sig[32..64].copy_from_slice(&s_bytes);
        raw_sig[64] = parity;

        let unsigned_hash = Self::signing_hash(&data, n_height, chain_id);
        let upub = rdchain_crypto::recover(&raw_sig, unsigned_hash.as_bytes())
            .ok_or(TxError::RecoveryFailed)?;
        let from = Address::from_uncompressed_pubkey(&upub);

        Ok(TxValidator {
            data,
            n_height,
            chain_id,
            v,
            r,
            s,
            from,
        })
    }

    /// `Some(commit_hash)` if `data` carries the commit selector.
    pub fn as_commit(&self) -> Option<&[u8]> {
        if self.data.len() == 36 && self.data[0..4] == COMMIT_SELECTOR {
            Some(&self.data[4..])
        } else {
            None
        }
    }

    /// `Some(secret)` if `data` carries the reveal selector.
    pub fn as_reveal(&self) -> Option<&[u8]> {
        if self.data.len() == 36 && self.data[0..4] == REVEAL_SELECTOR {
            Some(&self.data[4..])
        } else {
            None
        }
    }

    /// Checks that `self` is a reveal whose secret hashes to `commit`'s
    /// committed value.
    pub fn reveals(&self, commit: &TxValidator) -> bool {
        match (self.as_reveal(), commit.as_commit()) {
            (Some(secret), Some(commit_hash)) => {
                rdchain_crypto::keccak256(secret).as_slice() == commit_hash
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> rdchain_types::PrivKey {
        rdchain_types::PrivKey::from_bytes([5u8; 32])
    }

    #[test]
    fn commit_then_reveal_roundtrip_and_link() {
        let secret = [0x42u8; 32];
        let k = key();
        let commit = TxValidator::new_commit(&secret, 10, 1, &k).unwrap();
        let reveal = TxValidator::new_reveal(&secret, 10, 1, &k).unwrap();

        let commit_decoded = TxValidator::decode(&commit.encode()).unwrap();
        let reveal_decoded = TxValidator::decode(&reveal.encode()).unwrap();

        assert_eq!(commit_decoded.from, commit.from);
        assert_eq!(reveal_decoded.from, reveal.from);
        assert!(reveal_decoded.reveals(&commit_decoded));
    }

    #[test]
    fn reveal_does_not_link_to_unrelated_commit() {
        let k = key();
        let commit = TxValidator::new_commit(&[1u8; 32], 5, 1, &k).unwrap();
        let reveal = TxValidator::new_reveal(&[2u8; 32], 5, 1, &k).unwrap();
        assert!(!reveal.reveals(&commit));
    }
}
