//! `TxBlock`: a signed, EVM-compatible, EIP-155 transaction.

use crate::error::TxError;
use ethereum_types::U256;
use rdchain_types::rlp_util::{chain_id_from_v, ensure_exact_consumption, v_from_chain_id};
use rdchain_types::{Address, Hash, Signature};
use rlp::{Rlp, RlpStream};

/// A signed EVM-compatible transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TxBlock {
    pub to: Address,
    pub value: U256,
    pub data: Vec<u8>,
    pub chain_id: u64,
    pub nonce: U256,
    pub gas_limit: U256,
    pub gas_price: U256,
    pub v: u64,
    pub r: U256,
    pub s: U256,
    /// Derived at decode time (or trusted from the database suffix); never
    /// part of the canonical encoding.
    pub from: Address,
}

const FIELD_COUNT: usize = 9;

impl TxBlock {
    /// Builds and signs a new `TxBlock`.
    pub fn new_signed(
        to: Address,
        value: U256,
        data: Vec<u8>,
        chain_id: u64,
        nonce: U256,
        gas_limit: U256,
        gas_price: U256,
        priv_key: &rdchain_types::PrivKey,
    ) -> Result<Self, TxError> {
        let unsigned_hash = Self::signing_hash(&to, value, &data, chain_id, nonce, gas_limit, gas_price);
        let raw_sig = rdchain_crypto::sign(unsigned_hash.as_bytes(), priv_key.as_bytes())
            .map_err(|_| TxError::InvalidSignature)?;
        let sig = Signature::from_bytes(raw_sig);
        let parity = sig.v();
        let v = v_from_chain_id(chain_id, parity);
        let r = U256::from_big_endian(sig.r());
        let s = U256::from_big_endian(sig.s());
        let upub = priv_key.derive_upubkey().map_err(|_| TxError::InvalidSignature)?;
        let from = Address::from_uncompressed_pubkey(upub.as_bytes());

        Ok(TxBlock {
            to,
            value,
            data,
            chain_id,
            nonce,
            gas_limit,
            gas_price,
            v,
            r,
            s,
            from,
        })
    }

    fn signing_hash(
        to: &Address,
        value: U256,
        data: &[u8],
        chain_id: u64,
        nonce: U256,
        gas_limit: U256,
        gas_price: U256,
    ) -> Hash {
        let mut stream = RlpStream::new_list(FIELD_COUNT);
        stream.append(&nonce);
        stream.append(&gas_price);
        stream.append(&gas_limit);
        stream.append(&to.as_bytes().to_vec());
        stream.append(&value);
        stream.append(&data);
        stream.append(&chain_id);
        stream.append(&0u8);
        stream.append(&0u8);
        Hash::from_bytes(rdchain_crypto::keccak256(&stream.out()))
    }

    fn encode_fields(&self, stream: &mut RlpStream) {
        stream.begin_list(FIELD_COUNT);
        stream.append(&self.nonce);
        stream.append(&self.gas_price);
        stream.append(&self.gas_limit);
        stream.append(&self.to.as_bytes().to_vec());
        stream.append(&self.value);
        stream.append(&self.data);
        stream.append(&self.v);
        stream.append(&self.r);
        stream.append(&self.s);
    }

    /// The canonical signed RLP encoding (no database sender suffix).
    pub fn encode_signed(&self) -> Vec<u8> {
        let mut stream = RlpStream::new();
        self.encode_fields(&mut stream);
        stream.out().to_vec()
    }

    /// The database encoding: signed RLP followed by the 20-byte sender,
    /// which is never hashed and exists only to skip re-running ecrecover
    /// on load.
    pub fn encode_db(&self) -> Vec<u8> {
        let mut out = self.encode_signed();
        out.extend_from_slice(self.from.as_bytes());
        out
    }

    /// `keccak256` of the signed RLP bytes (sender suffix excluded).
    pub fn hash(&self) -> Hash {
        Hash::from_bytes(rdchain_crypto::keccak256(&self.encode_signed()))
    }

    fn decode_fields(bytes: &[u8]) -> Result<(U256, U256, U256, Address, U256, Vec<u8>, u64, U256, U256), TxError> {
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

        let nonce: U256 = rlp.val_at(0).map_err(|e| TxError::Rlp(e.to_string()))?;
        let gas_price: U256 = rlp.val_at(1).map_err(|e| TxError::Rlp(e.to_string()))?;
        let gas_limit: U256 = rlp.val_at(2).map_err(|e| TxError::Rlp(e.to_string()))?;
        let to_bytes: Vec<u8> = rlp.val_at(3).map_err(|e| TxError::Rlp(e.to_string()))?;
        let to = Address::from_slice(&to_bytes).map_err(TxError::from)?;
        let value: U256 = rlp.val_at(4).map_err(|e| TxError::Rlp(e.to_string()))?;
        let data: Vec<u8> = rlp.val_at(5).map_err(|e| TxError::Rlp(e.to_string()))?;
        let v: u64 = rlp.val_at(6).map_err(|e| TxError::Rlp(e.to_string()))?;
        let r: U256 = rlp.val_at(7).map_err(|e| TxError::Rlp(e.to_string()))?;
        let s: U256 = rlp.val_at(8).map_err(|e| TxError::Rlp(e.to_string()))?;

        Ok((nonce, gas_price, gas_limit, to, value, data, v, r, s))
    }

    /// Decodes the network wire form: always recovers `from` via ecrecover.
    pub fn decode(bytes: &[u8]) -> Result<Self, TxError> {
        let (nonce, gas_price, gas_limit, to, value, data, v, r, s) = Self::decode_fields(bytes)?;
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

        let unsigned_hash = Self::signing_hash(&to, value, &data, chain_id, nonce, gas_limit, gas_price);
        let upub = rdchain_crypto::recover(&raw_sig, unsigned_hash.as_bytes())
            .ok_or(TxError::RecoveryFailed)?;
        let from = Address::from_uncompressed_pubkey(&upub);

        Ok(TxBlock {
            to,
            value,
            data,
            chain_id,
            nonce,
            gas_limit,
            gas_price,
            v,
            r,
            s,
            from,
        })
    }

    /// Decodes the database form (signed RLP followed by a trusted 20-byte
    /// sender). Never runs ecrecover.
    pub fn decode_trusted(bytes: &[u8]) -> Result<Self, TxError> {
        if bytes.len() < 20 {
            return Err(TxError::Rlp("db-encoded tx shorter than sender suffix".into()));
        }
        let (rlp_bytes, sender_bytes) = bytes.split_at(bytes.len() - 20);
        let (nonce, gas_price, gas_limit, to, value, data, v, r, s) = Self::decode_fields(rlp_bytes)?;
        let chain_id = chain_id_from_v(v).ok_or(TxError::LegacySignature(v))?;
        let from = Address::from_slice(sender_bytes).map_err(TxError::from)?;

        Ok(TxBlock {
            to,
            value,
            data,
            chain_id,
            nonce,
            gas_limit,
            gas_price,
            v,
            r,
            s,
            from,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_key() -> rdchain_types::PrivKey {
        rdchain_types::PrivKey::from_bytes([11u8; 32])
    }

    #[test]
    fn sign_then_decode_recovers_same_sender() {
        let key = sample_key();
        let tx = TxBlock::new_signed(
            Address::from_bytes([0x42; 20]),
            U256::from(1_000u64),
            vec![0xde, 0xad, 0xbe, 0xef],
            7,
            U256::from(3u64),
            U256::from(21_000u64),
            U256::from(20_000_000_000u64),
            &key,
        )
        .unwrap();

        let encoded = tx.encode_signed();
        let decoded = TxBlock::decode(&encoded).unwrap();
        assert_eq!(decoded.from, tx.from);
        assert_eq!(decoded, tx);
        assert_eq!(decoded.hash(), tx.hash());
    }

    #[test]
    fn db_roundtrip_skips_ecrecover_but_matches() {
        let key = sample_key();
        let tx = TxBlock::new_signed(
            Address::from_bytes([0x7; 20]),
            U256::zero(),
            vec![],
            99,
            U256::zero(),
            U256::from(21_000u64),
            U256::from(1u64),
            &key,
        )
        .unwrap();

        let db_bytes = tx.encode_db();
        let decoded = TxBlock::decode_trusted(&db_bytes).unwrap();
        assert_eq!(decoded, tx);
    }

    #[test]
    fn rejects_legacy_v() {
        let key = sample_key();
        let mut tx = TxBlock::new_signed(
            Address::from_bytes([1; 20]),
            U256::zero(),
            vec![],
            1,
            U256::zero(),
            U256::from(21_000u64),
            U256::from(1u64),
            &key,
        )
        .unwrap();
        tx.v = 27;
        let encoded = tx.encode_signed();
        assert!(matches!(TxBlock::decode(&encoded), Err(TxError::LegacySignature(27))));
    }

    #[test]
    fn rejects_trailing_garbage_after_rlp() {
        let key = sample_key();
        let tx = TxBlock::new_signed(
            Address::from_bytes([2; 20]),
            U256::zero(),
            vec![],
            1,
            U256::zero(),
            U256::from(21_000u64),
            U256::from(1u64),
            &key,
        )
        .unwrap();
        let mut encoded = tx.encode_signed();
        encoded.push(0xff);
        assert!(TxBlock::decode(&encoded).is_err());
    }
}
