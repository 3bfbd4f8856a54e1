//! Mutable [`Block`] under construction, and the immutable [`FinalizedBlock`]
//! produced by [`Block::finalize`].

use crate::error::BlockError;
use crate::header::Header;
use rdchain_tx::{TxBlock, TxValidator};
use rdchain_types::{enc, Hash, MerkleTree, Signature};

/// A block still accepting transactions, not yet signed or hash-linked into
/// the chain. `prev_hash` and `n_height` are fixed at construction; every
/// other header field is recomputed by [`finalize`](Block::finalize).
#[derive(Clone, Debug)]
pub struct Block {
    pub chain_id: u64,
    pub prev_hash: Hash,
    pub n_height: u64,
    pub validator_txs: Vec<TxValidator>,
    pub txs: Vec<TxBlock>,
}

impl Block {
    pub fn new(chain_id: u64, prev_hash: Hash, n_height: u64) -> Self {
        Block {
            chain_id,
            prev_hash,
            n_height,
            validator_txs: Vec::new(),
            txs: Vec::new(),
        }
    }

    pub fn append_tx(&mut self, tx: TxBlock) -> Result<(), BlockError> {
        if tx.chain_id != self.chain_id {
            return Err(BlockError::WrongChain {
                expected: self.chain_id,
                found: tx.chain_id,
            });
        }
        self.txs.push(tx);
        Ok(())
    }

    pub fn append_validator_tx(&mut self, tx: TxValidator) -> Result<(), BlockError> {
        if tx.chain_id != self.chain_id {
            return Err(BlockError::WrongChain {
                expected: self.chain_id,
                found: tx.chain_id,
            });
        }
        self.validator_txs.push(tx);
        Ok(())
    }

    /// Randomness for this block is `keccak256` of the concatenated reveal
    /// secrets, in the order the reveal votes were appended. Non-reveal
    /// validator txs (commits) contribute nothing.
    fn compute_randomness(&self) -> Hash {
        let mut buf = Vec::new();
        for vtx in &self.validator_txs {
            if let Some(secret) = vtx.as_reveal() {
                buf.extend_from_slice(secret);
            }
        }
        Hash::from_bytes(rdchain_crypto::keccak256(&buf))
    }

    fn merkle_roots(&self) -> (Hash, Hash) {
        let tx_leaves: Vec<Hash> = self.txs.iter().map(TxBlock::hash).collect();
        let vtx_leaves: Vec<Hash> = self.validator_txs.iter().map(TxValidator::hash).collect();
        (MerkleTree::build(&vtx_leaves).root(), MerkleTree::build(&tx_leaves).root())
    }

    /// Recomputes merkle roots and randomness, signs the resulting unsigned
    /// header with `priv_key`, and freezes the block. This is a one-shot
    /// operation: the returned [`FinalizedBlock`] is immutable.
    pub fn finalize(self, priv_key: &rdchain_types::PrivKey, new_timestamp: u64) -> Result<FinalizedBlock, BlockError> {
        let (validator_tx_merkle_root, tx_merkle_root) = self.merkle_roots();
        let randomness = self.compute_randomness();

        let validator_tx_count = u32::try_from(self.validator_txs.len()).unwrap_or(u32::MAX);
        let tx_count = u32::try_from(self.txs.len()).unwrap_or(u32::MAX);

        let mut header = Header {
            prev_hash: self.prev_hash,
            sig: Signature::empty(),
            randomness,
            validator_tx_merkle_root,
            tx_merkle_root,
            timestamp: new_timestamp,
            n_height: self.n_height,
            validator_tx_count,
            tx_count,
        };

        let unsigned_hash = header.hash(false);
        let raw_sig = rdchain_crypto::sign(unsigned_hash.as_bytes(), priv_key.as_bytes())
            .map_err(|e| BlockError::SignFailed(e.to_string()))?;
        header.sig = Signature::from_bytes(raw_sig);

        Ok(FinalizedBlock {
            chain_id: self.chain_id,
            header,
            validator_txs: self.validator_txs,
            txs: self.txs,
        })
    }
}

/// A signed, immutable block. `hash()` is the signed header hash and is what
/// chains to the next block's `prev_hash`.
#[derive(Clone, Debug)]
pub struct FinalizedBlock {
    pub chain_id: u64,
    pub header: Header,
    pub validator_txs: Vec<TxValidator>,
    pub txs: Vec<TxBlock>,
}

fn encode_len_prefixed(out: &mut Vec<u8>, bytes: &[u8]) {
    let len = u32::try_from(bytes.len()).unwrap_or(u32::MAX);
    out.extend_from_slice(&enc::encode_u32(len));
    out.extend_from_slice(bytes);
}

fn read_len_prefixed<'a>(bytes: &'a [u8], cursor: &mut usize, what: &'static str) -> Result<&'a [u8], BlockError> {
    let len = enc::decode_u32(bytes.get(*cursor..*cursor + 4).ok_or(BlockError::Truncated {
        what,
        need: *cursor + 4,
        have: bytes.len(),
    })?)? as usize;
    *cursor += 4;
    let slice = bytes.get(*cursor..*cursor + len).ok_or(BlockError::Truncated {
        what,
        need: *cursor + len,
        have: bytes.len(),
    })?;
    *cursor += len;
    Ok(slice)
}

impl FinalizedBlock {
    pub fn hash(&self) -> Hash {
        self.header.hash(true)
    }

    fn serialize(&self, tx_bytes: impl Fn(&TxBlock) -> Vec<u8>) -> Vec<u8> {
        let mut out = self.header.encode(true);
        for vtx in &self.validator_txs {
            encode_len_prefixed(&mut out, &vtx.encode());
        }
        for tx in &self.txs {
            encode_len_prefixed(&mut out, &tx_bytes(tx));
        }
        out
    }

    /// The wire form sent over the P2P overlay: signed header plus
    /// length-prefixed votes and transactions, transactions carrying no
    /// sender suffix (receivers always ecrecover).
    pub fn serialize_network(&self) -> Vec<u8> {
        self.serialize(TxBlock::encode_signed)
    }

    /// The on-disk form: identical to the network form except each
    /// transaction carries a trusted sender suffix so reload skips ecrecover.
    pub fn serialize_db(&self) -> Vec<u8> {
        self.serialize(TxBlock::encode_db)
    }

    fn deserialize(
        bytes: &[u8],
        chain_id: u64,
        decode_tx: impl Fn(&[u8]) -> Result<TxBlock, rdchain_tx::TxError>,
    ) -> Result<Self, BlockError> {
        let header = Header::decode(bytes.get(..217).ok_or(BlockError::Truncated {
            what: "header",
            need: 217,
            have: bytes.len(),
        })?, true)?;
        let mut cursor = 217usize;

        let mut validator_txs = Vec::with_capacity(header.validator_tx_count as usize);
        for _ in 0..header.validator_tx_count {
            let raw = read_len_prefixed(bytes, &mut cursor, "validator_tx")?;
            let vtx = TxValidator::decode(raw)?;
            if vtx.chain_id != chain_id {
                return Err(BlockError::WrongChain {
                    expected: chain_id,
                    found: vtx.chain_id,
                });
            }
            validator_txs.push(vtx);
        }

        let mut txs = Vec::with_capacity(header.tx_count as usize);
        for _ in 0..header.tx_count {
            let raw = read_len_prefixed(bytes, &mut cursor, "tx")?;
            let tx = decode_tx(raw)?;
            if tx.chain_id != chain_id {
                return Err(BlockError::WrongChain {
                    expected: chain_id,
                    found: tx.chain_id,
                });
            }
            txs.push(tx);
        }

        if cursor != bytes.len() {
            return Err(BlockError::TrailingBytes);
        }

        Ok(FinalizedBlock {
            chain_id,
            header,
            validator_txs,
            txs,
        })
    }

    pub fn deserialize_network(bytes: &[u8], chain_id: u64) -> Result<Self, BlockError> {
        Self::deserialize(bytes, chain_id, TxBlock::decode)
    }

    pub fn deserialize_db(bytes: &[u8], chain_id: u64) -> Result<Self, BlockError> {
        Self::deserialize(bytes, chain_id, TxBlock::decode_trusted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethereum_types::U256;
    use rdchain_types::{Address, PrivKey};

    fn proposer_key() -> PrivKey {
        PrivKey::from_bytes([4u8; 32])
    }

    fn sample_tx(nonce: u64, key: &PrivKey) -> TxBlock {
        TxBlock::new_signed(
            Address::from_bytes([0x11; 20]),
            U256::from(100u64),
            vec![],
            1,
            U256::from(nonce),
            U256::from(21_000u64),
            U256::from(1u64),
            key,
        )
        .unwrap()
    }

    #[test]
    fn finalize_sets_signed_hash_and_merkle_roots() {
        let key = proposer_key();
        let mut block = Block::new(1, Hash::zero(), 1);
        block.append_tx(sample_tx(0, &key)).unwrap();
        block.append_tx(sample_tx(1, &key)).unwrap();

        let finalized = block.finalize(&key, 1_000).unwrap();
        assert_eq!(finalized.header.tx_count, 2);
        assert_ne!(finalized.header.tx_merkle_root, Hash::zero());
        assert_eq!(finalized.hash(), finalized.header.hash(true));
        assert_ne!(finalized.hash(), finalized.header.hash(false));
    }

    #[test]
    fn randomness_is_keccak_of_reveal_secrets_in_order() {
        let key = proposer_key();
        let mut block = Block::new(1, Hash::zero(), 1);
        let s1 = [0x01u8; 32];
        let s2 = [0x02u8; 32];
        block
            .append_validator_tx(TxValidator::new_reveal(&s1, 1, 1, &key).unwrap())
            .unwrap();
        block
            .append_validator_tx(TxValidator::new_reveal(&s2, 1, 1, &key).unwrap())
            .unwrap();

        let finalized = block.finalize(&key, 1_000).unwrap();
        let mut expected = Vec::new();
        expected.extend_from_slice(&s1);
        expected.extend_from_slice(&s2);
        assert_eq!(finalized.header.randomness, Hash::from_bytes(rdchain_crypto::keccak256(&expected)));
    }

    #[test]
    fn network_roundtrip() {
        let key = proposer_key();
        let mut block = Block::new(5, Hash::random(), 9);
        block.append_tx(sample_tx(0, &key)).unwrap();
        let finalized = block.finalize(&key, 42).unwrap();

        let wire = finalized.serialize_network();
        let decoded = FinalizedBlock::deserialize_network(&wire, 5).unwrap();
        assert_eq!(decoded.hash(), finalized.hash());
        assert_eq!(decoded.txs.len(), 1);
        assert_eq!(decoded.txs[0].from, finalized.txs[0].from);
    }

    #[test]
    fn db_roundtrip_skips_ecrecover() {
        let key = proposer_key();
        let mut block = Block::new(5, Hash::random(), 9);
        block.append_tx(sample_tx(0, &key)).unwrap();
        let finalized = block.finalize(&key, 42).unwrap();

        let db_bytes = finalized.serialize_db();
        let decoded = FinalizedBlock::deserialize_db(&db_bytes, 5).unwrap();
        assert_eq!(decoded.hash(), finalized.hash());
    }

    #[test]
    fn rejects_tx_from_wrong_chain() {
        let key = proposer_key();
        let mut block = Block::new(1, Hash::zero(), 1);
        let foreign_tx = TxBlock::new_signed(
            Address::from_bytes([0x11; 20]),
            U256::zero(),
            vec![],
            2,
            U256::zero(),
            U256::from(21_000u64),
            U256::from(1u64),
            &key,
        )
        .unwrap();
        assert!(matches!(
            block.append_tx(foreign_tx),
            Err(BlockError::WrongChain { expected: 1, found: 2 })
        ));
    }

    #[test]
    fn deserialize_rejects_trailing_bytes() {
        let key = proposer_key();
        let block = Block::new(1, Hash::zero(), 1);
        let finalized = block.finalize(&key, 1).unwrap();
        let mut wire = finalized.serialize_network();
        wire.push(0xff);
        assert!(FinalizedBlock::deserialize_network(&wire, 1).is_err());
    }
}
