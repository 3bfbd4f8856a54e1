//! Pending `TxBlock` mempool.

use rdchain_tx::TxBlock;
use rdchain_types::Hash;
use std::collections::HashMap;

#[derive(Default)]
pub struct TxMempool {
    txs: HashMap<Hash, TxBlock>,
}

impl TxMempool {
    pub fn new() -> Self {
        TxMempool { txs: HashMap::new() }
    }

    pub fn len(&self) -> usize {
        self.txs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.txs.is_empty()
    }

    pub fn contains(&self, hash: &Hash) -> bool {
        self.txs.contains_key(hash)
    }

    pub fn insert(&mut self, tx: TxBlock) {
        self.txs.insert(tx.hash(), tx);
    }

    pub fn remove(&mut self, hash: &Hash) -> Option<TxBlock> {
        self.txs.remove(hash)
    }

    /// Every pending transaction, in an unspecified but stable order.
    pub fn iter(&self) -> impl Iterator<Item = &TxBlock> {
        self.txs.values()
    }

    pub fn clear(&mut self) {
        self.txs.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethereum_types::U256;
    use rdchain_types::{Address, PrivKey};

    fn sample_tx(nonce: u64) -> TxBlock {
        let key = PrivKey::from_bytes([3u8; 32]);
        TxBlock::new_signed(
            Address::from_bytes([0x22; 20]),
            U256::from(10u64),
            vec![],
            1,
            U256::from(nonce),
            U256::from(21_000u64),
            U256::from(1u64),
            &key,
        )
        .unwrap()
    }

    #[test]
    fn insert_then_contains_and_remove() {
        let mut pool = TxMempool::new();
        let tx = sample_tx(0);
        let hash = tx.hash();
        pool.insert(tx);
        assert!(pool.contains(&hash));
        assert_eq!(pool.len(), 1);
        assert!(pool.remove(&hash).is_some());
        assert!(pool.is_empty());
    }

    #[test]
    fn clear_drops_everything() {
        let mut pool = TxMempool::new();
        pool.insert(sample_tx(0));
        pool.insert(sample_tx(1));
        pool.clear();
        assert!(pool.is_empty());
    }
}
