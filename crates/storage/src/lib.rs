//! # rdchain Storage
//!
//! A bounded in-memory hot window backed by a durable `redb` database, with
//! prefixed keyspaces for blocks, height/transaction indices, native account
//! balances, and the validator set.
#![cfg_attr(
    not(test),
    deny(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::indexing_slicing
    )
)]

pub mod error;
pub mod keyspace;
pub mod store;

pub use error::StorageError;
pub use store::{ChainStore, GenesisConfig, DEFAULT_WINDOW_CAPACITY};

#[cfg(test)]
mod tests {
    use super::*;
    use rdchain_types::Address;
    use std::sync::Arc;

    fn open_temp(window_capacity: usize) -> (ChainStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("chain.redb");
        let genesis = GenesisConfig {
            timestamp: 1_700_000_000,
            validators: vec![Address::from_bytes([1; 20]), Address::from_bytes([2; 20])],
        };
        let store = ChainStore::open(&path, 1, genesis, window_capacity).expect("open store");
        (store, dir)
    }

    #[test]
    fn fresh_store_synthesizes_genesis() {
        let (store, _dir) = open_temp(10);
        let latest = store.latest().unwrap().expect("genesis present");
        assert_eq!(latest.header.n_height, 0);
        assert_eq!(store.validators().unwrap().len(), 2);
    }

    #[test]
    fn push_block_is_retrievable_by_hash_and_height() {
        let (store, _dir) = open_temp(10);
        let genesis = store.latest().unwrap().unwrap();

        let block = rdchain_block::Block::new(1, genesis.hash(), 1);
        let key = rdchain_types::PrivKey::from_bytes([9u8; 32]);
        let finalized = Arc::new(block.finalize(&key, 2_000).unwrap());

        store.push_block(finalized.clone()).unwrap();

        let by_hash = store.get_block_by_hash(&finalized.hash()).unwrap().unwrap();
        assert_eq!(by_hash.header.n_height, 1);
        let by_height = store.get_block_by_height(1).unwrap().unwrap();
        assert_eq!(by_height.hash(), finalized.hash());
        assert_eq!(store.latest().unwrap().unwrap().hash(), finalized.hash());
    }

    #[test]
    fn hot_window_evicts_but_durable_lookup_still_works() {
        let (store, _dir) = open_temp(2);
        let key = rdchain_types::PrivKey::from_bytes([3u8; 32]);
        let mut prev_hash = store.latest().unwrap().unwrap().hash();

        let mut first_hash = None;
        for h in 1..=5u64 {
            let block = rdchain_block::Block::new(1, prev_hash, h);
            let finalized = Arc::new(block.finalize(&key, 1_000 + h).unwrap());
            if h == 1 {
                first_hash = Some(finalized.hash());
            }
            prev_hash = finalized.hash();
            store.push_block(finalized).unwrap();
        }

        // Window capacity is 2; the height-1 block has been evicted from the
        // hot window but must still be readable from durable storage.
        let hash = first_hash.unwrap();
        let found = store.get_block_by_hash(&hash).unwrap();
        assert!(found.is_some());
    }
}
