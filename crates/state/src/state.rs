//! Native ledger, pending-tx admission, and block validate/apply/create.

use crate::account::Account;
use crate::error::{RpcError, StateError};
use crate::mempool::TxMempool;
use ethereum_types::U256;
use parking_lot::Mutex;
use rdchain_block::{Block, FinalizedBlock};
use rdchain_rdpos::RdPos;
use rdchain_storage::ChainStore;
use rdchain_tx::TxBlock;
use rdchain_types::{Address, PrivKey};
use std::collections::HashMap;
use std::sync::Arc;

/// Holds a narrow `Arc` reference to chain storage (shared with `rdpos`/
/// `p2p`/`node`, not owned exclusively) and the pending `TxBlock` mempool.
pub struct State {
    storage: Arc<ChainStore>,
    tx_mempool: Mutex<TxMempool>,
}

fn total_cost(tx: &TxBlock) -> U256 {
    tx.value.saturating_add(tx.gas_price.saturating_mul(tx.gas_limit))
}

impl State {
    pub fn new(storage: Arc<ChainStore>) -> Self {
        State {
            storage,
            tx_mempool: Mutex::new(TxMempool::new()),
        }
    }

    fn load_account_or_zero(&self, addr: &Address) -> Result<Account, StateError> {
        match self.storage.get_native_account_raw(addr)? {
            Some(bytes) => Account::decode(&bytes),
            None => Ok(Account::default()),
        }
    }

    fn require_account(&self, addr: &Address) -> Result<Account, RpcError> {
        self.storage
            .get_native_account_raw(addr)
            .ok()
            .flatten()
            .map(|bytes| Account::decode(&bytes).unwrap_or_default())
            .ok_or_else(|| RpcError::account_not_found(*addr))
    }

    pub fn get_native_balance(&self, addr: &Address) -> U256 {
        self.load_account_or_zero(addr).map(|a| a.balance).unwrap_or_default()
    }

    pub fn get_native_nonce(&self, addr: &Address) -> U256 {
        U256::from(self.load_account_or_zero(addr).map(|a| a.nonce).unwrap_or_default())
    }

    pub fn mempool_len(&self) -> usize {
        self.tx_mempool.lock().len()
    }

    /// Admits a pending transaction to the mempool: not already pending, the
    /// sender exists with sufficient balance, and the nonce matches exactly.
    pub fn validate_tx_for_rpc(&self, tx: TxBlock) -> Result<(), RpcError> {
        let hash = tx.hash();
        let mut mempool = self.tx_mempool.lock();
        if mempool.contains(&hash) {
            return Err(RpcError::already_in_mempool(hash));
        }

        let account = self.require_account(&tx.from)?;
        let cost = total_cost(&tx);
        if account.balance < cost {
            return Err(RpcError::insufficient_balance(account.balance, cost));
        }
        if U256::from(account.nonce) != tx.nonce {
            return Err(RpcError::invalid_nonce(U256::from(account.nonce), tx.nonce));
        }

        mempool.insert(tx);
        Ok(())
    }

    /// Simulates a transaction list against a scratch ledger seeded from
    /// storage. Returns the final per-address balances so callers can choose
    /// to persist them (`process_next_block`) or discard them
    /// (`validate_next_block`).
    fn simulate(&self, txs: &[TxBlock]) -> Result<HashMap<Address, Account>, StateError> {
        let mut scratch: HashMap<Address, Account> = HashMap::new();
        for tx in txs {
            if self.storage.get_tx(&tx.hash())?.is_some() {
                return Err(StateError::TxAlreadyProcessed(tx.hash()));
            }

            let mut from_acc = match scratch.get(&tx.from) {
                Some(acc) => *acc,
                None => self.require_account(&tx.from)?,
            };
            let cost = total_cost(tx);
            if from_acc.balance < cost {
                return Err(RpcError::insufficient_balance(from_acc.balance, cost).into());
            }
            if U256::from(from_acc.nonce) != tx.nonce {
                return Err(RpcError::invalid_nonce(U256::from(from_acc.nonce), tx.nonce).into());
            }
            from_acc.balance -= cost;
            from_acc.nonce = from_acc.nonce.saturating_add(1);
            scratch.insert(tx.from, from_acc);

            let mut to_acc = match scratch.get(&tx.to) {
                Some(acc) => *acc,
                None => self.load_account_or_zero(&tx.to)?,
            };
            to_acc.balance = to_acc.balance.saturating_add(tx.value);
            scratch.insert(tx.to, to_acc);
        }
        Ok(scratch)
    }

    /// `block.prev_hash`/`block.n_height` chain onto storage's latest block,
    /// `rdpos` accepts the block, and every transaction simulates cleanly.
    pub fn validate_next_block(&self, block: &FinalizedBlock, rdpos: &RdPos) -> Result<(), StateError> {
        let latest = self.storage.latest()?.ok_or(StateError::NoLatestBlock)?;
        if block.header.prev_hash != latest.hash() {
            return Err(StateError::WrongPrevHash {
                expected: latest.hash(),
                found: block.header.prev_hash,
            });
        }
        let expected_height = latest.header.n_height + 1;
        if block.header.n_height != expected_height {
            return Err(StateError::WrongHeight {
                expected: expected_height,
                found: block.header.n_height,
            });
        }

        rdpos.validate_block(block)?;
        self.simulate(&block.txs)?;
        Ok(())
    }

    /// Applies every transaction, advances `rdpos` to the next round, pushes
    /// the block onto storage, and clears the pending mempool.
    pub fn process_next_block(&self, block: Arc<FinalizedBlock>, rdpos: &mut RdPos) -> Result<(), StateError> {
        let scratch = self.simulate(&block.txs)?;
        for (addr, acc) in &scratch {
            self.storage.put_native_account_raw(addr, &acc.encode())?;
        }

        rdpos.process_block(&block);
        self.storage.push_block(block)?;
        self.tx_mempool.lock().clear();
        Ok(())
    }

    /// Assembles a new block from the pending mempool and the validator
    /// votes rdpos is currently holding for this height, then signs it.
    /// Proposer-only: callers are responsible for confirming `priv_key`
    /// derives `rdpos.proposer()`.
    ///
    /// `validator_txs` is built in the canonical order `validate_block` will
    /// later enforce: the `MIN_VALIDATORS` commits in `rdpos.randomizers()`
    /// order, followed by the matching reveals in that same order.
    pub fn create_new_block(
        &self,
        chain_id: u64,
        priv_key: &PrivKey,
        rdpos: &RdPos,
        timestamp: u64,
    ) -> Result<FinalizedBlock, StateError> {
        let latest = self.storage.latest()?.ok_or(StateError::NoLatestBlock)?;
        let next_height = latest.header.n_height + 1;

        let mut block = Block::new(chain_id, latest.hash(), next_height);
        for tx in self.tx_mempool.lock().iter() {
            block.append_tx(tx.clone())?;
        }

        let commits = rdpos.mempool().commits_for_height(next_height);
        let reveals = rdpos.mempool().reveals_for_height(next_height);

        let mut ordered_commits = Vec::with_capacity(rdpos.randomizers().len());
        let mut ordered_reveals = Vec::with_capacity(rdpos.randomizers().len());
        for addr in rdpos.randomizers() {
            let commit = commits
                .iter()
                .find(|tx| tx.from == *addr)
                .ok_or(StateError::MissingValidatorVote(*addr))?;
            let reveal = reveals
                .iter()
                .find(|tx| tx.from == *addr && tx.reveals(commit))
                .ok_or(StateError::MissingValidatorVote(*addr))?;
            ordered_commits.push((*commit).clone());
            ordered_reveals.push((*reveal).clone());
        }
        for tx in ordered_commits.into_iter().chain(ordered_reveals) {
            block.append_validator_tx(tx)?;
        }

        Ok(block.finalize(priv_key, timestamp)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rdchain_storage::GenesisConfig;

    fn open_store(validators: Vec<Address>) -> (Arc<ChainStore>, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = ChainStore::open(
            dir.path().join("chain.redb"),
            1,
            GenesisConfig { timestamp: 1, validators },
            10,
        )
        .unwrap();
        (Arc::new(store), dir)
    }

    fn funded_key() -> PrivKey {
        PrivKey::from_bytes([8u8; 32])
    }

    #[test]
    fn get_native_balance_defaults_to_zero_for_unknown_address() {
        let (storage, _dir) = open_store(vec![Address::from_bytes([1u8; 20])]);
        let state = State::new(storage);
        assert_eq!(state.get_native_balance(&Address::zero()), U256::zero());
    }

    #[test]
    fn validate_tx_for_rpc_rejects_unfunded_account() {
        let (storage, _dir) = open_store(vec![Address::from_bytes([1u8; 20])]);
        let state = State::new(storage);
        let key = funded_key();
        let tx = TxBlock::new_signed(
            Address::from_bytes([2u8; 20]),
            U256::from(10u64),
            vec![],
            1,
            U256::zero(),
            U256::from(21_000u64),
            U256::from(1u64),
            &key,
        )
        .unwrap();
        assert!(matches!(
            state.validate_tx_for_rpc(tx),
            Err(e) if e.code == RpcError::ACCOUNT_NOT_FOUND
        ));
    }

    #[test]
    fn validate_tx_for_rpc_admits_funded_sender_and_updates_mempool() {
        let (storage, _dir) = open_store(vec![Address::from_bytes([1u8; 20])]);
        let key = funded_key();
        let from = key.derive_address().unwrap();
        storage
            .put_native_account_raw(
                &from,
                &Account {
                    balance: U256::from(1_000_000u64),
                    nonce: 0,
                }
                .encode(),
            )
            .unwrap();
        let state = State::new(storage);

        let tx = TxBlock::new_signed(
            Address::from_bytes([2u8; 20]),
            U256::from(10u64),
            vec![],
            1,
            U256::zero(),
            U256::from(21_000u64),
            U256::from(1u64),
            &key,
        )
        .unwrap();
        state.validate_tx_for_rpc(tx).unwrap();
        assert_eq!(state.mempool_len(), 1);
    }

    #[test]
    fn validate_tx_for_rpc_rejects_stale_nonce() {
        let (storage, _dir) = open_store(vec![Address::from_bytes([1u8; 20])]);
        let key = funded_key();
        let from = key.derive_address().unwrap();
        storage
            .put_native_account_raw(
                &from,
                &Account {
                    balance: U256::from(1_000_000u64),
                    nonce: 3,
                }
                .encode(),
            )
            .unwrap();
        let state = State::new(storage);

        let tx = TxBlock::new_signed(
            Address::from_bytes([2u8; 20]),
            U256::from(10u64),
            vec![],
            1,
            U256::zero(),
            U256::from(21_000u64),
            U256::from(1u64),
            &key,
        )
        .unwrap();
        assert!(matches!(
            state.validate_tx_for_rpc(tx),
            Err(e) if e.code == RpcError::INVALID_NONCE
        ));
    }
}
