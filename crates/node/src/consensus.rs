//! The validator worker: proposer and randomizer roles for rdPoS.
//!
//! The wire protocol defines no pull command for pending `TxBlock`s (only
//! `RequestValidatorTxs` exists in the command table), so unlike the
//! validator-vote path, the proposer does not actively pull transactions —
//! it waits for the mempool to fill from local RPC submission or inbound
//! `BroadcastTx` gossip.

use crate::error::NodeError;
use parking_lot::Mutex;
use rdchain_p2p::{Command, Manager, NodeType};
use rdchain_rdpos::{RdPos, MIN_VALIDATORS};
use rdchain_state::State;
use rdchain_storage::ChainStore;
use rdchain_tx::TxValidator;
use rdchain_types::PrivKey;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone, Debug)]
pub struct ConsensusConfig {
    pub spin_sleep: Duration,
    pub request_every_n_attempts: u32,
    pub request_timeout: Duration,
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        ConsensusConfig {
            spin_sleep: Duration::from_micros(10),
            request_every_n_attempts: 10,
            request_timeout: Duration::from_secs(2),
        }
    }
}

pub struct ConsensusWorker {
    chain_id: u64,
    priv_key: PrivKey,
    storage: Arc<ChainStore>,
    state: Arc<State>,
    rdpos: Arc<Mutex<RdPos>>,
    manager: Arc<Manager>,
    config: ConsensusConfig,
    stop: Arc<AtomicBool>,
}

impl ConsensusWorker {
    pub fn new(
        chain_id: u64,
        priv_key: PrivKey,
        storage: Arc<ChainStore>,
        state: Arc<State>,
        rdpos: Arc<Mutex<RdPos>>,
        manager: Arc<Manager>,
        config: ConsensusConfig,
        stop: Arc<AtomicBool>,
    ) -> Self {
        ConsensusWorker {
            chain_id,
            priv_key,
            storage,
            state,
            rdpos,
            manager,
            config,
            stop,
        }
    }

    fn stopped(&self) -> bool {
        self.stop.load(Ordering::Relaxed)
    }

    /// Runs until the stop flag is set. Intended to be spawned on its own
    /// task; a bug that surfaces as an `Err` here means a self-proposed
    /// block failed its own validation, which should not happen.
    pub async fn run(mut self) -> Result<(), NodeError> {
        let me = self.priv_key.derive_address().map_err(|_| NodeError::NoValidatorKey)?;

        while !self.stopped() {
            let latest = self.storage.latest()?.ok_or(NodeError::State(
                rdchain_state::StateError::NoLatestBlock,
            ))?;
            let height = latest.header.n_height + 1;

            let (proposer, is_randomizer) = {
                let rdpos = self.rdpos.lock();
                (rdpos.proposer(), rdpos.is_randomizer(me))
            };

            if proposer == Some(me) {
                self.run_proposer(height).await?;
            } else if is_randomizer {
                self.run_randomizer(height).await?;
            }

            self.wait_for_height_advance(latest.header.n_height).await;
        }
        Ok(())
    }

    async fn run_proposer(&mut self, height: u64) -> Result<(), NodeError> {
        let target_votes = 2 * MIN_VALIDATORS;
        let mut attempts: u32 = 0;
        while !self.stopped() && self.rdpos.lock().mempool().len() < target_votes {
            attempts += 1;
            if attempts % self.config.request_every_n_attempts == 0 {
                self.pull_validator_txs().await;
            }
            tokio::time::sleep(self.config.spin_sleep).await;
        }

        while !self.stopped() && self.state.mempool_len() < 1 {
            tokio::time::sleep(self.config.spin_sleep).await;
        }

        if self.stopped() {
            return Ok(());
        }

        let timestamp = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);

        let block = {
            let rdpos = self.rdpos.lock();
            self.state.create_new_block(self.chain_id, &self.priv_key, &rdpos, timestamp)?
        };

        {
            let rdpos = self.rdpos.lock();
            self.state.validate_next_block(&block, &rdpos)?;
        }

        let wire = block.serialize_network();
        {
            let mut rdpos = self.rdpos.lock();
            self.state.process_next_block(Arc::new(block), &mut rdpos)?;
        }
        self.manager.broadcast(Command::BroadcastBlock, wire).await;

        tracing::info!(height, "proposed and applied block");
        Ok(())
    }

    async fn run_randomizer(&mut self, height: u64) -> Result<(), NodeError> {
        let mut secret = [0u8; 32];
        rand::RngCore::fill_bytes(&mut rand::thread_rng(), &mut secret);

        let commit = TxValidator::new_commit(&secret, height, self.chain_id, &self.priv_key)?;
        self.rdpos.lock().add_validator_tx(commit.clone())?;
        self.manager.broadcast(Command::BroadcastValidatorTx, commit.encode()).await;

        while !self.stopped() && self.rdpos.lock().mempool().commits_for_height(height).len() < MIN_VALIDATORS {
            tokio::time::sleep(self.config.spin_sleep).await;
        }
        if self.stopped() {
            return Ok(());
        }

        let reveal = TxValidator::new_reveal(&secret, height, self.chain_id, &self.priv_key)?;
        self.rdpos.lock().add_validator_tx(reveal.clone())?;
        self.manager.broadcast(Command::BroadcastValidatorTx, reveal.encode()).await;
        Ok(())
    }

    async fn wait_for_height_advance(&self, prev_height: u64) {
        while !self.stopped() {
            match self.storage.latest() {
                Ok(Some(latest)) if latest.header.n_height > prev_height => return,
                _ => tokio::time::sleep(self.config.spin_sleep).await,
            }
        }
    }

    async fn pull_validator_txs(&self) {
        let peers: Vec<_> = self
            .manager
            .peer_ids()
            .into_iter()
            .filter(|id| self.manager.peer_node_type(id) == Some(NodeType::Normal))
            .collect();

        for peer in peers {
            let answer = self
                .manager
                .request(peer, Command::RequestValidatorTxs, Vec::new(), self.config.request_timeout)
                .await;
            let Ok(answer) = answer else { continue };
            for vote in decode_validator_txs(&answer.body) {
                let _ = self.rdpos.lock().add_validator_tx(vote);
            }
        }
    }
}

fn decode_validator_txs(body: &[u8]) -> Vec<TxValidator> {
    let mut out = Vec::new();
    let mut cursor = 0usize;
    while cursor + 4 <= body.len() {
        let len_bytes: [u8; 4] = match body.get(cursor..cursor + 4).and_then(|s| s.try_into().ok()) {
            Some(b) => b,
            None => break,
        };
        let len = u32::from_be_bytes(len_bytes) as usize;
        cursor += 4;
        let Some(raw) = body.get(cursor..cursor + len) else {
            break;
        };
        cursor += len;
        if let Ok(tx) = TxValidator::decode(raw) {
            out.push(tx);
        }
    }
    out
}
