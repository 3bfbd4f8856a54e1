//! The concrete [`Handler`](rdchain_p2p::Handler) wiring inbound P2P traffic
//! to storage, state, and rdPoS. `rdchain-p2p` never sees these types
//! directly; it only calls through the trait.

use parking_lot::Mutex;
use rdchain_block::FinalizedBlock;
use rdchain_p2p::{Handler, Manager, NodeAddr};
use rdchain_rdpos::RdPos;
use rdchain_state::State;
use rdchain_storage::ChainStore;
use rdchain_tx::{TxBlock, TxValidator};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::{SystemTime, UNIX_EPOCH};

/// Bumped whenever the wire formats this node speaks change incompatibly.
const PROTOCOL_VERSION: u64 = 1;

pub struct NodeHandler {
    chain_id: u64,
    storage: Arc<ChainStore>,
    state: Arc<State>,
    rdpos: Arc<Mutex<RdPos>>,
    manager: Mutex<Option<Weak<Manager>>>,
    inbound_blocks: AtomicU64,
}

impl NodeHandler {
    pub fn new(chain_id: u64, storage: Arc<ChainStore>, state: Arc<State>, rdpos: Arc<Mutex<RdPos>>) -> Arc<Self> {
        Arc::new(NodeHandler {
            chain_id,
            storage,
            state,
            rdpos,
            manager: Mutex::new(None),
            inbound_blocks: AtomicU64::new(0),
        })
    }

    /// `Manager` is constructed after the handler (it needs the handler as a
    /// trait object), so the back-reference is wired in a second step.
    pub fn attach_manager(&self, manager: &Arc<Manager>) {
        *self.manager.lock() = Some(Arc::downgrade(manager));
    }

    pub fn inbound_block_count(&self) -> u64 {
        self.inbound_blocks.load(Ordering::Relaxed)
    }
}

impl Handler for NodeHandler {
    fn info(&self) -> Vec<u8> {
        let epoch_micros = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_micros() as u64)
            .unwrap_or(0);
        let latest = self.storage.latest().ok().flatten();
        let (height, hash) = match latest {
            Some(block) => (block.header.n_height, block.hash()),
            None => (0, rdchain_types::Hash::zero()),
        };

        let mut out = Vec::with_capacity(56);
        out.extend_from_slice(&PROTOCOL_VERSION.to_be_bytes());
        out.extend_from_slice(&epoch_micros.to_be_bytes());
        out.extend_from_slice(&height.to_be_bytes());
        out.extend_from_slice(hash.as_bytes());
        out
    }

    fn nodes(&self) -> Vec<u8> {
        let manager = match self.manager.lock().as_ref().and_then(Weak::upgrade) {
            Some(m) => m,
            None => return Vec::new(),
        };
        let addrs: Vec<NodeAddr> = manager
            .peer_ids()
            .into_iter()
            .filter_map(|id| {
                manager.peer_node_type(&id).map(|node_type| NodeAddr {
                    node_type,
                    ip: id.ip,
                    port: id.server_port,
                })
            })
            .collect();
        NodeAddr::encode_list(&addrs)
    }

    fn validator_txs(&self) -> Vec<u8> {
        let rdpos = self.rdpos.lock();
        let mut out = Vec::new();
        for vote in rdpos.mempool().votes() {
            let encoded = vote.encode();
            let len = u32::try_from(encoded.len()).unwrap_or(u32::MAX);
            out.extend_from_slice(&len.to_be_bytes());
            out.extend_from_slice(&encoded);
        }
        out
    }

    fn on_broadcast_validator_tx(&self, body: &[u8]) {
        let tx = match TxValidator::decode(body) {
            Ok(tx) => tx,
            Err(e) => {
                tracing::debug!(error = %e, "dropping malformed broadcast validator tx");
                return;
            }
        };
        if let Err(e) = self.rdpos.lock().add_validator_tx(tx) {
            tracing::debug!(error = %e, "rejected broadcast validator tx");
        }
    }

    fn on_broadcast_tx(&self, body: &[u8]) {
        let tx = match TxBlock::decode(body) {
            Ok(tx) => tx,
            Err(e) => {
                tracing::debug!(error = %e, "dropping malformed broadcast tx");
                return;
            }
        };
        if let Err(e) = self.state.validate_tx_for_rpc(tx) {
            tracing::debug!(error = %e, "rejected broadcast tx");
        }
    }

    fn on_broadcast_block(&self, body: &[u8]) {
        let block = match FinalizedBlock::deserialize_network(body, self.chain_id) {
            Ok(block) => block,
            Err(e) => {
                tracing::warn!(error = %e, "dropping malformed broadcast block");
                return;
            }
        };

        let mut rdpos = self.rdpos.lock();
        if let Err(e) = self.state.validate_next_block(&block, &rdpos) {
            tracing::warn!(error = %e, height = block.header.n_height, "rejected broadcast block");
            return;
        }
        if let Err(e) = self.state.process_next_block(Arc::new(block), &mut rdpos) {
            tracing::warn!(error = %e, "failed to apply accepted broadcast block");
            return;
        }
        self.inbound_blocks.fetch_add(1, Ordering::Relaxed);
    }
}

