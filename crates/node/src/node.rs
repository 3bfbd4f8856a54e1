//! Composition root: owns storage, state, rdPoS, and the P2P overlay, and
//! wires them together behind the [`rdchain_p2p::Handler`] boundary.

use crate::config::Config;
use crate::consensus::{ConsensusConfig, ConsensusWorker};
use crate::error::NodeError;
use crate::handler::NodeHandler;
use parking_lot::Mutex;
use rdchain_p2p::{discovery, DiscoveryConfig, Manager};
use rdchain_rdpos::RdPos;
use rdchain_state::State;
use rdchain_storage::{ChainStore, GenesisConfig};
use rdchain_types::Hash;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub struct Node {
    pub config: Config,
    pub storage: Arc<ChainStore>,
    pub state: Arc<State>,
    pub rdpos: Arc<Mutex<RdPos>>,
    pub manager: Arc<Manager>,
    pub handler: Arc<NodeHandler>,
    stop: Arc<AtomicBool>,
}

impl Node {
    /// Opens (or creates) storage, rebuilds the rdPoS round from the latest
    /// block's randomness, and constructs the P2P manager. Does not yet
    /// accept connections or run any workers; call [`Node::run`] for that.
    pub fn bootstrap(config: Config) -> Result<Arc<Node>, NodeError> {
        std::fs::create_dir_all(&config.data_dir)?;
        let db_path = config.data_dir.join("chain.redb");
        let storage = Arc::new(ChainStore::open(
            db_path,
            config.chain_id,
            GenesisConfig {
                timestamp: config.genesis_timestamp,
                validators: config.genesis_validators.clone(),
            },
            config.window_capacity,
        )?);

        let state = Arc::new(State::new(storage.clone()));

        let validators = storage.validators()?;
        let latest = storage.latest()?;
        let seed = latest
            .as_ref()
            .map(|b| b.header.randomness)
            .unwrap_or_else(Hash::zero);
        let current_height = latest.map(|b| b.header.n_height + 1).unwrap_or(0);
        let rdpos = Arc::new(Mutex::new(RdPos::new(seed, validators, current_height)?));

        let handler = NodeHandler::new(config.chain_id, storage.clone(), state.clone(), rdpos.clone());
        let manager = Manager::new(config.node_type, config.listen_addr.port(), handler.clone());
        handler.attach_manager(&manager);

        Ok(Arc::new(Node {
            config,
            storage,
            state,
            rdpos,
            manager,
            handler,
            stop: Arc::new(AtomicBool::new(false)),
        }))
    }

    /// Starts accepting inbound connections and spawns the discovery worker,
    /// and (for validator nodes) the consensus worker. Returns immediately;
    /// the spawned tasks run until [`Node::stop`] is called.
    pub async fn run(self: &Arc<Self>) -> Result<(), NodeError> {
        self.manager.listen(self.config.listen_addr).await?;

        let discovery_config = DiscoveryConfig {
            seeds: self.config.bootstrap_peers.clone(),
            min_connections: self.config.min_connections,
            max_connections: self.config.max_connections,
        };
        let manager = self.manager.clone();
        tokio::spawn(async move {
            discovery::run(manager, discovery_config).await;
        });

        if let Some(priv_key) = self.config.validator_key {
            let worker = ConsensusWorker::new(
                self.config.chain_id,
                priv_key,
                self.storage.clone(),
                self.state.clone(),
                self.rdpos.clone(),
                self.manager.clone(),
                ConsensusConfig::default(),
                self.stop.clone(),
            );
            tokio::spawn(async move {
                if let Err(e) = worker.run().await {
                    tracing::error!(error = %e, "consensus worker exited");
                }
            });
        }

        Ok(())
    }

    pub fn stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
        self.manager.stop();
    }
}
