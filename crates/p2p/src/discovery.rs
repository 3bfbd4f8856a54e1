//! Periodic peer discovery: bootstraps from a seed list, then asks connected
//! peers for their own peer lists and dials anything new.
//!
//! This is a simplified rendition: it does not distinguish a first pass that
//! only queries discovery nodes from later passes that query normal nodes.
//! Every connected peer, discovery or normal, is queried once per sweep.

use crate::handshake::NodeType;
use crate::manager::Manager;
use crate::message::{Command, NodeAddr};
use crate::node_id::NodeId;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

const SWEEP_INTERVAL: Duration = Duration::from_secs(1);
const REQUERY_AFTER: Duration = Duration::from_secs(60);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

pub struct DiscoveryConfig {
    pub seeds: Vec<SocketAddr>,
    pub min_connections: usize,
    pub max_connections: usize,
}

/// Runs until `manager.is_stopped()`. Intended to be spawned on its own task.
pub async fn run(manager: Arc<Manager>, config: DiscoveryConfig) {
    for seed in &config.seeds {
        if manager.session_count() >= config.max_connections {
            break;
        }
        let _ = manager.connect(*seed).await;
    }

    let mut last_queried: HashMap<NodeId, Instant> = HashMap::new();

    while !manager.is_stopped() {
        tokio::time::sleep(SWEEP_INTERVAL).await;

        let current = manager.session_count();
        if current >= config.min_connections && current >= config.max_connections {
            continue;
        }

        let now = Instant::now();
        let to_query: Vec<NodeId> = manager
            .peer_ids()
            .into_iter()
            .filter(|id| {
                last_queried
                    .get(id)
                    .map(|t| now.duration_since(*t) >= REQUERY_AFTER)
                    .unwrap_or(true)
            })
            .collect();

        for peer in to_query {
            last_queried.insert(peer, now);
            let answer = manager
                .request(peer, Command::RequestNodes, Vec::new(), REQUEST_TIMEOUT)
                .await;
            let Ok(answer) = answer else { continue };
            let Ok(addrs) = NodeAddr::decode_list(&answer.body) else {
                continue;
            };
            for addr in addrs {
                if manager.session_count() >= config.max_connections {
                    break;
                }
                let socket_addr = SocketAddr::new(addr.ip, addr.port);
                if manager
                    .peer_ids()
                    .iter()
                    .any(|id| id.ip == addr.ip && id.server_port == addr.port)
                {
                    continue;
                }
                let _ = manager.connect(socket_addr).await;
            }
        }
    }
}

pub fn is_discovery_node(node_type: NodeType) -> bool {
    matches!(node_type, NodeType::Discovery)
}
