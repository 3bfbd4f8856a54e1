//! Node configuration: genesis parameters, storage location, and network
//! wiring. Loaded from CLI flags in `src/bin/rdchain-node.rs`; kept separate
//! from `clap` so it can be constructed directly in tests.

use crate::error::NodeError;
use rdchain_p2p::NodeType;
use rdchain_types::{Address, PrivKey};
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Clone, Debug)]
pub struct Config {
    pub chain_id: u64,
    pub data_dir: PathBuf,
    pub listen_addr: SocketAddr,
    /// `None` runs this node as a relay/follower with no consensus role.
    pub validator_key: Option<PrivKey>,
    pub genesis_timestamp: u64,
    pub genesis_validators: Vec<Address>,
    pub bootstrap_peers: Vec<SocketAddr>,
    pub node_type: NodeType,
    pub min_connections: usize,
    pub max_connections: usize,
    pub window_capacity: usize,
}

impl Config {
    pub fn parse_priv_key(hex_str: &str) -> Result<PrivKey, NodeError> {
        let trimmed = hex_str.strip_prefix("0x").unwrap_or(hex_str);
        let bytes = hex::decode(trimmed).map_err(|e| NodeError::InvalidPrivKeyHex(e.to_string()))?;
        PrivKey::from_slice(&bytes).map_err(|e| NodeError::InvalidPrivKeyHex(e.to_string()))
    }

    pub fn parse_validator_list(csv: &str) -> Result<Vec<Address>, NodeError> {
        csv.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| s.parse::<Address>().map_err(NodeError::from))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_priv_key_accepts_0x_prefix_and_rejects_wrong_length() {
        let good = format!("0x{}", "11".repeat(32));
        assert!(Config::parse_priv_key(&good).is_ok());

        let short = format!("0x{}", "11".repeat(16));
        assert!(Config::parse_priv_key(&short).is_err());
    }

    #[test]
    fn parse_validator_list_splits_and_trims() {
        let a = Address::from_bytes([1u8; 20]);
        let b = Address::from_bytes([2u8; 20]);
        let csv = format!("{}, {}", a, b);
        let parsed = Config::parse_validator_list(&csv).unwrap();
        assert_eq!(parsed, vec![a, b]);
    }
}
