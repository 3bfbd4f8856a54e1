use anyhow::{Context, Result};
use clap::Parser;
use rdchain_node::{Config, Node};
use rdchain_p2p::NodeType;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Parser, Debug)]
#[clap(name = "rdchain-node", about = "rdPoS validator/relay node")]
struct Opts {
    #[clap(long, default_value = "1")]
    chain_id: u64,

    #[clap(long, default_value = "./rdchain-data")]
    data_dir: PathBuf,

    #[clap(long, default_value = "0.0.0.0:30303")]
    listen_addr: SocketAddr,

    /// Hex-encoded secp256k1 private key. Omit to run as a non-validating relay.
    #[clap(long, env = "RDCHAIN_VALIDATOR_KEY")]
    validator_key: Option<String>,

    /// Comma-separated EIP-55 addresses making up the genesis validator set.
    #[clap(long)]
    genesis_validators: String,

    #[clap(long)]
    genesis_timestamp: Option<u64>,

    /// Comma-separated `ip:port` peers to dial at startup.
    #[clap(long, default_value = "")]
    bootstrap_peers: String,

    #[clap(long)]
    discovery_node: bool,

    #[clap(long, default_value = "8")]
    min_connections: usize,

    #[clap(long, default_value = "32")]
    max_connections: usize,

    #[clap(long, default_value_t = rdchain_storage::DEFAULT_WINDOW_CAPACITY)]
    window_capacity: usize,
}

fn parse_bootstrap_peers(csv: &str) -> Result<Vec<SocketAddr>> {
    csv.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<SocketAddr>().with_context(|| format!("invalid bootstrap peer {s}")))
        .collect()
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let opts = Opts::parse();

    let validator_key = opts
        .validator_key
        .as_deref()
        .map(Config::parse_priv_key)
        .transpose()?;
    let genesis_validators = Config::parse_validator_list(&opts.genesis_validators)?;
    let bootstrap_peers = parse_bootstrap_peers(&opts.bootstrap_peers)?;
    let genesis_timestamp = opts.genesis_timestamp.unwrap_or_else(|| {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    });

    let config = Config {
        chain_id: opts.chain_id,
        data_dir: opts.data_dir,
        listen_addr: opts.listen_addr,
        validator_key,
        genesis_timestamp,
        genesis_validators,
        bootstrap_peers,
        node_type: if opts.discovery_node { NodeType::Discovery } else { NodeType::Normal },
        min_connections: opts.min_connections,
        max_connections: opts.max_connections,
        window_capacity: opts.window_capacity,
    };

    let node = Node::bootstrap(config)?;
    node.run().await?;

    tracing::info!(addr = %node.config.listen_addr, "rdchain-node running");
    tokio::signal::ctrl_c().await?;
    tracing::info!("shutdown signal received");
    node.stop();

    Ok(())
}
