//! Composition-root errors: config parsing and startup wiring failures.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum NodeError {
    #[error("invalid private key hex: {0}")]
    InvalidPrivKeyHex(String),
    #[error("invalid address: {0}")]
    InvalidAddress(#[from] rdchain_types::TypesError),
    #[error("storage error: {0}")]
    Storage(#[from] rdchain_storage::StorageError),
    #[error("rdpos error: {0}")]
    RdPos(#[from] rdchain_rdpos::RdPosError),
    #[error("state error: {0}")]
    State(#[from] rdchain_state::StateError),
    #[error("p2p error: {0}")]
    P2p(#[from] rdchain_p2p::P2pError),
    #[error("tx error: {0}")]
    Tx(#[from] rdchain_tx::TxError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("this node has no validator key configured, cannot run the consensus loop")]
    NoValidatorKey,
}
