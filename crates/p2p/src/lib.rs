#![cfg_attr(
    not(test),
    deny(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::indexing_slicing
    )
)]

pub mod discovery;
pub mod error;
pub mod fingerprint;
pub mod framing;
pub mod handler;
pub mod handshake;
pub mod manager;
pub mod message;
pub mod node_id;
pub mod session;

pub use discovery::{DiscoveryConfig};
pub use error::P2pError;
pub use fingerprint::{fnv1a_64, BroadcastDedup};
pub use handler::Handler;
pub use handshake::{decode_handshake, encode_handshake, NodeType, HANDSHAKE_LEN};
pub use manager::Manager;
pub use message::{Command, Message, MessageKind, NodeAddr};
pub use node_id::NodeId;
pub use session::Session;
