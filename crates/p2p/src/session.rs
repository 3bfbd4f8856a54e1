//! A single peer connection's write side. Reads are driven by the loop the
//! manager spawns per session; writes are serialized behind an async mutex
//! so a session has, in effect, one write strand.

use crate::error::P2pError;
use crate::framing::write_frame;
use crate::handshake::NodeType;
use crate::message::Message;
use crate::node_id::NodeId;
use tokio::net::tcp::OwnedWriteHalf;
use tokio::sync::Mutex;

pub struct Session {
    pub node_id: NodeId,
    pub node_type: NodeType,
    write_half: Mutex<OwnedWriteHalf>,
}

impl Session {
    pub fn new(node_id: NodeId, node_type: NodeType, write_half: OwnedWriteHalf) -> Self {
        Session {
            node_id,
            node_type,
            write_half: Mutex::new(write_half),
        }
    }

    pub async fn send(&self, msg: &Message) -> Result<(), P2pError> {
        let mut w = self.write_half.lock().await;
        write_frame(&mut *w, &msg.encode()).await
    }
}
