//! Peer identity: `(remote_ip, remote_server_port)`, distinct from the
//! ephemeral TCP source port a connection arrives on.

use std::net::IpAddr;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId {
    pub ip: IpAddr,
    pub server_port: u16,
}

impl NodeId {
    pub fn new(ip: IpAddr, server_port: u16) -> Self {
        NodeId { ip, server_port }
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.ip, self.server_port)
    }
}
