//! The 3-byte session handshake: `node_type(1) | server_port(2, big-endian)`.

use crate::error::P2pError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeType {
    Normal = 0,
    Discovery = 1,
}

impl NodeType {
    pub fn from_byte(b: u8) -> Result<Self, P2pError> {
        match b {
            0 => Ok(NodeType::Normal),
            1 => Ok(NodeType::Discovery),
            other => Err(P2pError::UnknownNodeType(other)),
        }
    }
}

pub const HANDSHAKE_LEN: usize = 3;

pub fn encode_handshake(node_type: NodeType, server_port: u16) -> [u8; HANDSHAKE_LEN] {
    let port = server_port.to_be_bytes();
    [node_type as u8, port[0], port[1]]
}

pub fn decode_handshake(bytes: &[u8]) -> Result<(NodeType, u16), P2pError> {
    if bytes.len() != HANDSHAKE_LEN {
        return Err(P2pError::Truncated {
            what: "handshake",
            need: HANDSHAKE_LEN,
            have: bytes.len(),
        });
    }
    let node_type = NodeType::from_byte(*bytes.first().ok_or(P2pError::Truncated {
        what: "handshake.node_type",
        need: 1,
        have: bytes.len(),
    })?)?;
    let port_bytes: [u8; 2] = bytes
        .get(1..3)
        .and_then(|s| s.try_into().ok())
        .ok_or(P2pError::Truncated {
            what: "handshake.server_port",
            need: 3,
            have: bytes.len(),
        })?;
    Ok((node_type, u16::from_be_bytes(port_bytes)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrips() {
        let bytes = encode_handshake(NodeType::Discovery, 30303);
        let (node_type, port) = decode_handshake(&bytes).unwrap();
        assert_eq!(node_type, NodeType::Discovery);
        assert_eq!(port, 30303);
    }

    #[test]
    fn rejects_wrong_length() {
        assert!(decode_handshake(&[0u8; 2]).is_err());
    }
}
