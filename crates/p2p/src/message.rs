//! Wire message format: `type(1) | request_id(8) | command(2) | body...`.

use crate::error::P2pError;
use std::net::IpAddr;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MessageKind {
    Request,
    Answer,
    Broadcast,
}

impl MessageKind {
    fn as_byte(self) -> u8 {
        match self {
            MessageKind::Request => 0x00,
            MessageKind::Answer => 0x01,
            MessageKind::Broadcast => 0x02,
        }
    }

    fn from_byte(b: u8) -> Result<Self, P2pError> {
        match b {
            0x00 => Ok(MessageKind::Request),
            0x01 => Ok(MessageKind::Answer),
            0x02 => Ok(MessageKind::Broadcast),
            other => Err(P2pError::UnknownMessageType(other)),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Ping,
    Info,
    RequestNodes,
    RequestValidatorTxs,
    BroadcastValidatorTx,
    BroadcastTx,
    BroadcastBlock,
}

impl Command {
    fn as_u16(self) -> u16 {
        match self {
            Command::Ping => 0x0000,
            Command::Info => 0x0001,
            Command::RequestNodes => 0x0002,
            Command::RequestValidatorTxs => 0x0003,
            Command::BroadcastValidatorTx => 0x0004,
            Command::BroadcastTx => 0x0005,
            Command::BroadcastBlock => 0x0006,
        }
    }

    fn from_u16(v: u16) -> Result<Self, P2pError> {
        match v {
            0x0000 => Ok(Command::Ping),
            0x0001 => Ok(Command::Info),
            0x0002 => Ok(Command::RequestNodes),
            0x0003 => Ok(Command::RequestValidatorTxs),
            0x0004 => Ok(Command::BroadcastValidatorTx),
            0x0005 => Ok(Command::BroadcastTx),
            0x0006 => Ok(Command::BroadcastBlock),
            other => Err(P2pError::UnknownCommand(other)),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    pub kind: MessageKind,
    pub request_id: u64,
    pub command: Command,
    pub body: Vec<u8>,
}

const HEADER_LEN: usize = 1 + 8 + 2;

impl Message {
    pub fn request(request_id: u64, command: Command, body: Vec<u8>) -> Self {
        Message {
            kind: MessageKind::Request,
            request_id,
            command,
            body,
        }
    }

    pub fn answer(request_id: u64, command: Command, body: Vec<u8>) -> Self {
        Message {
            kind: MessageKind::Answer,
            request_id,
            command,
            body,
        }
    }

    /// `request_id` for a broadcast is `fnv1a_64(body)`, a stable
    /// deduplication fingerprint rather than a random correlation id.
    pub fn broadcast(command: Command, body: Vec<u8>) -> Self {
        let request_id = crate::fingerprint::fnv1a_64(&body);
        Message {
            kind: MessageKind::Broadcast,
            request_id,
            command,
            body,
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_LEN + self.body.len());
        out.push(self.kind.as_byte());
        out.extend_from_slice(&self.request_id.to_be_bytes());
        out.extend_from_slice(&self.command.as_u16().to_be_bytes());
        out.extend_from_slice(&self.body);
        out
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, P2pError> {
        if bytes.len() < HEADER_LEN {
            return Err(P2pError::Truncated {
                what: "message header",
                need: HEADER_LEN,
                have: bytes.len(),
            });
        }
        let kind = MessageKind::from_byte(*bytes.first().ok_or(P2pError::Truncated {
            what: "message kind",
            need: 1,
            have: bytes.len(),
        })?)?;
        let request_id_bytes: [u8; 8] = bytes
            .get(1..9)
            .and_then(|s| s.try_into().ok())
            .ok_or(P2pError::Truncated {
                what: "request id",
                need: 9,
                have: bytes.len(),
            })?;
        let request_id = u64::from_be_bytes(request_id_bytes);
        let command_bytes: [u8; 2] = bytes
            .get(9..11)
            .and_then(|s| s.try_into().ok())
            .ok_or(P2pError::Truncated {
                what: "command",
                need: 11,
                have: bytes.len(),
            })?;
        let command = Command::from_u16(u16::from_be_bytes(command_bytes))?;
        let body = bytes.get(11..).unwrap_or(&[]).to_vec();
        Ok(Message {
            kind,
            request_id,
            command,
            body,
        })
    }
}

/// One entry of a `RequestNodes` answer: `node_type(1) | ip_version(1) |
/// ip(4 or 16) | port(2)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NodeAddr {
    pub node_type: crate::handshake::NodeType,
    pub ip: IpAddr,
    pub port: u16,
}

impl NodeAddr {
    pub fn encode(&self, out: &mut Vec<u8>) {
        out.push(self.node_type as u8);
        match self.ip {
            IpAddr::V4(v4) => {
                out.push(0);
                out.extend_from_slice(&v4.octets());
            }
            IpAddr::V6(v6) => {
                out.push(1);
                out.extend_from_slice(&v6.octets());
            }
        }
        out.extend_from_slice(&self.port.to_be_bytes());
    }

    fn decode_one(bytes: &[u8], cursor: &mut usize) -> Result<Self, P2pError> {
        let node_type_byte = *bytes.get(*cursor).ok_or(P2pError::Truncated {
            what: "node_addr.node_type",
            need: *cursor + 1,
            have: bytes.len(),
        })?;
        let node_type = crate::handshake::NodeType::from_byte(node_type_byte)?;
        *cursor += 1;

        let ip_version = *bytes.get(*cursor).ok_or(P2pError::Truncated {
            what: "node_addr.ip_version",
            need: *cursor + 1,
            have: bytes.len(),
        })?;
        *cursor += 1;

        let ip = match ip_version {
            0 => {
                let octets: [u8; 4] = bytes
                    .get(*cursor..*cursor + 4)
                    .and_then(|s| s.try_into().ok())
                    .ok_or(P2pError::Truncated {
                        what: "node_addr.ipv4",
                        need: *cursor + 4,
                        have: bytes.len(),
                    })?;
                *cursor += 4;
                IpAddr::from(octets)
            }
            1 => {
                let octets: [u8; 16] = bytes
                    .get(*cursor..*cursor + 16)
                    .and_then(|s| s.try_into().ok())
                    .ok_or(P2pError::Truncated {
                        what: "node_addr.ipv6",
                        need: *cursor + 16,
                        have: bytes.len(),
                    })?;
                *cursor += 16;
                IpAddr::from(octets)
            }
            other => return Err(P2pError::UnknownIpVersion(other)),
        };

        let port_bytes: [u8; 2] = bytes
            .get(*cursor..*cursor + 2)
            .and_then(|s| s.try_into().ok())
            .ok_or(P2pError::Truncated {
                what: "node_addr.port",
                need: *cursor + 2,
                have: bytes.len(),
            })?;
        *cursor += 2;
        let port = u16::from_be_bytes(port_bytes);

        Ok(NodeAddr { node_type, ip, port })
    }

    pub fn encode_list(addrs: &[NodeAddr]) -> Vec<u8> {
        let mut out = Vec::new();
        for addr in addrs {
            addr.encode(&mut out);
        }
        out
    }

    pub fn decode_list(bytes: &[u8]) -> Result<Vec<NodeAddr>, P2pError> {
        let mut out = Vec::new();
        let mut cursor = 0usize;
        while cursor < bytes.len() {
            out.push(Self::decode_one(bytes, &mut cursor)?);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[test]
    fn message_roundtrips() {
        let msg = Message::request(0x1122_3344_5566_7788, Command::Ping, vec![1, 2, 3]);
        let decoded = Message::decode(&msg.encode()).unwrap();
        assert_eq!(decoded, msg);
    }

    #[test]
    fn broadcast_request_id_is_fnv1a_of_body() {
        let body = b"hello".to_vec();
        let msg = Message::broadcast(Command::BroadcastTx, body.clone());
        assert_eq!(msg.request_id, crate::fingerprint::fnv1a_64(&body));
    }

    #[test]
    fn rejects_unknown_command() {
        let mut bytes = Message::request(1, Command::Ping, vec![]).encode();
        *bytes.get_mut(9).unwrap() = 0xff;
        *bytes.get_mut(10).unwrap() = 0xff;
        assert!(matches!(Message::decode(&bytes), Err(P2pError::UnknownCommand(_))));
    }

    #[test]
    fn node_addr_list_roundtrips_mixed_v4_and_v6() {
        let addrs = vec![
            NodeAddr {
                node_type: crate::handshake::NodeType::Normal,
                ip: IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)),
                port: 8000,
            },
            NodeAddr {
                node_type: crate::handshake::NodeType::Discovery,
                ip: IpAddr::V6(std::net::Ipv6Addr::LOCALHOST),
                port: 9000,
            },
        ];
        let bytes = NodeAddr::encode_list(&addrs);
        let decoded = NodeAddr::decode_list(&bytes).unwrap();
        assert_eq!(decoded, addrs);
    }
}
