//! P2P session and wire-format errors.

use thiserror::Error;

pub trait ErrorCode {
    fn code(&self) -> &'static str;
}

#[derive(Error, Debug)]
pub enum P2pError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("frame of {len} bytes exceeds the 128 MiB limit")]
    FrameTooLarge { len: u64 },
    #[error("truncated {what}: need {need} bytes, have {have}")]
    Truncated {
        what: &'static str,
        need: usize,
        have: usize,
    },
    #[error("unrecognized command {0:#06x}")]
    UnknownCommand(u16),
    #[error("unrecognized message type {0:#04x}")]
    UnknownMessageType(u8),
    #[error("unrecognized node type {0}")]
    UnknownNodeType(u8),
    #[error("unrecognized ip version {0}")]
    UnknownIpVersion(u8),
    #[error("peer {0} is already connected")]
    DuplicateNode(String),
    #[error("request {0} timed out")]
    RequestTimeout(u64),
    #[error("session closed")]
    SessionClosed,
    #[error("block decode error: {0}")]
    Block(#[from] rdchain_block::BlockError),
    #[error("tx decode error: {0}")]
    Tx(#[from] rdchain_tx::TxError),
}

impl ErrorCode for P2pError {
    fn code(&self) -> &'static str {
        match self {
            Self::Io(_) => "P2P_IO_ERROR",
            Self::FrameTooLarge { .. } => "P2P_FRAME_TOO_LARGE",
            Self::Truncated { .. } => "P2P_TRUNCATED",
            Self::UnknownCommand(_) => "P2P_UNKNOWN_COMMAND",
            Self::UnknownMessageType(_) => "P2P_UNKNOWN_MESSAGE_TYPE",
            Self::UnknownNodeType(_) => "P2P_UNKNOWN_NODE_TYPE",
            Self::UnknownIpVersion(_) => "P2P_UNKNOWN_IP_VERSION",
            Self::DuplicateNode(_) => "P2P_DUPLICATE_NODE",
            Self::RequestTimeout(_) => "P2P_REQUEST_TIMEOUT",
            Self::SessionClosed => "P2P_SESSION_CLOSED",
            Self::Block(_) => "P2P_BLOCK_DECODE_ERROR",
            Self::Tx(_) => "P2P_TX_DECODE_ERROR",
        }
    }
}
