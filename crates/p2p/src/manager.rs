//! Session registry, request/answer correlation, and broadcast dispatch.

use crate::error::P2pError;
use crate::fingerprint::BroadcastDedup;
use crate::framing::read_frame;
use crate::handler::Handler;
use crate::handshake::{decode_handshake, encode_handshake, NodeType, HANDSHAKE_LEN};
use crate::message::{Command, Message, MessageKind};
use crate::node_id::NodeId;
use crate::session::Session;
use parking_lot::{Mutex as SyncMutex, RwLock};
use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::OwnedReadHalf;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;

pub struct Manager {
    node_type: NodeType,
    server_port: u16,
    sessions: RwLock<HashMap<NodeId, Arc<Session>>>,
    pending: SyncMutex<HashMap<u64, oneshot::Sender<Message>>>,
    dedup: BroadcastDedup,
    handler: Arc<dyn Handler>,
    stop: Arc<AtomicBool>,
}

impl Manager {
    pub fn new(node_type: NodeType, server_port: u16, handler: Arc<dyn Handler>) -> Arc<Self> {
        Arc::new(Manager {
            node_type,
            server_port,
            sessions: RwLock::new(HashMap::new()),
            pending: SyncMutex::new(HashMap::new()),
            dedup: BroadcastDedup::new(),
            handler,
            stop: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn session_count(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn peer_ids(&self) -> Vec<NodeId> {
        self.sessions.read().keys().copied().collect()
    }

    pub fn peer_node_type(&self, node_id: &NodeId) -> Option<NodeType> {
        self.sessions.read().get(node_id).map(|s| s.node_type)
    }

    /// Signals every spawned loop to stop. Existing sessions are dropped as
    /// their read loops observe closed sockets or decode failures; this does
    /// not forcibly close sockets itself.
    pub fn stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }

    pub fn is_stopped(&self) -> bool {
        self.stop.load(Ordering::Relaxed)
    }

    /// Binds `addr` and spawns the accept loop. Returns the bound address,
    /// which differs from `addr` when `addr`'s port is `0`.
    pub async fn listen(self: &Arc<Self>, addr: SocketAddr) -> Result<SocketAddr, P2pError> {
        let listener = TcpListener::bind(addr).await?;
        let local_addr = listener.local_addr()?;
        let this = self.clone();
        tokio::spawn(async move {
            loop {
                if this.stop.load(Ordering::Relaxed) {
                    break;
                }
                match listener.accept().await {
                    Ok((stream, peer_addr)) => {
                        let this2 = this.clone();
                        tokio::spawn(async move {
                            if let Err(e) = this2.accept_inbound(stream, peer_addr.ip()).await {
                                tracing::warn!(error = %e, peer = %peer_addr, "inbound handshake failed");
                            }
                        });
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "accept failed");
                    }
                }
            }
        });
        Ok(local_addr)
    }

    async fn accept_inbound(self: &Arc<Self>, stream: TcpStream, ip: IpAddr) -> Result<(), P2pError> {
        let (mut read_half, mut write_half) = stream.into_split();
        write_half
            .write_all(&encode_handshake(self.node_type, self.server_port))
            .await?;
        let mut hs_buf = [0u8; HANDSHAKE_LEN];
        read_half.read_exact(&mut hs_buf).await?;
        let (peer_node_type, peer_port) = decode_handshake(&hs_buf)?;
        let node_id = NodeId::new(ip, peer_port);
        self.register_and_spawn_reader(node_id, peer_node_type, read_half, write_half)?;
        Ok(())
    }

    pub async fn connect(self: &Arc<Self>, addr: SocketAddr) -> Result<NodeId, P2pError> {
        let stream = TcpStream::connect(addr).await?;
        let (mut read_half, mut write_half) = stream.into_split();
        write_half
            .write_all(&encode_handshake(self.node_type, self.server_port))
            .await?;
        let mut hs_buf = [0u8; HANDSHAKE_LEN];
        read_half.read_exact(&mut hs_buf).await?;
        let (peer_node_type, peer_port) = decode_handshake(&hs_buf)?;
        let node_id = NodeId::new(addr.ip(), peer_port);
        self.register_and_spawn_reader(node_id, peer_node_type, read_half, write_half)?;
        Ok(node_id)
    }

    fn register_and_spawn_reader(
        self: &Arc<Self>,
        node_id: NodeId,
        node_type: NodeType,
        read_half: OwnedReadHalf,
        write_half: tokio::net::tcp::OwnedWriteHalf,
    ) -> Result<(), P2pError> {
        let session = Arc::new(Session::new(node_id, node_type, write_half));
        {
            let mut sessions = self.sessions.write();
            if sessions.contains_key(&node_id) {
                return Err(P2pError::DuplicateNode(node_id.to_string()));
            }
            sessions.insert(node_id, session);
        }

        let this = self.clone();
        tokio::spawn(async move {
            this.read_loop(node_id, read_half).await;
            this.sessions.write().remove(&node_id);
        });
        Ok(())
    }

    async fn read_loop(self: &Arc<Self>, node_id: NodeId, mut read_half: OwnedReadHalf) {
        loop {
            if self.stop.load(Ordering::Relaxed) {
                break;
            }
            let payload = match read_frame(&mut read_half).await {
                Ok(payload) => payload,
                Err(_) => break,
            };
            match Message::decode(&payload) {
                Ok(msg) => self.handle_inbound(node_id, msg).await,
                Err(e) => {
                    tracing::warn!(error = %e, peer = %node_id, "decode error, dropping peer");
                    break;
                }
            }
        }
    }

    async fn handle_inbound(self: &Arc<Self>, from: NodeId, msg: Message) {
        match msg.kind {
            MessageKind::Answer => {
                if let Some(tx) = self.pending.lock().remove(&msg.request_id) {
                    let _ = tx.send(msg);
                }
            }
            MessageKind::Request => {
                let body = match msg.command {
                    Command::Ping => Vec::new(),
                    Command::Info => self.handler.info(),
                    Command::RequestNodes => self.handler.nodes(),
                    Command::RequestValidatorTxs => self.handler.validator_txs(),
                    _ => Vec::new(),
                };
                let session = self.sessions.read().get(&from).cloned();
                if let Some(session) = session {
                    let _ = session.send(&Message::answer(msg.request_id, msg.command, body)).await;
                }
            }
            MessageKind::Broadcast => {
                if !self.dedup.admit(msg.request_id) {
                    return;
                }
                match msg.command {
                    Command::BroadcastValidatorTx => self.handler.on_broadcast_validator_tx(&msg.body),
                    Command::BroadcastTx => self.handler.on_broadcast_tx(&msg.body),
                    Command::BroadcastBlock => self.handler.on_broadcast_block(&msg.body),
                    _ => {}
                }
                self.rebroadcast_except(from, msg).await;
            }
        }
    }

    async fn rebroadcast_except(&self, exclude: NodeId, msg: Message) {
        let targets: Vec<Arc<Session>> = self
            .sessions
            .read()
            .iter()
            .filter(|(id, _)| **id != exclude)
            .map(|(_, s)| s.clone())
            .collect();
        for session in targets {
            let _ = session.send(&msg).await;
        }
    }

    pub async fn request(
        &self,
        node_id: NodeId,
        command: Command,
        body: Vec<u8>,
        timeout: Duration,
    ) -> Result<Message, P2pError> {
        let session = self
            .sessions
            .read()
            .get(&node_id)
            .cloned()
            .ok_or(P2pError::SessionClosed)?;
        let request_id = rand::random::<u64>();
        let (tx, rx) = oneshot::channel();
        self.pending.lock().insert(request_id, tx);
        session.send(&Message::request(request_id, command, body)).await?;

        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(msg)) => Ok(msg),
            _ => {
                self.pending.lock().remove(&request_id);
                Err(P2pError::RequestTimeout(request_id))
            }
        }
    }

    /// Originates a new broadcast locally: admits its own fingerprint (so an
    /// echo that loops back is dropped) and fans it out to every session.
    pub async fn broadcast(&self, command: Command, body: Vec<u8>) {
        let msg = Message::broadcast(command, body);
        self.dedup.admit(msg.request_id);
        let targets: Vec<Arc<Session>> = self.sessions.read().values().cloned().collect();
        for session in targets {
            let _ = session.send(&msg).await;
        }
    }
}
