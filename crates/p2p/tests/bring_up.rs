//! End-to-end bring-up over loopback TCP: handshake, request/answer, and
//! broadcast fan-out/dedup across a small mesh.

use rdchain_p2p::{Command, Handler, Manager, NodeType};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Default)]
struct RecordingHandler {
    broadcasts_seen: AtomicUsize,
}

impl Handler for RecordingHandler {
    fn info(&self) -> Vec<u8> {
        let mut out = vec![0u8; 56];
        out[0..8].copy_from_slice(&1u64.to_be_bytes());
        out
    }

    fn nodes(&self) -> Vec<u8> {
        Vec::new()
    }

    fn validator_txs(&self) -> Vec<u8> {
        Vec::new()
    }

    fn on_broadcast_validator_tx(&self, _body: &[u8]) {
        self.broadcasts_seen.fetch_add(1, Ordering::SeqCst);
    }

    fn on_broadcast_tx(&self, _body: &[u8]) {
        self.broadcasts_seen.fetch_add(1, Ordering::SeqCst);
    }

    fn on_broadcast_block(&self, _body: &[u8]) {
        self.broadcasts_seen.fetch_add(1, Ordering::SeqCst);
    }
}

/// Reserves a free loopback port, then hands that exact port to `Manager`
/// both as its handshake identity and its listen address, so every peer's
/// `NodeId` (derived from the handshake, not the TCP peer address) is
/// actually unique.
async fn spawn_manager(node_type: NodeType) -> (Arc<Manager>, Arc<RecordingHandler>, SocketAddr) {
    let probe = tokio::net::TcpListener::bind((Ipv4Addr::LOCALHOST, 0))
        .await
        .expect("reserve port");
    let port = probe.local_addr().expect("local_addr").port();
    drop(probe);

    let handler = Arc::new(RecordingHandler::default());
    let manager = Manager::new(node_type, port, handler.clone());
    let addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), port);
    let bound = manager.listen(addr).await.expect("listen");
    (manager, handler, bound)
}

#[tokio::test(flavor = "multi_thread")]
async fn ping_request_gets_answered() {
    let (server, _server_handler, server_addr) = spawn_manager(NodeType::Normal).await;
    let (client, _client_handler, _client_addr) = spawn_manager(NodeType::Normal).await;

    let peer = client.connect(server_addr).await.expect("connect");
    assert_eq!(client.session_count(), 1);
    assert_eq!(server.session_count(), 1);

    let answer = client
        .request(peer, Command::Ping, Vec::new(), Duration::from_secs(2))
        .await
        .expect("ping answer");
    assert_eq!(answer.command, Command::Ping);
}

#[tokio::test(flavor = "multi_thread")]
async fn info_answer_carries_version_prefix() {
    let (server, _server_handler, server_addr) = spawn_manager(NodeType::Normal).await;
    let (client, _client_handler, _client_addr) = spawn_manager(NodeType::Normal).await;

    let peer = client.connect(server_addr).await.expect("connect");
    let answer = client
        .request(peer, Command::Info, Vec::new(), Duration::from_secs(2))
        .await
        .expect("info answer");
    assert_eq!(answer.body.len(), 56);
    assert_eq!(&answer.body[0..8], &1u64.to_be_bytes());
    let _ = server_addr;
}

/// Three nodes in a line (A-B-C): a broadcast originated at A must reach C
/// through B exactly once, and B must not loop the broadcast back to A.
#[tokio::test(flavor = "multi_thread")]
async fn broadcast_propagates_through_a_relay_and_is_deduped() {
    let (a, a_handler, a_addr) = spawn_manager(NodeType::Normal).await;
    let (b, b_handler, b_addr) = spawn_manager(NodeType::Normal).await;
    let (c, c_handler, _c_addr) = spawn_manager(NodeType::Normal).await;

    b.connect(a_addr).await.expect("b connects to a");
    c.connect(b_addr).await.expect("c connects to b");

    tokio::time::sleep(Duration::from_millis(50)).await;

    a.broadcast(Command::BroadcastTx, b"a transaction".to_vec()).await;

    tokio::time::sleep(Duration::from_millis(200)).await;

    assert_eq!(a_handler.broadcasts_seen.load(Ordering::SeqCst), 0);
    assert_eq!(b_handler.broadcasts_seen.load(Ordering::SeqCst), 1);
    assert_eq!(c_handler.broadcasts_seen.load(Ordering::SeqCst), 1);
}
