use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message as WsMessage, WebSocket};
use courtcast_core::domain::GroupName;
use dashmap::DashMap;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use uuid::Uuid;

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);
const CLIENT_TIMEOUT: Duration = Duration::from_secs(90);

/// Unique connection identifier.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ClientId(pub String);

impl Default for ClientId {
    fn default() -> Self {
        Self(format!("client_{}", Uuid::now_v7()))
    }
}

impl ClientId {
    pub fn new() -> Self {
        Self::default()
    }
}

impl std::fmt::Display for ClientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A connected WebSocket client. Group membership is fixed at
/// registration: the caller's own username group, plus the officers
/// group for back-office connections.
pub struct Client {
    pub id: ClientId,
    pub groups: HashSet<GroupName>,
    pub tx: mpsc::Sender<String>,
    pub connected: AtomicBool,
    pub last_pong: AtomicU64,
}

impl Client {
    fn new(id: ClientId, groups: HashSet<GroupName>, tx: mpsc::Sender<String>) -> Self {
        Self {
            id,
            groups,
            tx,
            connected: AtomicBool::new(true),
            last_pong: AtomicU64::new(now_secs()),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Relaxed)
    }

    pub fn record_pong(&self) {
        self.last_pong.store(now_secs(), Ordering::Relaxed);
    }

    pub fn is_alive(&self) -> bool {
        let last = self.last_pong.load(Ordering::Relaxed);
        now_secs().saturating_sub(last) < CLIENT_TIMEOUT.as_secs()
    }
}

fn now_secs() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Registry of all connected WebSocket clients, addressable by group.
/// It answers "which connections are in group G"; who *should* be in a
/// group is recomputed from the Conference aggregate on every broadcast.
pub struct ClientRegistry {
    clients: DashMap<ClientId, Arc<Client>>,
    max_send_queue: usize,
}

impl ClientRegistry {
    pub fn new(max_send_queue: usize) -> Self {
        Self {
            clients: DashMap::new(),
            max_send_queue,
        }
    }

    /// Register a new client with its group subscriptions and return its
    /// ID + the receiving end of its send queue.
    pub fn register(&self, groups: HashSet<GroupName>) -> (ClientId, mpsc::Receiver<String>) {
        let id = ClientId::new();
        let (tx, rx) = mpsc::channel(self.max_send_queue);
        let client = Arc::new(Client::new(id.clone(), groups, tx));
        self.clients.insert(id.clone(), client);
        (id, rx)
    }

    /// Remove a client by ID.
    pub fn unregister(&self, id: &ClientId) {
        if let Some((_, client)) = self.clients.remove(id) {
            client.connected.store(false, Ordering::Relaxed);
        }
    }

    /// Deliver a message to every connected client in a group. Returns
    /// the number of clients reached. A full send queue drops the
    /// message for that client (backpressure, never blocking dispatch).
    pub fn send_to_group(&self, group: &GroupName, message: &str) -> usize {
        let mut delivered = 0;
        for entry in self.clients.iter() {
            let client = entry.value();
            if !client.groups.contains(group) || !client.is_connected() {
                continue;
            }
            match client.tx.try_send(message.to_string()) {
                Ok(()) => delivered += 1,
                Err(mpsc::error::TrySendError::Full(msg)) => {
                    tracing::warn!(
                        client_id = %client.id,
                        group = %group,
                        msg_len = msg.len(),
                        "Send queue full, dropping message"
                    );
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {}
            }
        }
        delivered
    }

    /// Number of connected clients.
    pub fn count(&self) -> usize {
        self.clients.len()
    }

    /// Number of connected clients subscribed to a group.
    pub fn group_size(&self, group: &GroupName) -> usize {
        self.clients
            .iter()
            .filter(|e| e.value().groups.contains(group) && e.value().is_connected())
            .count()
    }

    /// Remove clients that haven't responded to pings within the timeout.
    pub fn cleanup_dead_clients(&self) -> usize {
        let dead: Vec<ClientId> = self
            .clients
            .iter()
            .filter(|entry| !entry.value().is_alive())
            .map(|entry| entry.value().id.clone())
            .collect();

        let removed = dead.len();
        for id in dead {
            self.unregister(&id);
            tracing::info!(client_id = %id, "Cleaned up dead client");
        }
        removed
    }

    fn get(&self, id: &ClientId) -> Option<Arc<Client>> {
        self.clients.get(id).map(|e| Arc::clone(e.value()))
    }
}

/// Handle a WebSocket connection: split into reader/writer, manage
/// lifecycle with ping/pong liveness.
pub async fn handle_ws_connection(
    socket: WebSocket,
    client_id: ClientId,
    mut rx: mpsc::Receiver<String>,
    registry: Arc<ClientRegistry>,
) {
    let (mut ws_tx, mut ws_rx) = socket.split();

    // Writer task: forward queued messages to the socket + periodic ping
    let writer_cid = client_id.clone();
    let writer_registry = Arc::clone(&registry);
    let writer = tokio::spawn(async move {
        let mut ping_interval = tokio::time::interval(HEARTBEAT_INTERVAL);
        ping_interval.tick().await; // consume first immediate tick

        loop {
            tokio::select! {
                msg = rx.recv() => {
                    match msg {
                        Some(text) => {
                            if ws_tx.send(WsMessage::Text(text.into())).await.is_err() {
                                break;
                            }
                        }
                        None => break,
                    }
                }
                _ = ping_interval.tick() => {
                    if ws_tx.send(WsMessage::Ping(vec![].into())).await.is_err() {
                        break;
                    }
                    tracing::trace!(client_id = %writer_cid, "Sent ping");
                }
            }
        }

        if let Some(client) = writer_registry.get(&writer_cid) {
            client.connected.store(false, Ordering::Relaxed);
        }
    });

    // Reader task: track pongs; clients receive, they don't speak
    let reader_cid = client_id.clone();
    let reader_registry = Arc::clone(&registry);
    let reader = tokio::spawn(async move {
        while let Some(Ok(msg)) = ws_rx.next().await {
            match msg {
                WsMessage::Pong(_) => {
                    if let Some(client) = reader_registry.get(&reader_cid) {
                        client.record_pong();
                    }
                }
                WsMessage::Close(_) => break,
                WsMessage::Text(text) => {
                    tracing::trace!(client_id = %reader_cid, len = text.len(), "Ignoring inbound text");
                }
                WsMessage::Ping(_) => {} // axum answers pongs automatically
                _ => {}
            }
        }
    });

    // Wait for either task to finish
    tokio::select! {
        _ = writer => {},
        _ = reader => {},
    }

    registry.unregister(&client_id);
}

/// Start a background task that periodically cleans up dead clients.
pub fn start_cleanup_task(
    registry: Arc<ClientRegistry>,
    interval: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            let removed = registry.cleanup_dead_clients();
            if removed > 0 {
                tracing::info!(removed = removed, "Dead client cleanup");
            }
        }
    })
}
