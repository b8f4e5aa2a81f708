//! Co-op host transport
//!
//! A dedicated thread runs a single-threaded tokio runtime that accepts
//! peers, frames their lines and forwards decoded records to the frame loop
//! through an [`EventQueue`]. Outgoing lines go to each peer's writer task
//! over an unbounded channel, so the frame loop never waits on a socket.

use std::net::SocketAddr;
use std::sync::Arc;
use std::thread::JoinHandle;

use hashbrown::HashMap;
use parking_lot::RwLock;
use tokio::io::BufReader;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

use crate::game::state::PlayerId;
use crate::net::framing::{read_line, write_line, FramingError};
use crate::net::protocol::{decode_line, encode_line, ClientMessage, HostMessage};
use crate::net::queue::{EventQueue, QueueSender};
use crate::net::NetError;

/// What the network thread reports to the frame loop
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    Connected { player_id: PlayerId },
    Disconnected { player_id: PlayerId },
    Message { player_id: PlayerId, message: ClientMessage },
}

type PeerMap = RwLock<HashMap<PlayerId, mpsc::UnboundedSender<String>>>;

struct Shared {
    peers: PeerMap,
    events: QueueSender<HostEvent>,
}

impl Shared {
    fn push(&self, event: HostEvent) {
        if let Err(e) = self.events.try_send(event) {
            warn!("Dropping host event: {}", e);
        }
    }

    /// Connects and disconnects skip the bounded lane and are never dropped
    fn push_lifecycle(&self, event: HostEvent) {
        if let Err(e) = self.events.send_priority(event) {
            warn!("Dropping host lifecycle event: {}", e);
        }
    }

    /// Forget a peer. Only the first call for an id reports the disconnect.
    fn disconnect(&self, player_id: &str) {
        if self.peers.write().remove(player_id).is_some() {
            info!("Peer {} disconnected", player_id);
            self.push_lifecycle(HostEvent::Disconnected {
                player_id: player_id.to_string(),
            });
        }
    }
}

pub struct CoopHost {
    events: EventQueue<HostEvent>,
    shared: Arc<Shared>,
    local_addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl CoopHost {
    /// Bind and start accepting. Bind failures are returned before any thread
    /// is started.
    pub fn bind(addr: SocketAddr) -> Result<Self, NetError> {
        let std_listener = std::net::TcpListener::bind(addr).map_err(|source| NetError::Bind { addr, source })?;
        std_listener
            .set_nonblocking(true)
            .map_err(|source| NetError::Bind { addr, source })?;
        let local_addr = std_listener
            .local_addr()
            .map_err(|source| NetError::Bind { addr, source })?;

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(NetError::Runtime)?;

        let events = EventQueue::default();
        let shared = Arc::new(Shared {
            peers: RwLock::new(HashMap::new()),
            events: events.sender(),
        });
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let task_shared = shared.clone();
        let thread = std::thread::Builder::new()
            .name("arena-host".into())
            .spawn(move || {
                runtime.block_on(async move {
                    match TcpListener::from_std(std_listener) {
                        Ok(listener) => accept_loop(listener, task_shared, shutdown_rx).await,
                        Err(e) => error!("Host listener setup failed: {}", e),
                    }
                });
            })
            .map_err(NetError::Thread)?;

        info!("Hosting co-op on {}", local_addr);

        Ok(Self {
            events,
            shared,
            local_addr,
            shutdown: Some(shutdown_tx),
            thread: Some(thread),
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Everything the network thread reported since the last call
    pub fn poll(&self) -> Vec<HostEvent> {
        self.events.drain()
    }

    pub fn peer_count(&self) -> usize {
        self.shared.peers.read().len()
    }

    /// Queue `message` for one peer. Returns false if the peer is gone.
    pub fn send(&self, player_id: &str, message: &HostMessage) -> bool {
        match encode_line(message) {
            Ok(line) => self.send_line(player_id, line),
            Err(e) => {
                warn!("Failed to encode message for {}: {}", player_id, e);
                false
            }
        }
    }

    /// Queue an already-encoded line for one peer
    pub fn send_line(&self, player_id: &str, line: String) -> bool {
        match self.shared.peers.read().get(player_id) {
            Some(tx) => tx.send(line).is_ok(),
            None => false,
        }
    }

    /// Stop the network thread. In-flight sends are abandoned.
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                error!("Host network thread panicked");
            }
            info!("Host stopped");
        }
    }
}

impl Drop for CoopHost {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn accept_loop(listener: TcpListener, shared: Arc<Shared>, mut shutdown: oneshot::Receiver<()>) {
    let mut next_id: u32 = 1;
    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            accepted = listener.accept() => match accepted {
                Ok((stream, addr)) => {
                    let player_id = format!("p{}", next_id);
                    next_id += 1;

                    let (tx, rx) = mpsc::unbounded_channel();
                    // Welcome is always the first line a peer sees
                    match encode_line(&HostMessage::Welcome { player_id: player_id.clone() }) {
                        Ok(line) => {
                            let _ = tx.send(line);
                        }
                        Err(e) => warn!("Failed to encode welcome: {}", e),
                    }
                    shared.peers.write().insert(player_id.clone(), tx);
                    shared.push_lifecycle(HostEvent::Connected { player_id: player_id.clone() });
                    info!("Peer {} connected from {}", player_id, addr);

                    tokio::spawn(run_peer(stream, player_id, rx, shared.clone()));
                }
                Err(e) => warn!("Accept failed: {}", e),
            }
        }
    }
    shared.peers.write().clear();
}

async fn run_peer(
    stream: TcpStream,
    player_id: PlayerId,
    mut outgoing: mpsc::UnboundedReceiver<String>,
    shared: Arc<Shared>,
) {
    if let Err(e) = stream.set_nodelay(true) {
        debug!("set_nodelay failed for {}: {}", player_id, e);
    }
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);

    let reading = async {
        loop {
            match read_line(&mut reader).await {
                Ok(line) => match decode_line::<ClientMessage>(&line) {
                    Ok(message) => shared.push(HostEvent::Message {
                        player_id: player_id.clone(),
                        message,
                    }),
                    Err(e) => debug!("Ignoring record from {}: {}", player_id, e),
                },
                Err(e) => return e,
            }
        }
    };

    let writing = async {
        while let Some(line) = outgoing.recv().await {
            write_line(&mut write_half, &line).await?;
        }
        Ok::<(), FramingError>(())
    };

    tokio::select! {
        e = reading => debug!("Peer {} read ended: {}", player_id, e),
        res = writing => {
            if let Err(e) = res {
                debug!("Peer {} write failed: {}", player_id, e);
            }
        }
    }

    shared.disconnect(&player_id);
}
