//! Co-op client transport
//!
//! Connects synchronously (bounded by the connect timeout), then hands the
//! socket to a background thread. The frame loop queues lines with
//! [`CoopClient::send`] and drains host records with [`CoopClient::poll`].

use std::net::SocketAddr;
use std::thread::JoinHandle;
use std::time::Duration;

use tokio::io::BufReader;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

use crate::game::constants::net::CONNECT_TIMEOUT_SECS;
use crate::net::framing::{read_line, write_line, FramingError};
use crate::net::protocol::{decode_line, encode_line, ClientMessage, HostMessage};
use crate::net::queue::{EventQueue, QueueSender};
use crate::net::NetError;

#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    Message(HostMessage),
    /// The connection is gone; no further events follow
    Disconnected,
}

pub struct CoopClient {
    events: EventQueue<ClientEvent>,
    outgoing: mpsc::UnboundedSender<String>,
    peer_addr: Option<SocketAddr>,
    shutdown: Option<oneshot::Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl CoopClient {
    /// Connect to `address` (`host:port`) and introduce ourselves as `name`
    pub fn connect(address: &str, name: &str) -> Result<Self, NetError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(NetError::Runtime)?;

        let timeout = Duration::from_secs_f32(CONNECT_TIMEOUT_SECS);
        let stream = runtime
            .block_on(async { tokio::time::timeout(timeout, TcpStream::connect(address)).await })
            .map_err(|_| NetError::ConnectTimeout(address.to_string()))?
            .map_err(|source| NetError::Connect {
                addr: address.to_string(),
                source,
            })?;
        let peer_addr = stream.peer_addr().ok();

        let events = EventQueue::default();
        let (outgoing, outgoing_rx) = mpsc::unbounded_channel();
        match encode_line(&ClientMessage::Hello { name: name.to_string() }) {
            Ok(line) => {
                let _ = outgoing.send(line);
            }
            Err(e) => warn!("Failed to encode hello: {}", e),
        }

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let sender = events.sender();
        let thread = std::thread::Builder::new()
            .name("arena-client".into())
            .spawn(move || {
                runtime.block_on(run_connection(stream, outgoing_rx, sender, shutdown_rx));
            })
            .map_err(NetError::Thread)?;

        info!("Connected to host {}", address);

        Ok(Self {
            events,
            outgoing,
            peer_addr,
            shutdown: Some(shutdown_tx),
            thread: Some(thread),
        })
    }

    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.peer_addr
    }

    /// Queue a record for the host. Returns false once the connection is gone.
    pub fn send(&self, message: &ClientMessage) -> bool {
        match encode_line(message) {
            Ok(line) => self.outgoing.send(line).is_ok(),
            Err(e) => {
                warn!("Failed to encode client message: {}", e);
                false
            }
        }
    }

    pub fn poll(&self) -> Vec<ClientEvent> {
        self.events.drain()
    }

    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                error!("Client network thread panicked");
            }
        }
    }
}

impl Drop for CoopClient {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn run_connection(
    stream: TcpStream,
    mut outgoing: mpsc::UnboundedReceiver<String>,
    events: QueueSender<ClientEvent>,
    mut shutdown: oneshot::Receiver<()>,
) {
    if let Err(e) = stream.set_nodelay(true) {
        debug!("set_nodelay failed: {}", e);
    }
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);

    let reading = async {
        loop {
            match read_line(&mut reader).await {
                Ok(line) => match decode_line::<HostMessage>(&line) {
                    Ok(message) => {
                        if let Err(e) = events.try_send(ClientEvent::Message(message)) {
                            warn!("Dropping host record: {}", e);
                        }
                    }
                    Err(e) => debug!("Ignoring host record: {}", e),
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
        _ = &mut shutdown => return,
        e = reading => info!("Host connection closed: {}", e),
        res = writing => {
            if let Err(e) = res {
                info!("Host connection write failed: {}", e);
            }
        }
    }

    if let Err(e) = events.send_priority(ClientEvent::Disconnected) {
        warn!("Dropping disconnect event: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::constants::net::EVENT_QUEUE_CAPACITY;
    use std::time::Instant;
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt};

    fn wait_for(client: &CoopClient, want: usize) -> Vec<ClientEvent> {
        let deadline = Instant::now() + Duration::from_secs(5);
        let mut got = Vec::new();
        while got.len() < want && Instant::now() < deadline {
            got.extend(client.poll());
            std::thread::sleep(Duration::from_millis(5));
        }
        got
    }

    #[test]
    fn test_connect_refused_is_reported() {
        // Bind then drop to get a port nothing listens on
        let addr = std::net::TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap();
        let result = CoopClient::connect(&addr.to_string(), "Ana");
        assert!(matches!(result, Err(NetError::Connect { .. }) | Err(NetError::ConnectTimeout(_))));
    }

    #[test]
    fn test_hello_records_and_disconnect() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let mut client = CoopClient::connect(&addr.to_string(), "Ana").unwrap();
        let (socket, _) = listener.accept().unwrap();
        socket.set_nonblocking(true).unwrap();

        let rt = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
        let stream = rt.block_on(async { TcpStream::from_std(socket) }).unwrap();
        let (read_half, mut write_half) = stream.into_split();
        let mut reader = BufReader::new(read_half);

        let mut hello = String::new();
        rt.block_on(reader.read_line(&mut hello)).unwrap();
        assert_eq!(hello, "{\"type\":\"hello\",\"name\":\"Ana\"}\n");

        assert!(client.send(&ClientMessage::BuyOrEquip { weapon: "rifle".into() }));
        let mut buy = String::new();
        rt.block_on(reader.read_line(&mut buy)).unwrap();
        assert!(buy.contains("buy_or_equip"));

        rt.block_on(write_half.write_all(b"nonsense\n{\"type\":\"welcome\",\"player_id\":\"p3\"}\n"))
            .unwrap();
        let events = wait_for(&client, 1);
        assert_eq!(
            events,
            vec![ClientEvent::Message(HostMessage::Welcome { player_id: "p3".into() })]
        );

        drop(write_half);
        drop(reader);
        assert_eq!(wait_for(&client, 1), vec![ClientEvent::Disconnected]);
        client.stop();
    }

    #[test]
    fn test_disconnect_survives_record_flood() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let mut client = CoopClient::connect(&addr.to_string(), "Ana").unwrap();
        let (socket, _) = listener.accept().unwrap();
        socket.set_nonblocking(true).unwrap();

        let rt = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
        let stream = rt.block_on(async { TcpStream::from_std(socket) }).unwrap();
        let (read_half, mut write_half) = stream.into_split();
        let mut reader = BufReader::new(read_half);
        let mut hello = String::new();
        rt.block_on(reader.read_line(&mut hello)).unwrap();

        let flood = "{\"type\":\"welcome\",\"player_id\":\"p1\"}\n".repeat(EVENT_QUEUE_CAPACITY + 50);
        rt.block_on(write_half.write_all(flood.as_bytes())).unwrap();
        drop(write_half);
        drop(reader);

        let deadline = Instant::now() + Duration::from_secs(5);
        while client.events.pending_count() < EVENT_QUEUE_CAPACITY + 1 && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(5));
        }
        let events = client.poll();
        assert_eq!(events.first(), Some(&ClientEvent::Disconnected));
        assert_eq!(events.len(), EVENT_QUEUE_CAPACITY + 1);
        client.stop();
    }
}
