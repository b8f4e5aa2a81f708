pub mod client;
pub mod framing;
pub mod game_session;
pub mod host;
pub mod protocol;
pub mod queue;
pub mod sync;

use std::io;
use std::net::SocketAddr;

/// Failures while setting up a network role
#[derive(Debug, thiserror::Error)]
pub enum NetError {
    #[error("failed to bind {addr}: {source}")]
    Bind { addr: SocketAddr, source: io::Error },
    #[error("failed to connect to {addr}: {source}")]
    Connect { addr: String, source: io::Error },
    #[error("timed out connecting to {0}")]
    ConnectTimeout(String),
    #[error("failed to start network runtime: {0}")]
    Runtime(io::Error),
    #[error("failed to spawn network thread: {0}")]
    Thread(io::Error),
}
