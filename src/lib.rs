//! Bot Arena
//!
//! A first-person wave shooter against tactical bots, with an optional
//! host-authoritative co-op mode over newline-delimited JSON on TCP.
//!
//! - `game` - map, collision, weapons, bot AI and the authoritative simulation
//! - `render` - DDA raycaster producing backend-agnostic frames
//! - `net` - host/client transport, snapshot sync and the session driver

pub mod config;
pub mod game;
pub mod net;
pub mod render;
pub mod util;
