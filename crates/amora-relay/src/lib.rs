//! amora-relay: identifier-addressed WebSocket relay.
//!
//! Forwards end-to-end encrypted envelopes between exactly the two parties
//! of a conversation, addressed by public identifier. The relay never
//! inspects or decrypts envelope contents; delivery is best-effort by
//! design (no queuing, no persistence, no delivery guarantee).

pub mod api;
pub mod config;
pub mod metrics;
pub mod protocol;
pub mod registry;
pub mod server;
pub mod session;

pub use config::ServerConfig;
pub use server::RelayServer;
