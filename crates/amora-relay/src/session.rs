//! Per-connection session state machine.
//!
//! A connection is `Connecting` until its first valid `join`, `Joined`
//! while registered, and `Closed` after teardown. Frame-level failures send
//! an error frame back and leave the connection open; only a transport
//! close or error ends the session, and teardown always releases the
//! connection's registry entry if it is still the current one.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::debug;

use amora_crypto::pubkey::Pubkey;

use crate::metrics::RelayMetrics;
use crate::protocol::{ClientFrame, ServerFrame};
use crate::registry::{ConnectionRegistry, RouteOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Connecting,
    Joined(Pubkey),
    Closed,
}

pub struct Session {
    conn_id: u64,
    state: SessionState,
    tx: mpsc::Sender<String>,
    registry: Arc<ConnectionRegistry>,
    metrics: Arc<RelayMetrics>,
    max_frame_bytes: usize,
}

impl Session {
    /// Open a session and its outbound queue. The returned receiver is the
    /// connection's forward stream; the transport loop drains it into the
    /// socket.
    pub fn new(
        registry: Arc<ConnectionRegistry>,
        metrics: Arc<RelayMetrics>,
        max_frame_bytes: usize,
    ) -> (Self, mpsc::Receiver<String>) {
        let (tx, rx) = registry.channel();
        let conn_id = registry.next_conn_id();
        metrics.active_connections.inc();
        (
            Self {
                conn_id,
                state: SessionState::Connecting,
                tx,
                registry,
                metrics,
                max_frame_bytes,
            },
            rx,
        )
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Handle one inbound text frame. Returns a frame to send back on this
    /// connection, if any. No inbound frame closes the connection.
    pub fn handle_text(&mut self, text: &str) -> Option<String> {
        if text.len() > self.max_frame_bytes {
            self.metrics.frame_errors.inc();
            return Some(ServerFrame::error("frame too large"));
        }

        let frame: ClientFrame = match serde_json::from_str(text) {
            Ok(frame) => frame,
            Err(_) => {
                self.metrics.frame_errors.inc();
                return Some(ServerFrame::error("malformed frame"));
            }
        };

        match frame {
            ClientFrame::Join { identifier } => self.handle_join(&identifier),
            ClientFrame::Message { recipient, .. } => self.handle_message(&recipient, text),
        }
    }

    fn handle_join(&mut self, identifier: &str) -> Option<String> {
        let identifier: Pubkey = match identifier.parse() {
            Ok(identifier) => identifier,
            Err(_) => {
                self.metrics.frame_errors.inc();
                return Some(ServerFrame::error("invalid identifier"));
            }
        };

        // Re-joining under a different identifier releases the old entry
        if let SessionState::Joined(previous) = self.state {
            if previous != identifier {
                self.registry.remove_if_current(&previous, self.conn_id);
            }
        }

        if self.registry.register(identifier, self.conn_id, self.tx.clone()) {
            debug!(identifier = %identifier, "previous connection superseded");
        }
        self.state = SessionState::Joined(identifier);
        self.metrics
            .registered_identifiers
            .set(self.registry.len() as f64);
        None
    }

    fn handle_message(&mut self, recipient: &str, raw: &str) -> Option<String> {
        let recipient: Pubkey = match recipient.parse() {
            Ok(recipient) => recipient,
            Err(_) => {
                self.metrics.frame_errors.inc();
                return Some(ServerFrame::error("invalid identifier"));
            }
        };

        // Forward the original frame text verbatim; the relay never
        // inspects envelope contents. Undeliverable frames are dropped
        // silently: best-effort delivery is the contract.
        match self.registry.route(&recipient, raw.to_string()) {
            RouteOutcome::Delivered => self.metrics.frames_forwarded.inc(),
            RouteOutcome::NotConnected => {
                self.metrics.frames_dropped_unroutable.inc();
                debug!(recipient = %recipient, "recipient not connected, frame dropped");
            }
            RouteOutcome::QueueFull => {
                self.metrics.frames_dropped_queue_full.inc();
                debug!(recipient = %recipient, "recipient queue full, frame dropped");
            }
        }
        None
    }

    /// Release this connection's registry entry if it is still current.
    /// Idempotent; also invoked on drop.
    pub fn close(&mut self) {
        if let SessionState::Joined(identifier) = self.state {
            self.registry.remove_if_current(&identifier, self.conn_id);
            self.metrics
                .registered_identifiers
                .set(self.registry.len() as f64);
        }
        if self.state != SessionState::Closed {
            self.metrics.active_connections.dec();
        }
        self.state = SessionState::Closed;
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.close();
    }
}
