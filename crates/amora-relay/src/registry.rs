//! Live-connection registry.
//!
//! The single shared mutable resource of the relay: a map from public
//! identifier to that identifier's current connection. All mutations go
//! through `register` / `remove_if_current` / `route`, which keeps every
//! per-identifier transition atomic on the map entry, so a forward can
//! never land on a handle that teardown already released.

use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use amora_crypto::pubkey::Pubkey;

/// Outcome of a forward attempt. Undeliverable frames are dropped, not
/// retried; delivery is best-effort by explicit design.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteOutcome {
    Delivered,
    /// Recipient has no live connection.
    NotConnected,
    /// Recipient's outbound queue is full; the frame is dropped rather than
    /// applying backpressure to the sender.
    QueueFull,
}

#[derive(Debug, Clone)]
struct PeerHandle {
    conn_id: u64,
    tx: mpsc::Sender<String>,
}

pub struct ConnectionRegistry {
    peers: DashMap<Pubkey, PeerHandle>,
    next_conn_id: AtomicU64,
    queue_depth: usize,
}

impl ConnectionRegistry {
    pub fn new(queue_depth: usize) -> Self {
        Self {
            peers: DashMap::new(),
            next_conn_id: AtomicU64::new(1),
            queue_depth,
        }
    }

    /// Allocate a process-unique connection id.
    pub fn next_conn_id(&self) -> u64 {
        self.next_conn_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Create the bounded outbound queue for one connection.
    pub fn channel(&self) -> (mpsc::Sender<String>, mpsc::Receiver<String>) {
        mpsc::channel(self.queue_depth)
    }

    /// Register a connection under `identifier`. Last join wins: a prior
    /// live connection for the identifier is superseded (it stays open but
    /// no longer receives forwards). Join claims are not authenticated;
    /// returns whether a previous handle was replaced.
    pub fn register(&self, identifier: Pubkey, conn_id: u64, tx: mpsc::Sender<String>) -> bool {
        self.peers
            .insert(identifier, PeerHandle { conn_id, tx })
            .is_some()
    }

    /// Release `identifier`'s entry, but only if it still points at
    /// `conn_id`. A connection that was superseded must not tear down its
    /// replacement's registration.
    pub fn remove_if_current(&self, identifier: &Pubkey, conn_id: u64) -> bool {
        self.peers
            .remove_if(identifier, |_, handle| handle.conn_id == conn_id)
            .is_some()
    }

    /// Forward a frame to `recipient`'s current connection, best-effort.
    pub fn route(&self, recipient: &Pubkey, frame: String) -> RouteOutcome {
        match self.peers.get(recipient) {
            Some(handle) => match handle.tx.try_send(frame) {
                Ok(()) => RouteOutcome::Delivered,
                Err(TrySendError::Full(_)) => RouteOutcome::QueueFull,
                // Receiver already dropped: the connection is mid-teardown
                Err(TrySendError::Closed(_)) => RouteOutcome::NotConnected,
            },
            None => RouteOutcome::NotConnected,
        }
    }

    /// Number of currently registered identifiers.
    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identifier(byte: u8) -> Pubkey {
        Pubkey::new([byte; 32])
    }

    #[tokio::test]
    async fn test_route_to_registered_identifier() {
        let registry = ConnectionRegistry::new(8);
        let (tx, mut rx) = registry.channel();
        let conn = registry.next_conn_id();
        assert!(!registry.register(identifier(1), conn, tx));

        assert_eq!(
            registry.route(&identifier(1), "frame".into()),
            RouteOutcome::Delivered
        );
        assert_eq!(rx.recv().await.unwrap(), "frame");
    }

    #[tokio::test]
    async fn test_route_to_absent_identifier_drops() {
        let registry = ConnectionRegistry::new(8);
        assert_eq!(
            registry.route(&identifier(9), "frame".into()),
            RouteOutcome::NotConnected
        );
    }

    #[tokio::test]
    async fn test_last_join_wins() {
        let registry = ConnectionRegistry::new(8);

        let (tx1, mut rx1) = registry.channel();
        let conn1 = registry.next_conn_id();
        assert!(!registry.register(identifier(1), conn1, tx1));

        let (tx2, mut rx2) = registry.channel();
        let conn2 = registry.next_conn_id();
        assert!(registry.register(identifier(1), conn2, tx2));

        assert_eq!(
            registry.route(&identifier(1), "to-c2".into()),
            RouteOutcome::Delivered
        );
        assert_eq!(rx2.recv().await.unwrap(), "to-c2");
        assert!(rx1.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_superseded_connection_cannot_remove_replacement() {
        let registry = ConnectionRegistry::new(8);

        let (tx1, _rx1) = registry.channel();
        let conn1 = registry.next_conn_id();
        registry.register(identifier(1), conn1, tx1);

        let (tx2, mut rx2) = registry.channel();
        let conn2 = registry.next_conn_id();
        registry.register(identifier(1), conn2, tx2);

        // Old connection tears down; the current registration survives
        assert!(!registry.remove_if_current(&identifier(1), conn1));
        assert_eq!(
            registry.route(&identifier(1), "still here".into()),
            RouteOutcome::Delivered
        );
        assert_eq!(rx2.recv().await.unwrap(), "still here");

        // Current connection tears down; entry released
        assert!(registry.remove_if_current(&identifier(1), conn2));
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_full_queue_drops_frame() {
        let registry = ConnectionRegistry::new(1);
        let (tx, mut rx) = registry.channel();
        let conn = registry.next_conn_id();
        registry.register(identifier(1), conn, tx);

        assert_eq!(
            registry.route(&identifier(1), "first".into()),
            RouteOutcome::Delivered
        );
        assert_eq!(
            registry.route(&identifier(1), "second".into()),
            RouteOutcome::QueueFull
        );

        // Only the first frame was queued
        assert_eq!(rx.recv().await.unwrap(), "first");
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_route_to_closed_receiver() {
        let registry = ConnectionRegistry::new(8);
        let (tx, rx) = registry.channel();
        let conn = registry.next_conn_id();
        registry.register(identifier(1), conn, tx);
        drop(rx);

        assert_eq!(
            registry.route(&identifier(1), "frame".into()),
            RouteOutcome::NotConnected
        );
    }
}
