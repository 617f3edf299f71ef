//! Relay wire protocol.
//!
//! JSON text frames, externally tagged by `type`. The relay reads only the
//! routing fields; everything else in a `message` frame (the envelope and
//! any accompanying fields) is opaque and re-delivered as the sender's
//! original text. Join claims are not authenticated: any connection may
//! claim any identifier, and the newest claim is that identifier's current
//! endpoint.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Client → relay control frames.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ClientFrame {
    /// Subscribe this connection under a public identifier.
    Join { identifier: String },

    /// Forward the carrying frame to `recipient`'s current connection.
    Message {
        recipient: String,
        #[serde(flatten)]
        rest: Map<String, Value>,
    },
}

/// Relay → client frames. Forwarded messages are delivered verbatim, not
/// re-encoded, so the only frame the relay originates is an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ServerFrame {
    Error { message: String },
}

impl ServerFrame {
    pub fn error(message: impl Into<String>) -> String {
        let frame = ServerFrame::Error {
            message: message.into(),
        };
        // Serializing a string-only enum cannot fail
        serde_json::to_string(&frame).unwrap_or_default()
    }
}
