//! Action response finalization.
//!
//! The last step before a transaction template is returned to the caller:
//! fill the recency anchor if the route left it empty, optionally attach an
//! attestation, and serialize to the transport encoding. The caller owns
//! anchor validity before submission and signs the transaction itself.

use serde::{Deserialize, Serialize};
use tracing::debug;

use amora_crypto::pubkey::Pubkey;

use crate::attest::Attestation;
use crate::error::ChainError;
use crate::identity::{ActionIdentity, ACTION_IDENTITY_ENV};
use crate::transaction::Transaction;

/// Placeholder recency anchor (32 zero bytes) substituted when the skeleton
/// carries none.
pub const PLACEHOLDER_ANCHOR: Pubkey = Pubkey::new([0u8; 32]);

/// What an action route returns to its caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionResponse {
    /// base64-encoded transaction, ready for the caller to sign.
    pub transaction: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Finalize a transaction skeleton into an [`ActionResponse`].
///
/// Attestation is optional per call: with no explicit `identity`, one
/// attempt is made to load the configured identity from the environment;
/// if none is available the transaction is returned unattested rather than
/// failing.
pub fn finalize(
    mut tx: Transaction,
    identity: Option<&ActionIdentity>,
    message: Option<String>,
) -> Result<ActionResponse, ChainError> {
    if tx.recent_anchor.is_none() {
        tx.recent_anchor = Some(PLACEHOLDER_ANCHOR);
    }

    let loaded;
    let identity = match identity {
        Some(identity) => Some(identity),
        None => match ActionIdentity::from_env(ACTION_IDENTITY_ENV) {
            Ok(from_env) => {
                loaded = from_env;
                Some(&loaded)
            }
            Err(_) => {
                debug!("no attestation identity available, returning unattested transaction");
                None
            }
        },
    };

    if let Some(identity) = identity {
        Attestation::create(identity).attach(&mut tx);
    }

    Ok(ActionResponse {
        transaction: tx.serialize_base64()?,
        message,
    })
}
