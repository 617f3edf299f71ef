//! Messaging identities.
//!
//! A participant's long-lived X25519 keypair. The public half is the
//! routing address on the relay and the recipient key for sealing. Keypairs
//! are supplied externally (by the wallet) and never rotated here.

use rand_core::OsRng;
use x25519_dalek::{PublicKey as X25519PublicKey, StaticSecret};

use crate::pubkey::Pubkey;

/// A long-lived X25519 keypair identifying one participant.
///
/// The secret half is zeroized on drop by the underlying `StaticSecret`.
pub struct MessagingIdentity {
    secret: StaticSecret,
}

impl MessagingIdentity {
    /// Generate a new random identity from the OS random source.
    pub fn generate() -> Self {
        Self {
            secret: StaticSecret::random_from_rng(OsRng),
        }
    }

    /// Create an identity from an existing 32-byte X25519 secret key.
    pub fn from_bytes(secret: [u8; 32]) -> Self {
        Self {
            secret: StaticSecret::from(secret),
        }
    }

    /// The public identifier: routing address and recipient sealing key.
    pub fn public(&self) -> Pubkey {
        Pubkey::new(*X25519PublicKey::from(&self.secret).as_bytes())
    }

    pub(crate) fn secret(&self) -> &StaticSecret {
        &self.secret
    }
}
