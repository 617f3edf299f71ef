//! Action identity: the long-lived service keypair used to stamp
//! transaction templates.
//!
//! Distinct from user messaging identities. Loaded once from external
//! configuration (a JSON-encoded secret-key byte array) and passed explicitly
//! to the signing path; there is no process-global key.

use ed25519_dalek::{Signature, Signer, SigningKey, VerifyingKey};
use rand_core::OsRng;
use zeroize::Zeroize;

use amora_crypto::pubkey::Pubkey;

use crate::error::ChainError;

/// Default env variable holding the JSON-encoded secret-key byte array.
pub const ACTION_IDENTITY_ENV: &str = "AMORA_ACTION_IDENTITY";

/// An Ed25519 service keypair that signs attestation references.
pub struct ActionIdentity {
    signing: SigningKey,
}

impl ActionIdentity {
    /// Generate a fresh identity (provisioning and tests).
    pub fn generate() -> Self {
        Self {
            signing: SigningKey::generate(&mut OsRng),
        }
    }

    /// Create an identity from secret-key bytes.
    ///
    /// Accepts either a 32-byte seed or the 64-byte seed‖public
    /// concatenation used by the JSON configuration format. For 64-byte
    /// input the trailing public half must match the seed.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ChainError> {
        match bytes.len() {
            32 => {
                let seed: [u8; 32] = bytes.try_into().map_err(|_| ChainError::InvalidSecretKey)?;
                Ok(Self {
                    signing: SigningKey::from_bytes(&seed),
                })
            }
            64 => {
                let seed: [u8; 32] = bytes[..32]
                    .try_into()
                    .map_err(|_| ChainError::InvalidSecretKey)?;
                let signing = SigningKey::from_bytes(&seed);
                if signing.verifying_key().to_bytes() != bytes[32..] {
                    return Err(ChainError::InvalidSecretKey);
                }
                Ok(Self { signing })
            }
            _ => Err(ChainError::InvalidSecretKey),
        }
    }

    /// Load an identity from a JSON-encoded byte array in the given env
    /// variable. This is the single initialization point for configured
    /// identities; callers hold the result and pass it by reference.
    pub fn from_env(var: &str) -> Result<Self, ChainError> {
        let raw = std::env::var(var).map_err(|_| ChainError::MissingIdentity {
            var: var.to_string(),
        })?;
        let mut bytes: Vec<u8> =
            serde_json::from_str(&raw).map_err(|_| ChainError::MissingIdentity {
                var: var.to_string(),
            })?;
        let identity = Self::from_bytes(&bytes).map_err(|_| ChainError::MissingIdentity {
            var: var.to_string(),
        });
        bytes.zeroize();
        identity
    }

    /// The identity's public key.
    pub fn public(&self) -> Pubkey {
        Pubkey::new(self.signing.verifying_key().to_bytes())
    }

    /// Produce a detached signature over `message`.
    pub fn sign(&self, message: &[u8]) -> [u8; 64] {
        let signature: Signature = self.signing.sign(message);
        signature.to_bytes()
    }
}

/// Verify a detached Ed25519 signature.
pub fn verify_signature(
    public: &Pubkey,
    message: &[u8],
    signature: &[u8; 64],
) -> Result<(), ChainError> {
    let verifying =
        VerifyingKey::from_bytes(public.as_bytes()).map_err(|_| ChainError::BadSignature)?;
    verifying
        .verify_strict(message, &Signature::from_bytes(signature))
        .map_err(|_| ChainError::BadSignature)
}
