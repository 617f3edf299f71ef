//! Transport framing for sealed messages.
//!
//! The envelope wire format is the fixed-order concatenation
//! nonce ∥ ephemeral public key ∥ ciphertext, rendered base64 so it can ride
//! inside JSON control frames. Decoding validates the minimum length before
//! slicing.

use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::error::CryptoError;
use crate::pubkey::Pubkey;
use crate::seal::{SealedMessage, KEY_LEN, NONCE_LEN};

/// Frame a sealed message into its transport string.
pub fn encode(sealed: &SealedMessage) -> String {
    let mut buf = Vec::with_capacity(NONCE_LEN + KEY_LEN + sealed.ciphertext.len());
    buf.extend_from_slice(&sealed.nonce);
    buf.extend_from_slice(sealed.ephemeral_public.as_bytes());
    buf.extend_from_slice(&sealed.ciphertext);
    STANDARD.encode(buf)
}

/// Parse a transport string back into a sealed message.
///
/// A string that is not valid base64, or whose decoded length is shorter
/// than nonce + public key, is `MalformedEnvelope`.
pub fn decode(transport: &str) -> Result<SealedMessage, CryptoError> {
    let bytes = STANDARD
        .decode(transport)
        .map_err(|_| CryptoError::MalformedEnvelope)?;

    if bytes.len() < NONCE_LEN + KEY_LEN {
        return Err(CryptoError::MalformedEnvelope);
    }

    let mut nonce = [0u8; NONCE_LEN];
    nonce.copy_from_slice(&bytes[..NONCE_LEN]);
    let ephemeral_public = Pubkey::from_slice(&bytes[NONCE_LEN..NONCE_LEN + KEY_LEN])
        .map_err(|_| CryptoError::MalformedEnvelope)?;
    let ciphertext = bytes[NONCE_LEN + KEY_LEN..].to_vec();

    Ok(SealedMessage {
        nonce,
        ephemeral_public,
        ciphertext,
    })
}
