//! Sealed-message encryption.
//!
//! HPKE-style sealing using X25519 + HKDF + XChaCha20Poly1305: a fresh
//! ephemeral keypair per message, a shared key derived from Diffie-Hellman
//! with the recipient's long-lived key, and an AEAD under a random 24-byte
//! nonce. The nonce and ephemeral public key travel with the ciphertext, so
//! every message is self-contained.

use chacha20poly1305::{
    aead::{Aead, KeyInit},
    Key, XChaCha20Poly1305, XNonce,
};
use hkdf::Hkdf;
use rand_core::OsRng;
use sha2::Sha256;
use x25519_dalek::{EphemeralSecret, PublicKey as X25519PublicKey};

use crate::error::CryptoError;
use crate::identity::MessagingIdentity;
use crate::pubkey::Pubkey;

/// AEAD nonce length in bytes.
pub const NONCE_LEN: usize = 24;
/// X25519 public key length in bytes.
pub const KEY_LEN: usize = 32;

/// One encrypted message: the envelope contents before transport framing.
///
/// Immutable once constructed. The ephemeral key is never reused across two
/// messages; `seal` consumes it inside the Diffie-Hellman.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedMessage {
    pub nonce: [u8; NONCE_LEN],
    pub ephemeral_public: Pubkey,
    pub ciphertext: Vec<u8>,
}

fn derive_key(shared_secret: &[u8; 32]) -> [u8; 32] {
    let hk = Hkdf::<Sha256>::new(None, shared_secret);
    let mut key = [0u8; 32];
    hk.expand(b"amora_seal_v1_key", &mut key)
        .expect("HKDF expand should not fail for 32-byte output");
    key
}

/// Encrypt `plaintext` to `recipient`.
///
/// Generates a fresh ephemeral keypair and a fresh random nonce per call;
/// the derived symmetric key is unique to this message.
pub fn seal(plaintext: &[u8], recipient: &Pubkey) -> Result<SealedMessage, CryptoError> {
    let ephemeral = EphemeralSecret::random_from_rng(OsRng);
    let ephemeral_public = X25519PublicKey::from(&ephemeral);

    let recipient_public = X25519PublicKey::from(recipient.to_bytes());
    let shared = ephemeral.diffie_hellman(&recipient_public);
    // Reject low-order recipient keys rather than encrypt under a
    // predictable secret.
    if !shared.was_contributory() {
        return Err(CryptoError::EncryptionFailed);
    }

    let key = derive_key(shared.as_bytes());

    let mut nonce = [0u8; NONCE_LEN];
    getrandom::getrandom(&mut nonce).map_err(|_| CryptoError::EncryptionFailed)?;

    let cipher = XChaCha20Poly1305::new(Key::from_slice(&key));
    let ciphertext = cipher
        .encrypt(XNonce::from_slice(&nonce), plaintext)
        .map_err(|_| CryptoError::EncryptionFailed)?;

    Ok(SealedMessage {
        nonce,
        ephemeral_public: Pubkey::new(*ephemeral_public.as_bytes()),
        ciphertext,
    })
}

/// Authenticate and decrypt a sealed message with the recipient's identity.
///
/// Any tampering with the nonce, ephemeral key, or ciphertext, or use of the
/// wrong secret key, fails authentication and returns `DecryptionFailed`,
/// never partial plaintext.
pub fn open(sealed: &SealedMessage, identity: &MessagingIdentity) -> Result<Vec<u8>, CryptoError> {
    let ephemeral_public = X25519PublicKey::from(sealed.ephemeral_public.to_bytes());
    let shared = identity.secret().diffie_hellman(&ephemeral_public);
    if !shared.was_contributory() {
        return Err(CryptoError::DecryptionFailed);
    }

    let key = derive_key(shared.as_bytes());
    let cipher = XChaCha20Poly1305::new(Key::from_slice(&key));
    cipher
        .decrypt(XNonce::from_slice(&sealed.nonce), sealed.ciphertext.as_slice())
        .map_err(|_| CryptoError::DecryptionFailed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seal_open_round_trip() {
        let recipient = MessagingIdentity::generate();
        let plaintext = b"hello";

        let sealed = seal(plaintext, &recipient.public()).unwrap();
        assert_eq!(sealed.nonce.len(), NONCE_LEN);
        assert_eq!(sealed.ephemeral_public.as_bytes().len(), KEY_LEN);

        let opened = open(&sealed, &recipient).unwrap();
        assert_eq!(opened, plaintext);
    }

    #[test]
    fn test_open_with_wrong_identity_fails() {
        let recipient = MessagingIdentity::generate();
        let other = MessagingIdentity::generate();

        let sealed = seal(b"hello", &recipient.public()).unwrap();
        assert_eq!(
            open(&sealed, &other).unwrap_err(),
            CryptoError::DecryptionFailed
        );
    }

    #[test]
    fn test_ciphertext_tamper_detected() {
        let recipient = MessagingIdentity::generate();
        let mut sealed = seal(b"payload bytes", &recipient.public()).unwrap();

        sealed.ciphertext[0] ^= 0x01;
        assert_eq!(
            open(&sealed, &recipient).unwrap_err(),
            CryptoError::DecryptionFailed
        );
    }

    #[test]
    fn test_nonce_tamper_detected() {
        let recipient = MessagingIdentity::generate();
        let mut sealed = seal(b"payload bytes", &recipient.public()).unwrap();

        sealed.nonce[0] ^= 0x01;
        assert_eq!(
            open(&sealed, &recipient).unwrap_err(),
            CryptoError::DecryptionFailed
        );
    }

    #[test]
    fn test_ephemeral_key_tamper_detected() {
        let recipient = MessagingIdentity::generate();
        let mut sealed = seal(b"payload bytes", &recipient.public()).unwrap();

        let mut key = sealed.ephemeral_public.to_bytes();
        key[3] ^= 0x80;
        sealed.ephemeral_public = Pubkey::new(key);
        assert_eq!(
            open(&sealed, &recipient).unwrap_err(),
            CryptoError::DecryptionFailed
        );
    }

    #[test]
    fn test_fresh_key_material_per_message() {
        let recipient = MessagingIdentity::generate();

        let a = seal(b"same plaintext", &recipient.public()).unwrap();
        let b = seal(b"same plaintext", &recipient.public()).unwrap();

        assert_ne!(a.nonce, b.nonce);
        assert_ne!(a.ephemeral_public, b.ephemeral_public);
        assert_ne!(a.ciphertext, b.ciphertext);
    }

    #[test]
    fn test_empty_plaintext_round_trip() {
        let recipient = MessagingIdentity::generate();
        let sealed = seal(b"", &recipient.public()).unwrap();
        // Ciphertext still carries the 16-byte authentication tag
        assert_eq!(sealed.ciphertext.len(), 16);
        assert_eq!(open(&sealed, &recipient).unwrap(), b"");
    }
}
