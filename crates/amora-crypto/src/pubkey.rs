//! Public identifiers.
//!
//! A `Pubkey` is the stable 32-byte public half of a participant keypair. It
//! is rendered base58 on every wire surface: relay addressing, memo fields,
//! and account keys on transaction skeletons.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::CryptoError;

/// Public key / identifier length in bytes.
pub const PUBKEY_LEN: usize = 32;

/// A 32-byte public identifier, displayed and parsed as base58.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Pubkey([u8; PUBKEY_LEN]);

impl Pubkey {
    pub const fn new(bytes: [u8; PUBKEY_LEN]) -> Self {
        Self(bytes)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        let arr: [u8; PUBKEY_LEN] =
            bytes
                .try_into()
                .map_err(|_| CryptoError::InvalidKeyLength {
                    expected: PUBKEY_LEN,
                    got: bytes.len(),
                })?;
        Ok(Self(arr))
    }

    pub const fn to_bytes(self) -> [u8; PUBKEY_LEN] {
        self.0
    }

    pub fn as_bytes(&self) -> &[u8; PUBKEY_LEN] {
        &self.0
    }
}

impl From<[u8; PUBKEY_LEN]> for Pubkey {
    fn from(bytes: [u8; PUBKEY_LEN]) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for Pubkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", bs58::encode(&self.0).into_string())
    }
}

impl fmt::Debug for Pubkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pubkey({})", self)
    }
}

impl FromStr for Pubkey {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = bs58::decode(s)
            .into_vec()
            .map_err(|_| CryptoError::InvalidIdentifier)?;
        Self::from_slice(&bytes).map_err(|_| CryptoError::InvalidIdentifier)
    }
}

impl Serialize for Pubkey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Pubkey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base58_round_trip() {
        let key = Pubkey::new([7u8; 32]);
        let s = key.to_string();
        let parsed: Pubkey = s.parse().unwrap();
        assert_eq!(parsed, key);
    }

    #[test]
    fn test_zero_key_renders_all_ones() {
        // 32 zero bytes is the well-known placeholder anchor
        let key = Pubkey::new([0u8; 32]);
        assert_eq!(key.to_string(), "11111111111111111111111111111111");
    }

    #[test]
    fn test_wrong_length_rejected() {
        // Valid base58, but decodes to fewer than 32 bytes
        assert!("abc".parse::<Pubkey>().is_err());
        // Not base58 at all
        assert!("0OIl".parse::<Pubkey>().is_err());
    }

    #[test]
    fn test_from_slice_length_check() {
        let err = Pubkey::from_slice(&[1u8; 31]).unwrap_err();
        assert_eq!(
            err,
            CryptoError::InvalidKeyLength {
                expected: 32,
                got: 31
            }
        );
    }

    #[test]
    fn test_serde_as_base58_string() {
        let key = Pubkey::new([9u8; 32]);
        let json = serde_json::to_string(&key).unwrap();
        assert_eq!(json, format!("\"{}\"", key));
        let back: Pubkey = serde_json::from_str(&json).unwrap();
        assert_eq!(back, key);
    }
}
