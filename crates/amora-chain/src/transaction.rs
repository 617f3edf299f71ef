//! Transaction skeletons at the collaborator boundary.
//!
//! The core receives a transaction with zero or more business instructions
//! and a recency anchor slot, appends the attestation instruction, and
//! serializes the result. It never originates business instructions; those
//! come from the calling route.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};

use amora_crypto::pubkey::Pubkey;

use crate::error::ChainError;

/// One account reference on an instruction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountMeta {
    pub pubkey: Pubkey,
    pub is_signer: bool,
    pub is_writable: bool,
}

impl AccountMeta {
    /// A non-signing, non-writable reference.
    pub fn readonly(pubkey: Pubkey) -> Self {
        Self {
            pubkey,
            is_signer: false,
            is_writable: false,
        }
    }
}

/// One program invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instruction {
    pub program_id: Pubkey,
    pub accounts: Vec<AccountMeta>,
    pub data: Vec<u8>,
}

/// A transaction skeleton: instructions plus a recency anchor slot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub fee_payer: Option<Pubkey>,
    pub recent_anchor: Option<Pubkey>,
    pub instructions: Vec<Instruction>,
}

impl Transaction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, instruction: Instruction) -> &mut Self {
        self.instructions.push(instruction);
        self
    }

    /// Serialize to the transport encoding: bincode, rendered base64.
    pub fn serialize_base64(&self) -> Result<String, ChainError> {
        let bytes = bincode::serialize(self).map_err(|e| ChainError::Serialize(e.to_string()))?;
        Ok(STANDARD.encode(bytes))
    }

    /// Parse a transaction from its transport encoding.
    pub fn deserialize_base64(transport: &str) -> Result<Self, ChainError> {
        let bytes = STANDARD
            .decode(transport)
            .map_err(|e| ChainError::Serialize(e.to_string()))?;
        bincode::deserialize(&bytes).map_err(|e| ChainError::Serialize(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_transaction() -> Transaction {
        let mut tx = Transaction::new();
        tx.fee_payer = Some(Pubkey::new([1u8; 32]));
        tx.recent_anchor = Some(Pubkey::new([2u8; 32]));
        tx.add(Instruction {
            program_id: Pubkey::new([3u8; 32]),
            accounts: vec![AccountMeta {
                pubkey: Pubkey::new([1u8; 32]),
                is_signer: true,
                is_writable: true,
            }],
            data: b"{\"action\":\"sendMessage\"}".to_vec(),
        });
        tx
    }

    #[test]
    fn test_transport_round_trip() {
        let tx = sample_transaction();
        let transport = tx.serialize_base64().unwrap();
        assert_eq!(Transaction::deserialize_base64(&transport).unwrap(), tx);
    }

    #[test]
    fn test_corrupt_transport_rejected() {
        assert!(Transaction::deserialize_base64("!!!").is_err());
        assert!(Transaction::deserialize_base64("AAAA").is_err());
    }

    #[test]
    fn test_readonly_meta_is_non_signing_non_writable() {
        let meta = AccountMeta::readonly(Pubkey::new([5u8; 32]));
        assert!(!meta.is_signer);
        assert!(!meta.is_writable);
    }
}
