//! Action attestation.
//!
//! Stamps a transaction template with a verifiable action identity: a memo
//! carrying {protocol, identity, reference, signature}, plus read-only
//! account tags on the first business instruction that let a verifier tie
//! that instruction to the attested reference.

use ed25519_dalek::SigningKey;
use rand_core::OsRng;

use amora_crypto::pubkey::Pubkey;

use crate::error::ChainError;
use crate::identity::{verify_signature, ActionIdentity};
use crate::transaction::{AccountMeta, Instruction, Transaction};

/// Protocol tag, first field of every memo.
pub const ACTION_PROTOCOL: &str = "solana-action";

/// Memo field separator.
pub const MEMO_SEPARATOR: char = ':';

/// Base58 form of the well-known memo program identifier.
pub const MEMO_PROGRAM_ID: &str = "MemoSq4gqABAXKb96qnH8TysNcWxMyWCqXgDLGmfcHr";

/// The well-known memo program identifier.
pub fn memo_program_id() -> Pubkey {
    MEMO_PROGRAM_ID
        .parse()
        .expect("well-known program id is valid base58")
}

/// Build the identifier memo for a given identity and reference.
///
/// The field order {protocol, identity, reference, signature} and the
/// separator are part of the wire contract; the output is deterministic for
/// a given (identity, reference) pair.
pub fn identifier_memo(identity: &ActionIdentity, reference: &Pubkey) -> String {
    let signature = identity.sign(reference.as_bytes());
    [
        ACTION_PROTOCOL.to_string(),
        identity.public().to_string(),
        reference.to_string(),
        bs58::encode(&signature).into_string(),
    ]
    .join(MEMO_SEPARATOR.to_string().as_str())
}

/// One attestation: a single-use reference signed by the action identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attestation {
    identity: Pubkey,
    reference: Pubkey,
    memo: String,
}

impl Attestation {
    /// Sign a fresh single-use reference with `identity`.
    ///
    /// The reference keypair is generated here and discarded; only its
    /// public key survives, as a nonce-carrying value with no authority.
    pub fn create(identity: &ActionIdentity) -> Self {
        let reference_key = SigningKey::generate(&mut OsRng);
        let reference = Pubkey::new(reference_key.verifying_key().to_bytes());

        let memo = identifier_memo(identity, &reference);

        Self {
            identity: identity.public(),
            reference,
            memo,
        }
    }

    pub fn identity(&self) -> Pubkey {
        self.identity
    }

    pub fn reference(&self) -> Pubkey {
        self.reference
    }

    pub fn memo(&self) -> &str {
        &self.memo
    }

    /// Attach this attestation to a transaction.
    ///
    /// Appends the memo as a zero-account instruction, then tags the first
    /// non-memo instruction with two read-only account references: identity,
    /// then reference. A transaction with only memo instructions gets no
    /// tags and stays verifiable by memo alone.
    pub fn attach(&self, tx: &mut Transaction) {
        let memo_program = memo_program_id();

        tx.add(Instruction {
            program_id: memo_program,
            accounts: Vec::new(),
            data: self.memo.as_bytes().to_vec(),
        });

        if let Some(instruction) = tx
            .instructions
            .iter_mut()
            .find(|ix| ix.program_id != memo_program)
        {
            instruction
                .accounts
                .push(AccountMeta::readonly(self.identity));
            instruction
                .accounts
                .push(AccountMeta::readonly(self.reference));
        }
    }
}

/// A memo that parsed and whose signature verified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerifiedAttestation {
    pub identity: Pubkey,
    pub reference: Pubkey,
}

/// Parse and verify an attestation memo.
///
/// Checks the fixed four-field order and the detached signature over the
/// reference public-key bytes.
pub fn verify_memo(memo: &str) -> Result<VerifiedAttestation, ChainError> {
    let fields: Vec<&str> = memo.split(MEMO_SEPARATOR).collect();
    if fields.len() != 4 || fields[0] != ACTION_PROTOCOL {
        return Err(ChainError::MalformedMemo);
    }

    let identity: Pubkey = fields[1].parse().map_err(|_| ChainError::MalformedMemo)?;
    let reference: Pubkey = fields[2].parse().map_err(|_| ChainError::MalformedMemo)?;
    let signature: [u8; 64] = bs58::decode(fields[3])
        .into_vec()
        .map_err(|_| ChainError::MalformedMemo)?
        .as_slice()
        .try_into()
        .map_err(|_| ChainError::MalformedMemo)?;

    verify_signature(&identity, reference.as_bytes(), &signature)?;

    Ok(VerifiedAttestation {
        identity,
        reference,
    })
}
