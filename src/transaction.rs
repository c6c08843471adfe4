//! Transactions
//!
//! A [`TransactionDraft`] is sealed when the composer creates it: its
//! canonical encoding is fixed at that moment and every signature is computed
//! over it. A [`SignedTransaction`] pairs that encoding with its signatures and
//! renders the envelope text handed to Horizon.

use base64::{engine::general_purpose::STANDARD, Engine};
use rust_decimal::Decimal;
use serde::Serialize;
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::asset::{to_stroops, Asset};

/// Envelope type tag mixed into the signature payload
const ENVELOPE_TYPE_TX: [u8; 4] = [0, 0, 0, 2];

/// Operation in a transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// Claim a claimable balance for the source account
    ClaimClaimableBalance { balance_id: String },
    /// Pay `amount` of `asset` to `destination`
    Payment {
        destination: String,
        asset: Asset,
        amount: Decimal,
    },
}

impl Operation {
    /// Short name used in logs
    pub fn name(&self) -> &'static str {
        match self {
            Operation::ClaimClaimableBalance { .. } => "claim_claimable_balance",
            Operation::Payment { .. } => "payment",
        }
    }
}

/// Validity window; `max_time == 0` means no upper bound
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TimeBounds {
    pub min_time: u64,
    pub max_time: u64,
}

impl TimeBounds {
    pub fn infinite() -> Self {
        Self::default()
    }

    pub fn expires_at(max_time: u64) -> Self {
        Self { min_time: 0, max_time }
    }

    pub fn is_infinite(&self) -> bool {
        self.max_time == 0
    }
}

/// Encoding errors
#[derive(Debug, Error)]
pub enum EncodingError {
    #[error("amount {0} is not a whole number of stroops")]
    Amount(Decimal),

    #[error("serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Serialize)]
struct CanonicalTx<'a> {
    source_account: &'a str,
    fee: u32,
    seq_num: i64,
    time_bounds: TimeBounds,
    operations: Vec<CanonicalOp<'a>>,
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum CanonicalOp<'a> {
    ClaimClaimableBalance {
        balance_id: &'a str,
    },
    Payment {
        destination: &'a str,
        asset: String,
        amount: i64,
    },
}

/// Sealed, unsigned transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionDraft {
    source_account: String,
    sequence: i64,
    fee: u32,
    time_bounds: TimeBounds,
    operations: Vec<Operation>,
    canonical: Vec<u8>,
}

impl TransactionDraft {
    /// Seal a draft; the canonical encoding is computed once here
    pub(crate) fn seal(
        source_account: String,
        sequence: i64,
        fee: u32,
        time_bounds: TimeBounds,
        operations: Vec<Operation>,
    ) -> Result<Self, EncodingError> {
        let canonical_ops = operations
            .iter()
            .map(|op| match op {
                Operation::ClaimClaimableBalance { balance_id } => {
                    Ok(CanonicalOp::ClaimClaimableBalance {
                        balance_id: balance_id.as_str(),
                    })
                }
                Operation::Payment {
                    destination,
                    asset,
                    amount,
                } => Ok(CanonicalOp::Payment {
                    destination: destination.as_str(),
                    asset: asset.to_string(),
                    amount: to_stroops(*amount).ok_or(EncodingError::Amount(*amount))?,
                }),
            })
            .collect::<Result<Vec<_>, EncodingError>>()?;

        let canonical = serde_json::to_vec(&CanonicalTx {
            source_account: &source_account,
            fee,
            seq_num: sequence,
            time_bounds,
            operations: canonical_ops,
        })?;

        Ok(Self {
            source_account,
            sequence,
            fee,
            time_bounds,
            operations,
            canonical,
        })
    }

    pub fn source_account(&self) -> &str {
        &self.source_account
    }

    /// Sequence number this transaction consumes
    pub fn sequence(&self) -> i64 {
        self.sequence
    }

    /// Total fee in stroops
    pub fn fee(&self) -> u32 {
        self.fee
    }

    pub fn time_bounds(&self) -> TimeBounds {
        self.time_bounds
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    /// The payment operation closing the draft, if any
    pub fn payment(&self) -> Option<(&str, &Asset, Decimal)> {
        self.operations.iter().rev().find_map(|op| match op {
            Operation::Payment {
                destination,
                asset,
                amount,
            } => Some((destination.as_str(), asset, *amount)),
            _ => None,
        })
    }

    pub fn canonical_bytes(&self) -> &[u8] {
        &self.canonical
    }

    /// Bytes every signer signs: `sha256(network_id || ENVELOPE_TYPE_TX || canonical)`
    pub fn signature_payload(&self, network_passphrase: &str) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(network_id(network_passphrase));
        hasher.update(ENVELOPE_TYPE_TX);
        hasher.update(&self.canonical);
        hasher.finalize().into()
    }

    /// Hex hash over the canonical encoding (the signature payload), not Horizon's XDR hash
    pub fn hash_hex(&self, network_passphrase: &str) -> String {
        hex::encode(self.signature_payload(network_passphrase))
    }
}

/// Network id: sha256 of the network passphrase
pub fn network_id(network_passphrase: &str) -> [u8; 32] {
    Sha256::digest(network_passphrase.as_bytes()).into()
}

/// Signature plus the hint identifying which key produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecoratedSignature {
    /// Last four bytes of the signer's public key
    pub hint: [u8; 4],
    pub signature: [u8; 64],
}

#[derive(Serialize)]
struct EnvelopeSignature {
    hint: String,
    signature: String,
}

#[derive(Serialize)]
struct Envelope {
    tx: String,
    signatures: Vec<EnvelopeSignature>,
}

/// Signed, immutable transaction
#[derive(Debug, Clone)]
pub struct SignedTransaction {
    draft: TransactionDraft,
    signatures: Vec<DecoratedSignature>,
    hash: String,
    envelope: String,
}

impl SignedTransaction {
    pub(crate) fn new(
        draft: TransactionDraft,
        signatures: Vec<DecoratedSignature>,
        network_passphrase: &str,
    ) -> Result<Self, EncodingError> {
        let envelope = Envelope {
            tx: STANDARD.encode(draft.canonical_bytes()),
            signatures: signatures
                .iter()
                .map(|sig| EnvelopeSignature {
                    hint: hex::encode(sig.hint),
                    signature: STANDARD.encode(sig.signature),
                })
                .collect(),
        };
        let envelope = STANDARD.encode(serde_json::to_vec(&envelope)?);
        let hash = draft.hash_hex(network_passphrase);

        Ok(Self {
            draft,
            signatures,
            hash,
            envelope,
        })
    }

    pub fn draft(&self) -> &TransactionDraft {
        &self.draft
    }

    pub fn signatures(&self) -> &[DecoratedSignature] {
        &self.signatures
    }

    pub fn hash(&self) -> &str {
        &self.hash
    }

    /// Base64 envelope text submitted to Horizon
    pub fn envelope_base64(&self) -> &str {
        &self.envelope
    }
}
