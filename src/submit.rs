//! Submission Coordinator
//!
//! Signs a sealed draft and posts it to Horizon exactly once. A transaction
//! the network evaluates and declines is an ordinary [`SubmissionResult`],
//! not an error; only failures to get a verdict at all are errors.
//!
//! There is no retry here. The draft consumes one sequence number, so whether
//! to resubmit after an ambiguous failure is the caller's decision.

use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;

use crate::common::logging::log_submission_event;
use crate::horizon::{HorizonError, LedgerApi};
use crate::signer::{SignerError, TxSigner};
use crate::transaction::{EncodingError, SignedTransaction, TransactionDraft};

/// Horizon's verdict on a submitted transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionResult {
    /// Included in a ledger
    Accepted {
        hash: String,
        ledger: u32,
        result_xdr: String,
    },
    /// Evaluated and declined by the network
    Rejected {
        transaction_code: String,
        operation_codes: Vec<String>,
        result_xdr: String,
    },
}

impl SubmissionResult {
    pub fn is_accepted(&self) -> bool {
        matches!(self, SubmissionResult::Accepted { .. })
    }
}

/// Result of one submission, always carrying the envelope that was sent
#[derive(Debug, Clone)]
pub struct SubmissionOutcome {
    pub hash: String,
    /// Base64 envelope, kept for audit whatever the verdict
    pub envelope: String,
    pub result: SubmissionResult,
}

/// Submission errors
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("no signers supplied")]
    NoSigners,

    #[error("signing failed: {0}")]
    Signing(#[from] SignerError),

    #[error("envelope encoding failed: {0}")]
    Encoding(#[from] EncodingError),

    /// No verdict was obtained; the transaction may or may not have been applied
    #[error("submission failed: {source}")]
    Transport {
        envelope: String,
        #[source]
        source: HorizonError,
    },
}

impl SubmitError {
    /// Envelope that was (possibly) sent, when signing got that far
    pub fn envelope(&self) -> Option<&str> {
        match self {
            SubmitError::Transport { envelope, .. } => Some(envelope),
            _ => None,
        }
    }
}

/// Signs and submits sealed drafts
pub struct SubmissionCoordinator<L: ?Sized> {
    ledger: Arc<L>,
    network_passphrase: String,
}

impl<L: LedgerApi + ?Sized> SubmissionCoordinator<L> {
    pub fn new(ledger: Arc<L>, network_passphrase: impl Into<String>) -> Self {
        Self {
            ledger,
            network_passphrase: network_passphrase.into(),
        }
    }

    /// Sign `draft` with every signer, in order
    pub fn sign(
        &self,
        draft: TransactionDraft,
        signers: &[&dyn TxSigner],
    ) -> Result<SignedTransaction, SubmitError> {
        if signers.is_empty() {
            return Err(SubmitError::NoSigners);
        }

        let payload = draft.signature_payload(&self.network_passphrase);
        let signatures = signers
            .iter()
            .map(|signer| signer.sign_payload(&payload))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(SignedTransaction::new(
            draft,
            signatures,
            &self.network_passphrase,
        )?)
    }

    /// Sign and submit, once
    pub async fn submit(
        &self,
        draft: TransactionDraft,
        signers: &[&dyn TxSigner],
        correlation_id: &str,
    ) -> Result<SubmissionOutcome, SubmitError> {
        let signed = self.sign(draft, signers)?;
        self.submit_signed(&signed, correlation_id).await
    }

    /// Submit an already signed transaction, once
    pub async fn submit_signed(
        &self,
        signed: &SignedTransaction,
        correlation_id: &str,
    ) -> Result<SubmissionOutcome, SubmitError> {
        let envelope = signed.envelope_base64().to_string();
        let started = Instant::now();

        tracing::info!(
            target: "claimsweep::submission",
            hash = %signed.hash(),
            operations = signed.draft().operations().len(),
            "submitting transaction"
        );

        let result = match self.ledger.submit_transaction(&envelope).await {
            Ok(result) => result,
            Err(source) => {
                tracing::error!(
                    target: "claimsweep::submission",
                    hash = %signed.hash(),
                    error = %source,
                    "submission failed without a verdict"
                );
                return Err(SubmitError::Transport { envelope, source });
            }
        };

        let elapsed = started.elapsed().as_millis() as u64;
        match &result {
            SubmissionResult::Accepted { .. } => {
                log_submission_event(correlation_id, signed.hash(), true, None, elapsed)
            }
            SubmissionResult::Rejected {
                transaction_code,
                operation_codes,
                ..
            } => {
                let mut codes = vec![transaction_code.clone()];
                codes.extend(operation_codes.iter().cloned());
                log_submission_event(correlation_id, signed.hash(), false, Some(&codes), elapsed)
            }
        }

        Ok(SubmissionOutcome {
            hash: signed.hash().to_string(),
            envelope,
            result,
        })
    }
}
