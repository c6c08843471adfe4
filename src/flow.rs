//! Claim Flow
//!
//! One account, one transaction: fetch the account snapshot, discover its
//! claimable balances, compose the claim-and-forward draft, then sign and
//! submit it. Each step awaits the previous one; nothing runs concurrently.

use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::account::AccountSnapshot;
use crate::common::logging::{generate_correlation_id, log_error_event, log_security_event};
use crate::compose::{ComposeError, ComposePolicy, Composer};
use crate::discover::{BalanceDiscoverer, ClaimableBalance};
use crate::horizon::{HorizonError, LedgerApi};
use crate::page::cancellable;
use crate::signer::TxSigner;
use crate::submit::{SubmissionCoordinator, SubmissionOutcome, SubmitError};
use crate::transaction::{SignedTransaction, TransactionDraft};

/// Claim flow errors
#[derive(Debug, Error)]
pub enum FlowError {
    #[error("no source key supplied")]
    NoSourceKey,

    #[error("horizon error: {0}")]
    Horizon(#[from] HorizonError),

    #[error("compose error: {0}")]
    Compose(#[from] ComposeError),

    #[error("submit error: {0}")]
    Submit(#[from] SubmitError),

    #[error("claim flow cancelled")]
    Cancelled,
}

impl FlowError {
    /// Whether a transaction may have reached the network
    pub fn may_have_submitted(&self) -> bool {
        matches!(self, FlowError::Submit(SubmitError::Transport { .. }))
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            FlowError::NoSourceKey => "NO_SOURCE_KEY",
            FlowError::Horizon(HorizonError::NotFound(_)) => "NOT_FOUND",
            FlowError::Horizon(HorizonError::Cancelled) | FlowError::Cancelled => "CANCELLED",
            FlowError::Horizon(_) => "HORIZON_ERROR",
            FlowError::Compose(_) => "COMPOSE_ERROR",
            FlowError::Submit(_) => "SUBMIT_ERROR",
        }
    }
}

/// Everything gathered before submission
#[derive(Debug, Clone)]
pub struct PreparedClaim {
    pub snapshot: AccountSnapshot,
    pub balances: Vec<ClaimableBalance>,
    pub draft: TransactionDraft,
}

/// What a completed flow did
#[derive(Debug, Clone)]
pub struct ClaimReport {
    pub correlation_id: String,
    pub account_id: String,
    /// Every balance discovered, including ones of other assets
    pub balances: Vec<ClaimableBalance>,
    /// Claim operations in the submitted transaction
    pub claimed: usize,
    pub outcome: SubmissionOutcome,
    pub duration_ms: u64,
}

/// Runs the discover, compose and submit steps for one account
pub struct ClaimFlow<L: ?Sized> {
    ledger: Arc<L>,
    discoverer: BalanceDiscoverer<L>,
    composer: Composer,
    coordinator: SubmissionCoordinator<L>,
}

impl<L: LedgerApi + ?Sized> ClaimFlow<L> {
    pub fn new(ledger: Arc<L>, network_passphrase: impl Into<String>) -> Self {
        Self {
            discoverer: BalanceDiscoverer::new(ledger.clone()),
            composer: Composer::new(),
            coordinator: SubmissionCoordinator::new(ledger.clone(), network_passphrase),
            ledger,
        }
    }

    /// Snapshot, discover and compose, without signing
    ///
    /// The source account is the account of `source_keys[0]`.
    pub async fn prepare(
        &self,
        source_keys: &[&dyn TxSigner],
        destination: &str,
        policy: &ComposePolicy,
        cancel: &CancellationToken,
    ) -> Result<PreparedClaim, FlowError> {
        let source = source_keys.first().ok_or(FlowError::NoSourceKey)?;
        let account_id = source.account_id();
        if cancel.is_cancelled() {
            return Err(FlowError::Cancelled);
        }

        let snapshot = cancellable(cancel, self.ledger.account(&account_id))
            .await
            .map_err(cancelled)?;
        let balances = self
            .discoverer
            .discover_for(&snapshot, cancel)
            .await
            .map_err(cancelled)?;
        let draft = self
            .composer
            .compose(&snapshot, &balances, destination, policy)?;

        Ok(PreparedClaim {
            snapshot,
            balances,
            draft,
        })
    }

    /// Prepare and sign, without submitting
    pub async fn dry_run(
        &self,
        source_keys: &[&dyn TxSigner],
        destination: &str,
        policy: &ComposePolicy,
        cancel: &CancellationToken,
    ) -> Result<(PreparedClaim, SignedTransaction), FlowError> {
        let prepared = self.prepare(source_keys, destination, policy, cancel).await?;
        let signed = self.coordinator.sign(prepared.draft.clone(), source_keys)?;
        Ok((prepared, signed))
    }

    /// Run the whole flow, submitting exactly once
    ///
    /// Cancellation is honoured up to the moment of submission. Once the
    /// envelope is posted the request runs to completion so its verdict is
    /// never lost.
    pub async fn run(
        &self,
        source_keys: &[&dyn TxSigner],
        destination: &str,
        policy: &ComposePolicy,
        cancel: &CancellationToken,
    ) -> Result<ClaimReport, FlowError> {
        let correlation_id = generate_correlation_id();
        let started = Instant::now();

        tracing::info!(
            target: "claimsweep::flow",
            correlation_id = %correlation_id,
            destination = %destination,
            asset = %policy.asset,
            "claim flow started"
        );

        let prepared = match self.prepare(source_keys, destination, policy, cancel).await {
            Ok(prepared) => prepared,
            Err(e) => {
                log_error_event(e.error_code(), &e.to_string(), Some(&correlation_id));
                return Err(e);
            }
        };

        if cancel.is_cancelled() {
            tracing::warn!(
                target: "claimsweep::flow",
                correlation_id = %correlation_id,
                "claim flow cancelled before submission"
            );
            return Err(FlowError::Cancelled);
        }

        let claimed = prepared.draft.operations().len() - 1;
        let signers: Vec<String> = source_keys.iter().map(|s| s.account_id()).collect();
        log_security_event(
            "transaction_signing",
            true,
            serde_json::json!({
                "account": prepared.snapshot.account_id(),
                "signers": signers,
                "sequence": prepared.draft.sequence(),
            }),
            Some(&correlation_id),
        );

        let outcome = self
            .coordinator
            .submit(prepared.draft, source_keys, &correlation_id)
            .await?;

        let duration_ms = started.elapsed().as_millis() as u64;
        tracing::info!(
            target: "claimsweep::flow",
            correlation_id = %correlation_id,
            hash = %outcome.hash,
            accepted = outcome.result.is_accepted(),
            claimed,
            duration_ms,
            "claim flow finished"
        );

        Ok(ClaimReport {
            correlation_id,
            account_id: prepared.snapshot.account_id().to_string(),
            balances: prepared.balances,
            claimed,
            outcome,
            duration_ms,
        })
    }
}

fn cancelled(e: HorizonError) -> FlowError {
    match e {
        HorizonError::Cancelled => FlowError::Cancelled,
        other => FlowError::Horizon(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::Asset;
    use crate::compose::TimeoutPolicy;
    use crate::discover::tests::balance;
    use crate::horizon::MockLedgerApi;
    use crate::keys::tests::test_account;
    use crate::page::{Page, PageLink};
    use crate::signer::Ed25519Signer;
    use crate::submit::SubmissionResult;
    use rust_decimal::Decimal;

    const PASSPHRASE: &str = "Test SDF Network ; September 2015";

    fn policy() -> ComposePolicy {
        ComposePolicy::native(Decimal::from(20), 100, TimeoutPolicy::Infinite)
    }

    fn ledger_with_balances(submissions: usize) -> MockLedgerApi {
        let mut ledger = MockLedgerApi::new();
        ledger
            .expect_account()
            .times(1)
            .returning(|id| Ok(AccountSnapshot::new(id, 41)));
        ledger.expect_claimable_balances().times(1).returning(|_| {
            Ok(Page::new(
                vec![
                    balance("a", Asset::Native, "5.0000001"),
                    balance("usdc", Asset::credit("USDC", "GISSUER"), "3"),
                ],
                Some(PageLink::new("https://horizon/cb?cursor=1")),
            ))
        });
        ledger
            .expect_claimable_balances_page()
            .times(2)
            .returning(|next| match next.href() {
                "https://horizon/cb?cursor=1" => Ok(Page::new(
                    vec![balance("b", Asset::Native, "14.9999999")],
                    Some(PageLink::new("https://horizon/cb?cursor=2")),
                )),
                // Terminal page; its link must not be followed
                "https://horizon/cb?cursor=2" => {
                    Ok(Page::new(vec![], Some(PageLink::new("https://horizon/cb?cursor=3"))))
                }
                other => panic!("followed unexpected link {}", other),
            });
        ledger
            .expect_submit_transaction()
            .times(submissions)
            .returning(|_| {
                Ok(SubmissionResult::Accepted {
                    hash: "abcd".to_string(),
                    ledger: 9,
                    result_xdr: String::new(),
                })
            });
        ledger
    }

    #[tokio::test]
    async fn test_run_claims_and_forwards() {
        let signer = Ed25519Signer::from_seed(&[3u8; 32]);
        let flow = ClaimFlow::new(Arc::new(ledger_with_balances(1)), PASSPHRASE);

        let report = flow
            .run(&[&signer], &test_account(9), &policy(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.account_id, signer.account_id());
        assert_eq!(report.balances.len(), 3);
        assert_eq!(report.claimed, 2);
        assert!(report.outcome.result.is_accepted());
        assert!(!report.correlation_id.is_empty());
    }

    #[tokio::test]
    async fn test_prepare_composes_against_snapshot() {
        let signer = Ed25519Signer::from_seed(&[3u8; 32]);
        let flow = ClaimFlow::new(Arc::new(ledger_with_balances(0)), PASSPHRASE);

        let prepared = flow
            .prepare(&[&signer], &test_account(9), &policy(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(prepared.draft.sequence(), 42);
        assert_eq!(prepared.draft.operations().len(), 3);
        assert_eq!(prepared.draft.payment().unwrap().2, Decimal::from(40));
        assert_eq!(prepared.draft.fee(), 300);
    }

    #[tokio::test]
    async fn test_dry_run_signs_without_submitting() {
        let signer = Ed25519Signer::from_seed(&[3u8; 32]);
        let flow = ClaimFlow::new(Arc::new(ledger_with_balances(0)), PASSPHRASE);

        let (prepared, signed) = flow
            .dry_run(&[&signer], &test_account(9), &policy(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(signed.signatures().len(), 1);
        assert_eq!(signed.hash(), prepared.draft.hash_hex(PASSPHRASE));
    }

    #[tokio::test]
    async fn test_missing_account_aborts_before_compose() {
        let mut ledger = MockLedgerApi::new();
        ledger
            .expect_account()
            .returning(|id| Err(HorizonError::NotFound(format!("account {}", id))));
        ledger.expect_claimable_balances().never();
        ledger.expect_submit_transaction().never();

        let signer = Ed25519Signer::from_seed(&[3u8; 32]);
        let flow = ClaimFlow::new(Arc::new(ledger), PASSPHRASE);
        let result = flow
            .run(&[&signer], &test_account(9), &policy(), &CancellationToken::new())
            .await;

        assert!(matches!(result, Err(FlowError::Horizon(HorizonError::NotFound(_)))));
    }

    #[tokio::test]
    async fn test_discovery_failure_never_submits() {
        let mut ledger = MockLedgerApi::new();
        ledger
            .expect_account()
            .returning(|id| Ok(AccountSnapshot::new(id, 1)));
        ledger.expect_claimable_balances().returning(|_| {
            Ok(Page::new(
                vec![balance("a", Asset::Native, "1")],
                Some(PageLink::new("https://horizon/cb?cursor=1")),
            ))
        });
        ledger
            .expect_claimable_balances_page()
            .returning(|_| Err(HorizonError::Status { status: 503, body: String::new() }));
        ledger.expect_submit_transaction().never();

        let signer = Ed25519Signer::from_seed(&[3u8; 32]);
        let flow = ClaimFlow::new(Arc::new(ledger), PASSPHRASE);
        let result = flow
            .run(&[&signer], &test_account(9), &policy(), &CancellationToken::new())
            .await;

        assert!(matches!(result, Err(FlowError::Horizon(HorizonError::Status { status: 503, .. }))));
    }

    #[tokio::test]
    async fn test_cancelled_flow_never_submits() {
        let mut ledger = MockLedgerApi::new();
        ledger.expect_account().never();
        ledger.expect_submit_transaction().never();

        let cancel = CancellationToken::new();
        cancel.cancel();

        let signer = Ed25519Signer::from_seed(&[3u8; 32]);
        let flow = ClaimFlow::new(Arc::new(ledger), PASSPHRASE);
        let result = flow.run(&[&signer], &test_account(9), &policy(), &cancel).await;

        assert!(matches!(result, Err(FlowError::Cancelled)));
    }

    #[tokio::test]
    async fn test_transport_failure_may_have_submitted() {
        let mut ledger = MockLedgerApi::new();
        ledger
            .expect_account()
            .returning(|id| Ok(AccountSnapshot::new(id, 1)));
        ledger
            .expect_claimable_balances()
            .returning(|_| Ok(Page::new(vec![], None)));
        ledger
            .expect_submit_transaction()
            .times(1)
            .returning(|_| Err(HorizonError::Status { status: 504, body: String::new() }));

        let signer = Ed25519Signer::from_seed(&[3u8; 32]);
        let flow = ClaimFlow::new(Arc::new(ledger), PASSPHRASE);
        let err = flow
            .run(&[&signer], &test_account(9), &policy(), &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(err.may_have_submitted());
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(FlowError::Cancelled.error_code(), "CANCELLED");
        assert_eq!(FlowError::Horizon(HorizonError::Cancelled).error_code(), "CANCELLED");
        assert_eq!(
            FlowError::Horizon(HorizonError::NotFound("account".to_string())).error_code(),
            "NOT_FOUND"
        );
        assert_eq!(FlowError::NoSourceKey.error_code(), "NO_SOURCE_KEY");
    }

    #[tokio::test]
    async fn test_requires_source_key() {
        let ledger = MockLedgerApi::new();
        let flow = ClaimFlow::new(Arc::new(ledger), PASSPHRASE);
        let result = flow
            .run(&[], &test_account(9), &policy(), &CancellationToken::new())
            .await;

        assert!(matches!(result, Err(FlowError::NoSourceKey)));
    }
}
