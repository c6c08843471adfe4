//! Transaction Composer
//!
//! Turns an account snapshot and its discovered claimable balances into one
//! sealed draft: a claim for every balance of the target asset, in discovery
//! order, followed by a single payment forwarding `base_amount` plus everything
//! claimed.
//!
//! Amounts are summed as exact decimals. The payment is rounded to whole units
//! by a [`RoundingPolicy`]; the default floors, so no more than was claimed is
//! ever sent.

use chrono::Utc;
use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::account::AccountSnapshot;
use crate::asset::Asset;
use crate::common::logging::log_compose_event;
use crate::discover::ClaimableBalance;
use crate::keys::{self, KeyError};
use crate::transaction::{EncodingError, Operation, TimeBounds, TransactionDraft};

/// Network limit on operations per transaction
pub const MAX_OPERATIONS: usize = 100;

/// How the payment amount is reduced to whole units
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RoundingPolicy {
    /// Round toward negative infinity (never pays out more than was collected)
    #[default]
    Floor,
    /// Round to nearest, halves away from zero
    Nearest,
}

impl RoundingPolicy {
    pub fn apply(&self, amount: Decimal) -> Decimal {
        match self {
            RoundingPolicy::Floor => amount.floor(),
            RoundingPolicy::Nearest => {
                amount.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            }
        }
    }
}

impl FromStr for RoundingPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "floor" => Ok(RoundingPolicy::Floor),
            "nearest" | "round" => Ok(RoundingPolicy::Nearest),
            _ => Err(format!("unknown rounding policy: {} (use 'floor' or 'nearest')", s)),
        }
    }
}

/// Transaction validity window
///
/// There is deliberately no default: `Infinite` leaves a signed transaction
/// valid until its sequence number is consumed, so callers must ask for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeoutPolicy {
    /// Valid until this unix timestamp
    ExpiresAt(u64),
    /// Valid for this long after composition
    After(Duration),
    /// No upper bound
    Infinite,
}

impl TimeoutPolicy {
    /// Resolve against `now`; only `Infinite` may yield an unbounded window
    fn resolve(&self, now: i64) -> Result<TimeBounds, ComposeError> {
        let bounds = match self {
            TimeoutPolicy::ExpiresAt(at) => TimeBounds::expires_at(*at),
            TimeoutPolicy::After(duration) => {
                let now = u64::try_from(now).unwrap_or(0);
                TimeBounds::expires_at(now.saturating_add(duration.as_secs()))
            }
            TimeoutPolicy::Infinite => return Ok(TimeBounds::infinite()),
        };

        // max_time 0 is the unbounded sentinel
        if bounds.max_time == 0 {
            return Err(ComposeError::InvalidTimeout(
                "expiry 0 would leave the transaction valid forever".to_string(),
            ));
        }
        if i64::try_from(bounds.max_time).map_or(false, |max| max <= now) {
            return Err(ComposeError::InvalidTimeout(format!(
                "expiry {} is not after the current time {}",
                bounds.max_time, now
            )));
        }
        Ok(bounds)
    }
}

/// Parameters of one composition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposePolicy {
    /// Only balances of this asset are claimed and forwarded
    pub asset: Asset,
    /// Paid on top of the claimed total
    pub base_amount: Decimal,
    /// Fee per operation, in stroops
    pub base_fee: u32,
    pub timeout: TimeoutPolicy,
    pub rounding: RoundingPolicy,
}

impl ComposePolicy {
    /// Policy forwarding the native asset with floor rounding
    pub fn native(base_amount: Decimal, base_fee: u32, timeout: TimeoutPolicy) -> Self {
        Self {
            asset: Asset::Native,
            base_amount,
            base_fee,
            timeout,
            rounding: RoundingPolicy::Floor,
        }
    }

    pub fn with_rounding(mut self, rounding: RoundingPolicy) -> Self {
        self.rounding = rounding;
        self
    }
}

/// Composer errors
#[derive(Debug, Error)]
pub enum ComposeError {
    #[error("stale account snapshot: {0}")]
    StaleSnapshot(String),

    #[error("invalid destination: {0}")]
    InvalidDestination(#[from] KeyError),

    #[error("{count} operations exceed the limit of {max}")]
    TooManyOperations { count: usize, max: usize },

    #[error("amount overflow while adding {0}")]
    AmountOverflow(String),

    #[error("fee overflow: {base_fee} stroops x {operations} operations")]
    FeeOverflow { base_fee: u32, operations: usize },

    #[error("invalid timeout: {0}")]
    InvalidTimeout(String),

    #[error("payment amount {0} is not positive")]
    NonPositivePayment(Decimal),

    #[error("encoding failed: {0}")]
    Encoding(#[from] EncodingError),
}

/// Builds sealed claim-and-forward drafts
#[derive(Debug, Clone, Default)]
pub struct Composer;

impl Composer {
    pub fn new() -> Self {
        Self
    }

    /// Compose against the current clock
    pub fn compose(
        &self,
        snapshot: &AccountSnapshot,
        balances: &[ClaimableBalance],
        destination: &str,
        policy: &ComposePolicy,
    ) -> Result<TransactionDraft, ComposeError> {
        self.compose_at(snapshot, balances, destination, policy, Utc::now().timestamp())
    }

    /// Compose with an explicit "now" (unix seconds) for relative timeouts
    pub fn compose_at(
        &self,
        snapshot: &AccountSnapshot,
        balances: &[ClaimableBalance],
        destination: &str,
        policy: &ComposePolicy,
        now: i64,
    ) -> Result<TransactionDraft, ComposeError> {
        let destination = keys::parse_account_id(destination)?;

        // Best effort only; Horizon has the final word on sequence numbers
        if snapshot.sequence() < 0 {
            return Err(ComposeError::StaleSnapshot(format!(
                "negative sequence {}",
                snapshot.sequence()
            )));
        }
        let sequence = snapshot.sequence().checked_add(1).ok_or_else(|| {
            ComposeError::StaleSnapshot("sequence number exhausted".to_string())
        })?;

        let time_bounds = policy.timeout.resolve(now)?;

        let mut operations = Vec::new();
        let mut claimed = Decimal::ZERO;

        for balance in balances.iter().filter(|b| b.asset == policy.asset) {
            if balance.id.is_empty() {
                return Err(ComposeError::StaleSnapshot(
                    "claimable balance without id".to_string(),
                ));
            }
            claimed = claimed
                .checked_add(balance.amount)
                .ok_or_else(|| ComposeError::AmountOverflow(balance.id.clone()))?;
            operations.push(Operation::ClaimClaimableBalance {
                balance_id: balance.id.clone(),
            });
        }

        let claims = operations.len();
        if claims + 1 > MAX_OPERATIONS {
            return Err(ComposeError::TooManyOperations {
                count: claims + 1,
                max: MAX_OPERATIONS,
            });
        }

        let total = policy
            .base_amount
            .checked_add(claimed)
            .ok_or_else(|| ComposeError::AmountOverflow("base amount".to_string()))?;
        let amount = policy.rounding.apply(total);
        if amount <= Decimal::ZERO {
            return Err(ComposeError::NonPositivePayment(amount));
        }

        operations.push(Operation::Payment {
            destination,
            asset: policy.asset.clone(),
            amount,
        });

        let fee = u32::try_from(operations.len())
            .ok()
            .and_then(|ops| policy.base_fee.checked_mul(ops))
            .ok_or(ComposeError::FeeOverflow {
                base_fee: policy.base_fee,
                operations: operations.len(),
            })?;

        if time_bounds.is_infinite() {
            tracing::warn!(
                target: "claimsweep::compose",
                account = %snapshot.account_id(),
                "transaction has no expiry; it stays valid until sequence {} is consumed",
                sequence
            );
        }

        tracing::debug!(target: "claimsweep::compose", claimed = %claimed, "claimed total");
        log_compose_event(snapshot.account_id(), sequence, claims, &amount.to_string(), fee);

        Ok(TransactionDraft::seal(
            snapshot.account_id().to_string(),
            sequence,
            fee,
            time_bounds,
            operations,
        )?)
    }
}
