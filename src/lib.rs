//! claimsweep
//!
//! Claims every pending claimable balance of a Stellar account and forwards
//! the proceeds in one signed transaction.
//!
//! ## Pipeline
//!
//! 1. **Discover** - walk Horizon's claimable balance collection to its end
//! 2. **Compose** - claims in discovery order, then one payment, sealed into a draft
//! 3. **Submit** - sign the draft and post it once; a rejection is a result, not an error
//!
//! [`flow::ClaimFlow`] runs the three steps in sequence for one account.

pub mod account;
pub mod asset;
pub mod common;
pub mod compose;
pub mod discover;
pub mod flow;
pub mod horizon;
pub mod keys;
pub mod page;
pub mod signer;
pub mod submit;
pub mod transaction;

// Re-exports: ledger access
pub use horizon::{HorizonClient, HorizonError, LedgerApi};
pub use page::{collect_all, Page, PageFetcher, PageLink};

// Re-exports: domain types
pub use account::{AccountSnapshot, AccountSummary};
pub use asset::Asset;
pub use discover::{BalanceDiscoverer, ClaimableBalance};
pub use keys::{classify_key, KeyError, KeyKind};
pub use transaction::{Operation, SignedTransaction, TimeBounds, TransactionDraft};

// Re-exports: pipeline
pub use compose::{ComposeError, ComposePolicy, Composer, RoundingPolicy, TimeoutPolicy};
pub use flow::{ClaimFlow, ClaimReport, FlowError, PreparedClaim};
pub use signer::{Ed25519Signer, SignerError, TxSigner};
pub use submit::{SubmissionCoordinator, SubmissionOutcome, SubmissionResult, SubmitError};

pub use common::{ClaimsweepConfig, ClaimsweepError, Network};
