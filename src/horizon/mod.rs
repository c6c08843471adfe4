//! Horizon Infrastructure Module
//!
//! Access to a Stellar Horizon server:
//! - `LedgerApi`, the seam every component talks through
//! - `HorizonClient`, the reqwest implementation
//! - Wire types mirroring Horizon's JSON and their conversion to domain types

pub mod client;
pub mod types;

use async_trait::async_trait;
use thiserror::Error;

use crate::account::AccountSnapshot;
use crate::discover::ClaimableBalance;
use crate::page::{Page, PageLink};
use crate::submit::SubmissionResult;

pub use client::{HorizonClient, PUBLIC_URL, TESTNET_URL};

/// Horizon error types
#[derive(Debug, Error)]
pub enum HorizonError {
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("malformed page: {0}")]
    MalformedPage(String),

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("request cancelled")]
    Cancelled,
}

impl HorizonError {
    /// Transport failures and server-side errors may succeed on a later attempt
    pub fn is_retryable(&self) -> bool {
        match self {
            HorizonError::Transport(_) => true,
            HorizonError::Status { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}

/// Ledger queries and submission used by the claim flow
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LedgerApi: Send + Sync {
    /// Fetch an account; `NotFound` if it does not exist
    async fn account(&self, account_id: &str) -> Result<AccountSnapshot, HorizonError>;

    /// First page of balances claimable by `claimant`
    async fn claimable_balances(
        &self,
        claimant: &str,
    ) -> Result<Page<ClaimableBalance>, HorizonError>;

    /// Page of claimable balances behind `link`
    async fn claimable_balances_page(
        &self,
        link: &PageLink,
    ) -> Result<Page<ClaimableBalance>, HorizonError>;

    /// Post a transaction envelope; a rejection is a successful response
    async fn submit_transaction(&self, envelope: &str) -> Result<SubmissionResult, HorizonError>;
}
