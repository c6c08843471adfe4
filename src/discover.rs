//! Claimable Balance Discovery
//!
//! Finds every claimable balance an account can claim by walking Horizon's
//! `claimable_balances?claimant=` collection to its end.

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::account::AccountSnapshot;
use crate::asset::Asset;
use crate::common::logging::log_collection_event;
use crate::horizon::{HorizonError, LedgerApi};
use crate::page::{cancellable, collect_all, Page, PageFetcher, PageLink};

/// A balance held by the ledger for one or more claimants
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimableBalance {
    /// Balance id (hex encoded)
    pub id: String,
    pub asset: Asset,
    pub amount: Decimal,
    /// Account sponsoring the balance's reserve
    pub sponsor: Option<String>,
    /// Accounts allowed to claim it
    pub claimants: Vec<String>,
}

impl ClaimableBalance {
    /// `--> id: amount asset` / `----> From sponsor` display lines
    pub fn display_lines(&self) -> [String; 2] {
        [
            format!("--> {}: {} {}", self.id, self.amount, self.asset),
            format!("----> From {}", self.sponsor.as_deref().unwrap_or("n/a")),
        ]
    }
}

/// Adapts a [`LedgerApi`] to the claimable balance collection
struct BalancePages<'a, L: ?Sized>(&'a L);

#[async_trait]
impl<L: LedgerApi + ?Sized> PageFetcher<ClaimableBalance> for BalancePages<'_, L> {
    async fn fetch_page(&self, link: &PageLink) -> Result<Page<ClaimableBalance>, HorizonError> {
        self.0.claimable_balances_page(link).await
    }
}

/// Discovers claimable balances for an account
pub struct BalanceDiscoverer<L: ?Sized> {
    ledger: Arc<L>,
}

impl<L: LedgerApi + ?Sized> BalanceDiscoverer<L> {
    pub fn new(ledger: Arc<L>) -> Self {
        Self { ledger }
    }

    /// All balances claimable by `account_id`, in Horizon's cursor order
    ///
    /// Fails with `NotFound` when the account does not exist; an existing
    /// account with nothing to claim yields an empty list.
    pub async fn discover(
        &self,
        account_id: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<ClaimableBalance>, HorizonError> {
        // Horizon answers an unknown claimant with an empty collection, so probe first
        let account = cancellable(cancel, self.ledger.account(account_id)).await?;
        self.discover_for(&account, cancel).await
    }

    /// Like [`discover`](Self::discover) for an account already known to exist
    pub async fn discover_for(
        &self,
        account: &AccountSnapshot,
        cancel: &CancellationToken,
    ) -> Result<Vec<ClaimableBalance>, HorizonError> {
        let account_id = account.account_id();
        let started = Instant::now();
        let first = cancellable(cancel, self.ledger.claimable_balances(account_id)).await?;
        let balances = collect_all(first, &BalancePages(self.ledger.as_ref()), cancel).await?;

        log_collection_event(
            "claimable_balances",
            account_id,
            balances.len(),
            started.elapsed().as_millis() as u64,
        );

        Ok(balances)
    }
}
