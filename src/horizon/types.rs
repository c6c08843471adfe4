//! Horizon wire types
//!
//! Mirrors of Horizon's JSON resources, converted into domain types at the
//! client boundary.

use serde::Deserialize;
use std::collections::BTreeMap;

use super::HorizonError;
use crate::account::{AccountBalance, AccountSigner, AccountSnapshot, Thresholds};
use crate::asset::{parse_amount, Asset};
use crate::discover::ClaimableBalance;
use crate::page::{Page, PageLink};

#[derive(Debug, Deserialize)]
pub struct Href {
    pub href: String,
}

#[derive(Debug, Deserialize)]
pub struct PageLinks {
    pub next: Option<Href>,
}

#[derive(Debug, Deserialize)]
pub struct Embedded<R> {
    pub records: Vec<R>,
}

/// Collection page as served by Horizon
#[derive(Debug, Deserialize)]
pub struct HorizonPage<R> {
    #[serde(rename = "_links")]
    pub links: PageLinks,
    #[serde(rename = "_embedded")]
    pub embedded: Embedded<R>,
}

impl<R> HorizonPage<R> {
    /// Convert every record, failing the whole page on the first bad one
    pub fn into_page<T, F>(self, convert: F) -> Result<Page<T>, HorizonError>
    where
        F: Fn(R) -> Result<T, HorizonError>,
    {
        let records = self
            .embedded
            .records
            .into_iter()
            .map(convert)
            .collect::<Result<Vec<_>, _>>()?;
        let next = self.links.next.map(|link| PageLink::new(link.href));
        Ok(Page::new(records, next))
    }
}

#[derive(Debug, Deserialize)]
pub struct HorizonClaimant {
    pub destination: String,
}

#[derive(Debug, Deserialize)]
pub struct HorizonClaimableBalance {
    pub id: String,
    pub asset: String,
    pub amount: String,
    pub sponsor: Option<String>,
    #[serde(default)]
    pub claimants: Vec<HorizonClaimant>,
}

impl TryFrom<HorizonClaimableBalance> for ClaimableBalance {
    type Error = HorizonError;

    fn try_from(record: HorizonClaimableBalance) -> Result<Self, Self::Error> {
        if record.id.is_empty() {
            return Err(HorizonError::MalformedPage(
                "claimable balance without id".to_string(),
            ));
        }

        let asset: Asset = record
            .asset
            .parse()
            .map_err(|e| HorizonError::MalformedPage(format!("balance {}: {}", record.id, e)))?;
        let amount = parse_amount(&record.amount)
            .map_err(|e| HorizonError::MalformedPage(format!("balance {}: {}", record.id, e)))?;

        Ok(ClaimableBalance {
            id: record.id,
            asset,
            amount,
            sponsor: record.sponsor,
            claimants: record.claimants.into_iter().map(|c| c.destination).collect(),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct HorizonBalance {
    pub balance: String,
    pub asset_type: String,
    pub asset_code: Option<String>,
    pub asset_issuer: Option<String>,
    pub liquidity_pool_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct HorizonSigner {
    pub key: String,
    pub weight: u32,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct HorizonThresholds {
    pub low_threshold: u8,
    pub med_threshold: u8,
    pub high_threshold: u8,
}

#[derive(Debug, Deserialize)]
pub struct HorizonAccount {
    pub account_id: String,
    /// Sequence numbers are int64 serialized as strings
    pub sequence: String,
    pub home_domain: Option<String>,
    #[serde(default)]
    pub balances: Vec<HorizonBalance>,
    #[serde(default)]
    pub signers: Vec<HorizonSigner>,
    #[serde(default)]
    pub thresholds: HorizonThresholds,
    #[serde(default)]
    pub data: BTreeMap<String, String>,
}

impl TryFrom<HorizonAccount> for AccountSnapshot {
    type Error = HorizonError;

    fn try_from(account: HorizonAccount) -> Result<Self, Self::Error> {
        let sequence: i64 = account.sequence.parse().map_err(|_| {
            HorizonError::MalformedResponse(format!("invalid sequence: {}", account.sequence))
        })?;

        let balances = account
            .balances
            .into_iter()
            .map(|b| {
                let asset = Asset::from_parts(
                    &b.asset_type,
                    b.asset_code.as_deref(),
                    b.asset_issuer.as_deref(),
                    b.liquidity_pool_id.as_deref(),
                )
                .map_err(|e| HorizonError::MalformedResponse(e.to_string()))?;
                let balance = parse_amount(&b.balance)
                    .map_err(|e| HorizonError::MalformedResponse(e.to_string()))?;
                Ok(AccountBalance { asset, balance })
            })
            .collect::<Result<Vec<_>, HorizonError>>()?;

        let signers = account
            .signers
            .into_iter()
            .map(|s| AccountSigner {
                key: s.key,
                weight: s.weight,
                kind: s.kind,
            })
            .collect();

        let thresholds = Thresholds {
            low: account.thresholds.low_threshold,
            med: account.thresholds.med_threshold,
            high: account.thresholds.high_threshold,
        };

        Ok(AccountSnapshot::new(account.account_id, sequence).with_details(
            account.home_domain,
            balances,
            signers,
            thresholds,
            account.data,
        ))
    }
}

/// Body of a successful `POST /transactions`
#[derive(Debug, Deserialize)]
pub struct HorizonTransactionSuccess {
    pub hash: String,
    pub ledger: u32,
    pub result_xdr: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct HorizonResultCodes {
    pub transaction: String,
    #[serde(default)]
    pub operations: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct HorizonProblemExtras {
    pub result_xdr: Option<String>,
    pub result_codes: Option<HorizonResultCodes>,
}

/// Problem document returned on failures
#[derive(Debug, Deserialize)]
pub struct HorizonProblem {
    pub title: Option<String>,
    pub status: Option<u16>,
    pub extras: Option<HorizonProblemExtras>,
}
