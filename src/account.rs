//! Account Snapshots
//!
//! A point-in-time view of a ledger account. Snapshots are never mutated; a
//! fresh fetch replaces them.

use base64::{engine::general_purpose::STANDARD, Engine};
use rust_decimal::Decimal;
use std::collections::BTreeMap;

use crate::asset::Asset;

/// Balance line of an account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountBalance {
    pub asset: Asset,
    pub balance: Decimal,
}

/// Signer attached to an account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountSigner {
    /// Signer key (account id, pre-auth tx hash, ...)
    pub key: String,
    pub weight: u32,
    /// Horizon's signer type, e.g. `ed25519_public_key`
    pub kind: String,
}

/// Low/medium/high operation thresholds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Thresholds {
    pub low: u8,
    pub med: u8,
    pub high: u8,
}

/// Immutable view of an account as fetched from Horizon
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountSnapshot {
    account_id: String,
    sequence: i64,
    home_domain: Option<String>,
    balances: Vec<AccountBalance>,
    signers: Vec<AccountSigner>,
    thresholds: Thresholds,
    /// Data entries, values still base64 encoded
    data: BTreeMap<String, String>,
}

impl AccountSnapshot {
    pub fn new(account_id: impl Into<String>, sequence: i64) -> Self {
        Self {
            account_id: account_id.into(),
            sequence,
            home_domain: None,
            balances: Vec::new(),
            signers: Vec::new(),
            thresholds: Thresholds::default(),
            data: BTreeMap::new(),
        }
    }

    pub(crate) fn with_details(
        mut self,
        home_domain: Option<String>,
        balances: Vec<AccountBalance>,
        signers: Vec<AccountSigner>,
        thresholds: Thresholds,
        data: BTreeMap<String, String>,
    ) -> Self {
        self.home_domain = home_domain.filter(|d| !d.is_empty());
        self.balances = balances;
        self.signers = signers;
        self.thresholds = thresholds;
        self.data = data;
        self
    }

    pub fn account_id(&self) -> &str {
        &self.account_id
    }

    /// Sequence number last consumed by this account
    pub fn sequence(&self) -> i64 {
        self.sequence
    }

    pub fn home_domain(&self) -> Option<&str> {
        self.home_domain.as_deref()
    }

    pub fn balances(&self) -> &[AccountBalance] {
        &self.balances
    }

    pub fn signers(&self) -> &[AccountSigner] {
        &self.signers
    }

    pub fn thresholds(&self) -> Thresholds {
        self.thresholds
    }

    pub fn data(&self) -> &BTreeMap<String, String> {
        &self.data
    }

    /// Read-only display projection for the CLI
    pub fn summary(&self) -> AccountSummary {
        AccountSummary::from(self)
    }
}

/// Printable projection of an [`AccountSnapshot`]
#[derive(Debug, Clone)]
pub struct AccountSummary {
    lines: Vec<String>,
}

impl AccountSummary {
    pub fn lines(&self) -> &[String] {
        &self.lines
    }
}

impl From<&AccountSnapshot> for AccountSummary {
    fn from(account: &AccountSnapshot) -> Self {
        let mut lines = vec![
            format!("Account: {}", account.account_id),
            format!("Sequence number: {}", account.sequence),
            format!("Home domain: {}", account.home_domain().unwrap_or("n/a")),
            "Balances:".to_string(),
        ];

        for balance in &account.balances {
            lines.push(format!(
                "--> {} {}: {}",
                balance.asset.asset_type(),
                balance.asset.code().unwrap_or(""),
                balance.balance
            ));
            if !balance.asset.is_native() {
                lines.push(format!(
                    "----> issuer: {}",
                    balance.asset.issuer().unwrap_or("n/a")
                ));
            }
        }

        lines.push("Data:".to_string());
        for (key, value) in &account.data {
            let decoded = STANDARD
                .decode(value)
                .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
                .unwrap_or_else(|_| "<undecodable>".to_string());
            lines.push(format!("--> {}: {}", key, decoded));
            lines.push(format!("----> {}", value));
        }

        lines.push("Signers:".to_string());
        for signer in &account.signers {
            lines.push(format!("--> {}: {}", signer.weight, signer.key));
            lines.push(format!("----> Type: {}", signer.kind));
        }

        lines.push("Thresholds:".to_string());
        lines.push(format!("--> High: {}", account.thresholds.high));
        lines.push(format!("--> Med: {}", account.thresholds.med));
        lines.push(format!("--> Low: {}", account.thresholds.low));

        Self { lines }
    }
}

impl std::fmt::Display for AccountSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for line in &self.lines {
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_projection() {
        let mut data = BTreeMap::new();
        data.insert("config".to_string(), STANDARD.encode("hello"));

        let account = AccountSnapshot::new("GSOURCE", 42).with_details(
            Some("example.com".to_string()),
            vec![
                AccountBalance {
                    asset: Asset::Native,
                    balance: Decimal::new(1005, 1),
                },
                AccountBalance {
                    asset: Asset::credit("USDC", "GISSUER"),
                    balance: Decimal::from(3),
                },
            ],
            vec![AccountSigner {
                key: "GSOURCE".to_string(),
                weight: 1,
                kind: "ed25519_public_key".to_string(),
            }],
            Thresholds { low: 0, med: 1, high: 2 },
            data,
        );

        let text = account.summary().to_string();
        assert!(text.contains("Sequence number: 42"));
        assert!(text.contains("Home domain: example.com"));
        assert!(text.contains("--> native : 100.5"));
        assert!(text.contains("--> credit_alphanum4 USDC: 3"));
        assert!(text.contains("----> issuer: GISSUER"));
        assert!(text.contains("--> config: hello"));
        assert!(text.contains("--> 1: GSOURCE"));
        assert!(text.contains("--> High: 2"));
        // native balances carry no issuer line
        assert_eq!(text.matches("issuer").count(), 1);
    }

    #[test]
    fn test_empty_home_domain_is_absent() {
        let account = AccountSnapshot::new("G", 1).with_details(
            Some(String::new()),
            vec![],
            vec![],
            Thresholds::default(),
            BTreeMap::new(),
        );
        assert_eq!(account.home_domain(), None);
    }
}
