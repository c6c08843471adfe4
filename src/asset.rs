//! Assets and Amounts
//!
//! Asset descriptors and exact decimal amount handling. Amounts are always
//! `rust_decimal::Decimal`; Stellar amounts carry at most seven fractional
//! digits (one stroop).

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::str::FromStr;
use thiserror::Error;

/// Stroops per whole unit of an asset
pub const STROOPS_PER_UNIT: i64 = 10_000_000;

/// Maximum fractional digits in a Stellar amount
pub const MAX_AMOUNT_SCALE: u32 = 7;

/// Asset errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssetError {
    #[error("invalid asset: {0}")]
    InvalidAsset(String),

    #[error("invalid amount: {0}")]
    InvalidAmount(String),
}

/// Asset descriptor
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Asset {
    /// The network's native asset (lumens)
    Native,
    /// Issued asset identified by code and issuer account
    Credit { code: String, issuer: String },
    /// Liquidity pool shares (only ever seen in account balances)
    PoolShare { pool_id: String },
}

impl Asset {
    /// Create an issued asset
    pub fn credit(code: impl Into<String>, issuer: impl Into<String>) -> Self {
        Self::Credit {
            code: code.into(),
            issuer: issuer.into(),
        }
    }

    pub fn is_native(&self) -> bool {
        matches!(self, Asset::Native)
    }

    /// Horizon's `asset_type` name for this asset
    pub fn asset_type(&self) -> &'static str {
        match self {
            Asset::Native => "native",
            Asset::Credit { code, .. } if code.len() <= 4 => "credit_alphanum4",
            Asset::Credit { .. } => "credit_alphanum12",
            Asset::PoolShare { .. } => "liquidity_pool_shares",
        }
    }

    pub fn code(&self) -> Option<&str> {
        match self {
            Asset::Credit { code, .. } => Some(code),
            _ => None,
        }
    }

    pub fn issuer(&self) -> Option<&str> {
        match self {
            Asset::Credit { issuer, .. } => Some(issuer),
            _ => None,
        }
    }

    /// Build an asset from Horizon's split balance fields
    pub fn from_parts(
        asset_type: &str,
        code: Option<&str>,
        issuer: Option<&str>,
        pool_id: Option<&str>,
    ) -> Result<Self, AssetError> {
        match (asset_type, code, issuer, pool_id) {
            ("native", _, _, _) => Ok(Asset::Native),
            ("credit_alphanum4" | "credit_alphanum12", Some(code), Some(issuer), _) => {
                Ok(Asset::credit(code, issuer))
            }
            ("liquidity_pool_shares", _, _, Some(pool_id)) => Ok(Asset::PoolShare {
                pool_id: pool_id.to_string(),
            }),
            _ => Err(AssetError::InvalidAsset(format!(
                "unsupported balance of type {}",
                asset_type
            ))),
        }
    }
}

/// Parses Horizon's canonical asset string: `native` or `CODE:ISSUER`
impl FromStr for Asset {
    type Err = AssetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "native" {
            return Ok(Asset::Native);
        }

        match s.split_once(':') {
            Some((code, issuer))
                if !code.is_empty()
                    && code.len() <= 12
                    && code.chars().all(|c| c.is_ascii_alphanumeric())
                    && !issuer.is_empty() =>
            {
                Ok(Asset::credit(code, issuer))
            }
            _ => Err(AssetError::InvalidAsset(s.to_string())),
        }
    }
}

impl std::fmt::Display for Asset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Asset::Native => write!(f, "native"),
            Asset::Credit { code, issuer } => write!(f, "{}:{}", code, issuer),
            Asset::PoolShare { pool_id } => write!(f, "pool:{}", pool_id),
        }
    }
}

/// Parse a Horizon amount string exactly
///
/// Rejects negative values and anything finer than one stroop.
pub fn parse_amount(raw: &str) -> Result<Decimal, AssetError> {
    let amount = Decimal::from_str(raw.trim())
        .map_err(|_| AssetError::InvalidAmount(raw.to_string()))?;

    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(AssetError::InvalidAmount(format!("{} is negative", raw)));
    }

    if amount.normalize().scale() > MAX_AMOUNT_SCALE {
        return Err(AssetError::InvalidAmount(format!(
            "{} has more than {} decimal places",
            raw, MAX_AMOUNT_SCALE
        )));
    }

    Ok(amount)
}

/// Convert a whole-stroop amount to its integer stroop count
pub fn to_stroops(amount: Decimal) -> Option<i64> {
    let stroops = amount.checked_mul(Decimal::from(STROOPS_PER_UNIT))?;
    if stroops.fract() != Decimal::ZERO {
        return None;
    }
    stroops.to_i64()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_asset_strings() {
        assert_eq!("native".parse::<Asset>().unwrap(), Asset::Native);

        let usdc: Asset = "USDC:GISSUER".parse().unwrap();
        assert_eq!(usdc, Asset::credit("USDC", "GISSUER"));
        assert_eq!(usdc.asset_type(), "credit_alphanum4");
        assert_eq!(usdc.to_string(), "USDC:GISSUER");

        let long: Asset = "LONGERCODE:GISSUER".parse().unwrap();
        assert_eq!(long.asset_type(), "credit_alphanum12");

        assert!("".parse::<Asset>().is_err());
        assert!("USDC".parse::<Asset>().is_err());
        assert!(":GISSUER".parse::<Asset>().is_err());
        assert!("WAYTOOLONGCODE1:GISSUER".parse::<Asset>().is_err());
    }

    #[test]
    fn test_from_parts() {
        assert_eq!(Asset::from_parts("native", None, None, None).unwrap(), Asset::Native);
        assert_eq!(
            Asset::from_parts("credit_alphanum4", Some("EURT"), Some("GA"), None).unwrap(),
            Asset::credit("EURT", "GA")
        );
        assert!(Asset::from_parts("credit_alphanum4", Some("EURT"), None, None).is_err());
        assert!(matches!(
            Asset::from_parts("liquidity_pool_shares", None, None, Some("abcd")),
            Ok(Asset::PoolShare { .. })
        ));
    }

    #[test]
    fn test_parse_amount_is_exact() {
        let a = parse_amount("5.0000001").unwrap();
        let b = parse_amount("14.9999999").unwrap();
        assert_eq!(a + b, Decimal::from(20));

        assert!(parse_amount("0.00000001").is_err());
        assert!(parse_amount("-1").is_err());
        assert!(parse_amount("abc").is_err());
        assert_eq!(parse_amount("1.50000000").unwrap(), Decimal::new(15, 1));
    }

    #[test]
    fn test_to_stroops() {
        assert_eq!(to_stroops(Decimal::from(39)), Some(390_000_000));
        assert_eq!(to_stroops(Decimal::new(1, 7)), Some(1));
        assert_eq!(to_stroops(Decimal::new(1, 8)), None);
    }
}
