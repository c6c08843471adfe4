//! Environment-based Configuration for claimsweep
//!
//! Configuration is read from environment variables (after loading an optional
//! `.env` file). Secret keys are only ever taken from the environment or the
//! command line, never from hardcoded values.
//!
//! # Environment Variables
//!
//! ## Network Configuration
//! - `CLAIMSWEEP_NETWORK` - "testnet" or "public" (default: "testnet")
//! - `CLAIMSWEEP_HORIZON_URL` - Horizon endpoint URL (default depends on network)
//!
//! ## Transaction Policy
//! - `CLAIMSWEEP_BASE_FEE` - Fee per operation in stroops (default: 250)
//! - `CLAIMSWEEP_BASE_AMOUNT` - Amount paid on top of the claimed balances (default: 20)
//! - `CLAIMSWEEP_PAGE_LIMIT` - Records per Horizon page, 1..=200 (default: 10)
//!
//! ## Signing
//! - `CLAIMSWEEP_SECRET_KEY` - Secret seed (`S...`) of the claiming account
//!
//! ## Optional Settings
//! - `CLAIMSWEEP_LOG_LEVEL` - Logging level (debug, info, warn, error)
//! - `CLAIMSWEEP_LOG_JSON` - Set to "1" for JSON log lines

use rust_decimal::Decimal;
use std::env;
use std::str::FromStr;
use thiserror::Error;

use crate::horizon::{PUBLIC_URL, TESTNET_URL};

/// Default per-operation fee in stroops
pub const DEFAULT_BASE_FEE: u32 = 250;

/// Default records per page requested from Horizon
pub const DEFAULT_PAGE_LIMIT: u32 = 10;

/// Horizon refuses page sizes above this
pub const MAX_PAGE_LIMIT: u32 = 200;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Stellar network the client talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Network {
    Testnet,
    Public,
}

impl FromStr for Network {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "testnet" | "test" => Ok(Network::Testnet),
            "public" | "mainnet" | "pubnet" => Ok(Network::Public),
            _ => Err(ConfigError::InvalidValue(
                "CLAIMSWEEP_NETWORK".to_string(),
                format!("unknown network: {}", s),
            )),
        }
    }
}

impl Network {
    /// Default Horizon server for this network
    pub fn default_horizon_url(&self) -> &'static str {
        match self {
            Network::Testnet => TESTNET_URL,
            Network::Public => PUBLIC_URL,
        }
    }

    /// Network passphrase mixed into every signature payload
    pub fn passphrase(&self) -> &'static str {
        match self {
            Network::Testnet => "Test SDF Network ; September 2015",
            Network::Public => "Public Global Stellar Network ; September 2015",
        }
    }
}

/// Main configuration struct
#[derive(Clone)]
pub struct ClaimsweepConfig {
    /// Network environment
    pub network: Network,

    /// Horizon endpoint
    pub horizon_url: String,

    /// Fee per operation in stroops
    pub base_fee: u32,

    /// Amount paid to the destination on top of the claimed balances
    pub base_amount: Decimal,

    /// Records per page
    pub page_limit: u32,

    /// Secret seed of the claiming account, if configured
    pub secret_key: Option<String>,

    /// Log level
    pub log_level: String,

    /// Emit JSON log lines
    pub log_json: bool,
}

impl std::fmt::Debug for ClaimsweepConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClaimsweepConfig")
            .field("network", &self.network)
            .field("horizon_url", &self.horizon_url)
            .field("base_fee", &self.base_fee)
            .field("base_amount", &self.base_amount)
            .field("page_limit", &self.page_limit)
            .field("secret_key", &self.secret_key.as_ref().map(|_| "<redacted>"))
            .field("log_level", &self.log_level)
            .field("log_json", &self.log_json)
            .finish()
    }
}

impl Default for ClaimsweepConfig {
    fn default() -> Self {
        let network = Network::Testnet;
        Self {
            network,
            horizon_url: network.default_horizon_url().to_string(),
            base_fee: DEFAULT_BASE_FEE,
            base_amount: Decimal::from(20),
            page_limit: DEFAULT_PAGE_LIMIT,
            secret_key: None,
            log_level: "info".to_string(),
            log_json: false,
        }
    }
}

impl ClaimsweepConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let network: Network = lookup("CLAIMSWEEP_NETWORK")
            .unwrap_or_else(|| "testnet".to_string())
            .parse()?;

        let horizon_url = lookup("CLAIMSWEEP_HORIZON_URL")
            .unwrap_or_else(|| network.default_horizon_url().to_string());

        let base_fee = parse_or("CLAIMSWEEP_BASE_FEE", lookup("CLAIMSWEEP_BASE_FEE"), DEFAULT_BASE_FEE)?;
        if base_fee == 0 {
            return Err(ConfigError::InvalidValue(
                "CLAIMSWEEP_BASE_FEE".to_string(),
                "fee must be at least 1 stroop".to_string(),
            ));
        }

        let base_amount = parse_or(
            "CLAIMSWEEP_BASE_AMOUNT",
            lookup("CLAIMSWEEP_BASE_AMOUNT"),
            Decimal::from(20),
        )?;
        if base_amount.is_sign_negative() {
            return Err(ConfigError::InvalidValue(
                "CLAIMSWEEP_BASE_AMOUNT".to_string(),
                "amount cannot be negative".to_string(),
            ));
        }

        let page_limit = parse_or(
            "CLAIMSWEEP_PAGE_LIMIT",
            lookup("CLAIMSWEEP_PAGE_LIMIT"),
            DEFAULT_PAGE_LIMIT,
        )?;
        if page_limit == 0 || page_limit > MAX_PAGE_LIMIT {
            return Err(ConfigError::InvalidValue(
                "CLAIMSWEEP_PAGE_LIMIT".to_string(),
                format!("must be between 1 and {}", MAX_PAGE_LIMIT),
            ));
        }

        let secret_key = lookup("CLAIMSWEEP_SECRET_KEY").filter(|k| !k.trim().is_empty());
        let log_level = lookup("CLAIMSWEEP_LOG_LEVEL").unwrap_or_else(|| "info".to_string());
        let log_json = lookup("CLAIMSWEEP_LOG_JSON").map(|v| v == "1").unwrap_or(false);

        Ok(Self {
            network,
            horizon_url,
            base_fee,
            base_amount,
            page_limit,
            secret_key,
            log_level,
            log_json,
        })
    }

    /// Secret key or an error naming the variable to set
    pub fn require_secret_key(&self) -> Result<&str, ConfigError> {
        self.secret_key
            .as_deref()
            .ok_or_else(|| ConfigError::MissingEnvVar("CLAIMSWEEP_SECRET_KEY".to_string()))
    }

    /// Print configuration summary (hiding sensitive values)
    pub fn print_summary(&self) {
        println!("=== claimsweep Configuration ===");
        println!("Network: {:?}", self.network);
        println!("Horizon: {}", self.horizon_url);
        println!("Base Fee: {} stroops/op", self.base_fee);
        println!("Base Amount: {}", self.base_amount);
        println!("Page Limit: {}", self.page_limit);
        println!(
            "Secret Key: {}",
            if self.secret_key.is_some() { "configured" } else { "not set" }
        );
        println!("Log Level: {}", self.log_level);
        println!("================================");
    }
}

fn parse_or<T: FromStr>(name: &str, value: Option<String>, default: T) -> Result<T, ConfigError> {
    match value {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| {
            ConfigError::InvalidValue(name.to_string(), format!("cannot parse '{}'", raw))
        }),
    }
}
