//! Structured Logging for claimsweep
//!
//! Provides structured logging with:
//! - JSON output for log aggregation
//! - Correlation IDs tying every event of one claim flow together
//! - Security event logging (key handling)
//! - Category helpers for Horizon traversals, composition, errors and lifecycle
//!
//! # Usage
//!
//! ```rust,ignore
//! use claimsweep::common::logging::{init_logging, LogLevel};
//!
//! init_logging(LogLevel::Info, false)?;
//! tracing::info!(target: "claimsweep::flow", account = %id, "Claiming balances");
//! ```

use serde::Serialize;
use tracing::Level;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

// ============================================================================
// Log Levels
// ============================================================================

/// Application log level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }
}

impl From<&str> for LogLevel {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "trace" => LogLevel::Trace,
            "debug" => LogLevel::Debug,
            "info" => LogLevel::Info,
            "warn" | "warning" => LogLevel::Warn,
            "error" => LogLevel::Error,
            _ => LogLevel::Info,
        }
    }
}

// ============================================================================
// Structured Event Types
// ============================================================================

/// Event categories for structured logging
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventCategory {
    /// Horizon requests and pagination
    Horizon,
    /// Transaction composition
    Compose,
    /// Signing and submission outcomes
    Submission,
    /// Key handling
    Security,
    /// Startup and shutdown
    System,
    /// Error events
    Error,
}

/// Structured log event
#[derive(Debug, Serialize)]
pub struct LogEvent {
    /// Event timestamp (RFC 3339)
    pub timestamp: String,
    /// Log level
    pub level: String,
    /// Event category
    pub category: EventCategory,
    /// Human-readable message
    pub message: String,
    /// Correlation ID of the claim flow
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
    /// Additional structured data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    /// Duration in milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    /// Error details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorDetails>,
}

/// Error details for error events
#[derive(Debug, Serialize)]
pub struct ErrorDetails {
    pub code: String,
    pub message: String,
}

impl LogEvent {
    /// Create a new log event
    pub fn new(level: LogLevel, category: EventCategory, message: impl Into<String>) -> Self {
        Self {
            timestamp: chrono::Utc::now().to_rfc3339(),
            level: format!("{:?}", level).to_uppercase(),
            category,
            message: message.into(),
            correlation_id: None,
            data: None,
            duration_ms: None,
            error: None,
        }
    }

    /// Add correlation ID
    pub fn with_correlation_id(mut self, id: impl Into<String>) -> Self {
        self.correlation_id = Some(id.into());
        self
    }

    /// Add structured data
    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Add duration
    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    /// Add error details
    pub fn with_error(mut self, code: impl Into<String>, message: impl Into<String>) -> Self {
        self.error = Some(ErrorDetails {
            code: code.into(),
            message: message.into(),
        });
        self
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(
                "{{\"error\": \"failed to serialize log\", \"message\": \"{}\"}}",
                self.message
            )
        })
    }
}

// ============================================================================
// Event Helpers
// ============================================================================

/// Log a security-related event (key parsing, signing)
pub fn log_security_event(
    event_type: &str,
    success: bool,
    details: serde_json::Value,
    correlation_id: Option<&str>,
) {
    let level = if success { LogLevel::Info } else { LogLevel::Warn };
    let event = LogEvent::new(level, EventCategory::Security, event_type).with_data(
        serde_json::json!({
            "success": success,
            "details": details
        }),
    );

    let event = if let Some(id) = correlation_id {
        event.with_correlation_id(id)
    } else {
        event
    };

    if success {
        tracing::info!(target: "claimsweep::security", "{}", event.to_json());
    } else {
        tracing::warn!(target: "claimsweep::security", "{}", event.to_json());
    }
}

/// Log the outcome of a transaction submission
///
/// `result_codes` is only present for rejected transactions.
pub fn log_submission_event(
    correlation_id: &str,
    tx_hash: &str,
    accepted: bool,
    result_codes: Option<&[String]>,
    duration_ms: u64,
) {
    let level = if accepted { LogLevel::Info } else { LogLevel::Warn };
    let message = if accepted {
        "transaction accepted"
    } else {
        "transaction rejected"
    };

    let mut event = LogEvent::new(level, EventCategory::Submission, message)
        .with_correlation_id(correlation_id)
        .with_duration(duration_ms)
        .with_data(serde_json::json!({
            "tx_hash": tx_hash,
            "accepted": accepted,
        }));

    if let Some(codes) = result_codes {
        event = event.with_error("TX_REJECTED", codes.join(","));
    }

    if accepted {
        tracing::info!(target: "claimsweep::submission", "{}", event.to_json());
    } else {
        tracing::warn!(target: "claimsweep::submission", "{}", event.to_json());
    }
}

/// Log the end of a collection traversal against Horizon
pub fn log_collection_event(collection: &str, owner: &str, records: usize, duration_ms: u64) {
    let event = collection_event(collection, owner, records, duration_ms);
    tracing::info!(target: "claimsweep::horizon", "{}", event.to_json());
}

fn collection_event(collection: &str, owner: &str, records: usize, duration_ms: u64) -> LogEvent {
    LogEvent::new(LogLevel::Info, EventCategory::Horizon, "collection exhausted")
        .with_duration(duration_ms)
        .with_data(serde_json::json!({
            "collection": collection,
            "owner": owner,
            "records": records,
        }))
}

/// Log a sealed draft
pub fn log_compose_event(
    account: &str,
    sequence: i64,
    claims: usize,
    payment: &str,
    fee: u32,
) {
    let event = compose_event(account, sequence, claims, payment, fee);
    tracing::info!(target: "claimsweep::compose", "{}", event.to_json());
}

fn compose_event(account: &str, sequence: i64, claims: usize, payment: &str, fee: u32) -> LogEvent {
    LogEvent::new(LogLevel::Info, EventCategory::Compose, "draft composed").with_data(
        serde_json::json!({
            "account": account,
            "sequence": sequence,
            "claims": claims,
            "payment": payment,
            "fee": fee,
        }),
    )
}

/// Log a failure that ends a command or a claim flow
pub fn log_error_event(code: &str, message: &str, correlation_id: Option<&str>) {
    let event = error_event(code, message, correlation_id);
    tracing::error!(target: "claimsweep::error", "{}", event.to_json());
}

fn error_event(code: &str, message: &str, correlation_id: Option<&str>) -> LogEvent {
    let event = LogEvent::new(LogLevel::Error, EventCategory::Error, "operation failed")
        .with_error(code, message);
    match correlation_id {
        Some(id) => event.with_correlation_id(id),
        None => event,
    }
}

/// Log process lifecycle events
pub fn log_system_event(message: &str, data: serde_json::Value) {
    let event = LogEvent::new(LogLevel::Info, EventCategory::System, message).with_data(data);
    tracing::info!(target: "claimsweep::system", "{}", event.to_json());
}

// ============================================================================
// Initialization
// ============================================================================

/// Initialize the logging system
///
/// # Arguments
/// * `level` - Minimum log level to output
/// * `json_format` - Use JSON lines instead of the pretty printer
pub fn init_logging(level: LogLevel, json_format: bool) -> Result<(), LoggingError> {
    let level_name = format!("{:?}", level).to_lowercase();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("claimsweep={},reqwest={}", level_name, level_name))
    });

    if json_format {
        let subscriber = tracing_subscriber::registry().with(filter).with(
            fmt::layer()
                .json()
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_span_events(FmtSpan::CLOSE),
        );

        subscriber
            .try_init()
            .map_err(|e| LoggingError::InitFailed(e.to_string()))?;
    } else {
        let subscriber = tracing_subscriber::registry().with(filter).with(
            fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr),
        );

        subscriber
            .try_init()
            .map_err(|e| LoggingError::InitFailed(e.to_string()))?;
    }

    Ok(())
}

/// Initialize logging from ClaimsweepConfig
pub fn init_from_config(config: &super::config::ClaimsweepConfig) -> Result<(), LoggingError> {
    init_logging(LogLevel::from(config.log_level.as_str()), config.log_json)
}

/// Logging errors
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("failed to initialize logging: {0}")]
    InitFailed(String),
}

/// Generate a correlation ID for one claim flow
pub fn generate_correlation_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_event_serialization() {
        let event = LogEvent::new(LogLevel::Warn, EventCategory::Submission, "transaction rejected")
            .with_correlation_id("flow-123")
            .with_data(serde_json::json!({"tx_hash": "abcd"}))
            .with_error("TX_REJECTED", "op_underfunded")
            .with_duration(42);

        let json = event.to_json();
        assert!(json.contains("transaction rejected"));
        assert!(json.contains("flow-123"));
        assert!(json.contains("\"submission\""));
        assert!(json.contains("op_underfunded"));
        assert!(json.contains("42"));
    }

    #[test]
    fn test_optional_fields_skipped() {
        let json = LogEvent::new(LogLevel::Info, EventCategory::System, "startup").to_json();
        assert!(!json.contains("correlation_id"));
        assert!(!json.contains("duration_ms"));
    }

    #[test]
    fn test_event_categories() {
        let json = collection_event("claimable_balances", "GACC", 3, 12).to_json();
        assert!(json.contains("\"category\":\"horizon\""));
        assert!(json.contains("claimable_balances"));
        assert!(json.contains("\"duration_ms\":12"));

        let json = compose_event("GACC", 42, 2, "40", 300).to_json();
        assert!(json.contains("\"category\":\"compose\""));
        assert!(json.contains("\"sequence\":42"));

        let json = error_event("NOT_FOUND", "account GACC", Some("flow-1")).to_json();
        assert!(json.contains("\"category\":\"error\""));
        assert!(json.contains("NOT_FOUND"));
        assert!(json.contains("flow-1"));

        let json = error_event("CONFIG_ERROR", "bad fee", None).to_json();
        assert!(!json.contains("correlation_id"));
    }

    #[test]
    fn test_log_level_parsing() {
        assert_eq!(LogLevel::from("debug"), LogLevel::Debug);
        assert_eq!(LogLevel::from("INFO"), LogLevel::Info);
        assert_eq!(LogLevel::from("warning"), LogLevel::Warn);
        assert_eq!(LogLevel::from("unknown"), LogLevel::Info);
    }

    #[test]
    fn test_correlation_ids_are_unique() {
        let id1 = generate_correlation_id();
        let id2 = generate_correlation_id();
        assert_eq!(id1.len(), 32);
        assert_ne!(id1, id2);
    }
}
