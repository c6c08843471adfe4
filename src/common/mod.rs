//! Common Infrastructure Module
//!
//! Shared utilities and configuration for claimsweep.
//!
//! This module contains:
//! - Configuration loading from environment variables
//! - Structured logging setup
//! - The root error type

pub mod config;
pub mod error;
pub mod logging;

// Re-exports for convenience
pub use config::{ClaimsweepConfig, ConfigError, Network};
pub use error::{ClaimsweepError, Result};
pub use logging::{
    generate_correlation_id, init_from_config, init_logging, log_collection_event,
    log_compose_event, log_error_event, log_security_event, log_submission_event,
    log_system_event, ErrorDetails, EventCategory, LogEvent, LogLevel, LoggingError,
};
