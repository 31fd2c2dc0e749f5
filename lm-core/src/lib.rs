//! LawMatics Core - Foundation types, error handling, configuration, and logging.
//!
//! This crate provides the shared foundation used by the other SDK crates:
//! - Client configuration (API endpoint, retry policy, OAuth endpoints)
//! - The typed error taxonomy returned by every API call
//! - Structured logging with tracing
//! - Common constants

pub mod config;
pub mod constants;
pub mod error;
pub mod logging;

// Re-export commonly used items at the crate root
pub use config::{ApiConfig, BackoffStrategy, OAuthConfig, SdkConfig};
pub use error::{ApiFailure, LmError, LmResult};
pub use logging::init_logging;
