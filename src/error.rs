//! Error types for mlperf-hooks-rs.
//!
//! This module provides error types and result aliases for the library.
//!
//! The crate is a fail-fast reporting layer: nothing here retries, and a
//! missing metric or a failed sink write surfaces to the caller verbatim.
//! A compliance log is only meaningful if every required record was written.
//!
//! # Example
//!
//! ```rust
//! use mlperf_hooks_rs::{HooksError, Result};
//!
//! fn validate_interval(steps: u64) -> Result<()> {
//!     if steps == 0 {
//!         return Err(HooksError::Config("interval cannot be zero".to_string()));
//!     }
//!     Ok(())
//! }
//!
//! assert!(validate_interval(0).is_err());
//! assert!(validate_interval(50).is_ok());
//! ```

use thiserror::Error;

/// Result type alias for mlperf-hooks-rs operations.
pub type Result<T> = std::result::Result<T, HooksError>;

/// Errors that can occur in mlperf-hooks-rs.
///
/// # Example
///
/// ```rust
/// use mlperf_hooks_rs::HooksError;
///
/// let err = HooksError::MissingMetric {
///     key: "eval_loss".to_string(),
/// };
/// assert!(err.to_string().contains("eval_loss"));
/// ```
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum HooksError {
    /// Run configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Invalid configuration file.
    #[error("invalid config file: {0}")]
    ConfigParse(#[from] serde_yaml::Error),

    /// Distributed context error (rank query or barrier failure).
    #[error("distributed error: {0}")]
    Distributed(String),

    /// Event sink error.
    #[error("sink error: {0}")]
    Sink(String),

    /// A required metric was absent from the latest history entry.
    #[error("metric `{key}` missing from the latest metric-history entry")]
    MissingMetric {
        /// Name of the metric that was expected.
        key: String,
    },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Event serialization error.
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}
