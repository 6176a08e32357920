//! Error types.
//!
//! The pacing core only fails on a caller-contract violation
//! ([`PacingError::InvalidArguments`]). The remaining variants belong to the
//! configuration loader, which is the only part of the crate touching the
//! filesystem.

/// Errors produced by the pacing engine and its configuration loader.
#[derive(Debug, thiserror::Error)]
pub enum PacingError {
    #[error("must provide either (window_start, now) or (target_util, time_elapsed_pct)")]
    InvalidArguments,

    #[error("failed to read config '{path}': {source}")]
    ConfigRead {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse config '{path}': {source}")]
    ConfigParse {
        path: String,
        source: serde_json::Error,
    },

    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

/// Result type alias
pub type PacingResult<T> = Result<T, PacingError>;
