//! Convenience re-exports for common `pacemaker` types.
//!
//! ```ignore
//! use pacemaker::prelude::*;
//! ```
//!
//! Pulls in the orchestrator entry points, the adaptive engine, config and
//! status rendering. The individual allowance functions are left in
//! [`pacing::allowance`](crate::pacing::allowance).

// ── Orchestration ───────────────────────────────────────────────────
pub use crate::pacing::{
    Algorithm, UsageSample, WindowKind, WindowStatus, WindowUsage, WindowedDecision, decide,
    decide_now, decide_sample,
};

// ── Adaptive engine ─────────────────────────────────────────────────
pub use crate::pacing::{
    AdaptiveParams, PacingDecision, Projection, Strategy, WindowInput, calculate_adaptive_delay,
};

// ── Config, errors, output ──────────────────────────────────────────
pub use crate::config::PacingConfig;
pub use crate::error::{PacingError, PacingResult};
pub use crate::status::StatusReport;

pub use chrono::{DateTime, Utc};
