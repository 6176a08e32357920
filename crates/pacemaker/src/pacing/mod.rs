//! The pacing decision engine.
//!
//! Layered leaf-first:
//!
//! 1. **[`allowance`]** — converts a window and an instant into an allowance
//!    percentage ([`continuous_allowance_pct`], [`weekday_aware_allowance_pct`])
//!    plus the legacy elapsed-time curves.
//!
//! 2. **[`selector`]** — [`select_constrained_window`] picks the window
//!    furthest above its target.
//!
//! 3. **[`adaptive`]** — [`calculate_adaptive_delay`] projects the burn rate
//!    forward and sizes a delay and [`Strategy`].
//!
//! 4. **[`legacy`]** — the proportional [`calculate_delay`] formula.
//!
//! 5. **[`decision`]** — [`decide`] composes all of the above for the 5-hour
//!    and 7-day windows.
//!
//! Everything in this module is pure: no I/O, no clock reads except in
//! [`decide_now`], no shared state.

pub mod adaptive;
pub mod allowance;
pub mod decision;
pub mod legacy;
pub mod selector;

// Re-export commonly used items at the module level.
pub use adaptive::{
    AdaptiveParams, PacingDecision, Projection, Strategy, WindowInput, calculate_adaptive_delay,
};
pub use allowance::{
    AccrualModel, Allowance, RateWindow, continuous_allowance_pct, elapsed_pct_from_reset,
    is_weekend, linear_target, logarithmic_target, weekday_aware_allowance_pct, weekday_seconds,
};
pub use decision::{
    Algorithm, UsageSample, WindowStatus, WindowUsage, WindowedDecision, decide, decide_now,
    decide_sample,
};
pub use legacy::calculate_delay;
pub use selector::{ConstrainedWindow, WindowKind, select_constrained_window};
