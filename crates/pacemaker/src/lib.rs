//! Credit-aware adaptive pacing for rate-limited agents.
//!
//! `pacemaker` decides, at each point in time, whether and how long to delay
//! an agent's next operation so that its cumulative usage tracks a target
//! consumption curve across two overlapping rate-limit windows:
//!
//! - a **5-hour window** whose allowance accrues continuously, and
//! - a **7-day window** whose allowance accrues on weekdays only and freezes
//!   over the weekend.
//!
//! The core is a set of pure functions. It never performs I/O, never sleeps
//! and never reads the clock on its own (except [`decide_now`](pacing::decide_now)).
//! Fetching usage data and enforcing the delay belong to the caller.
//!
//! # Getting started
//!
//! ```ignore
//! use pacemaker::prelude::*;
//!
//! let config = PacingConfig::default();
//! let short = WindowUsage::new(42.0, five_hour_resets_at);
//! let long = WindowUsage::new(31.5, seven_day_resets_at);
//!
//! let decision = decide(&short, &long, &config, Utc::now());
//! if decision.should_throttle {
//!     println!("delay {}s", decision.delay_seconds);
//! }
//! println!("{}", StatusReport::new(&decision));
//! ```
//!
//! # Where to find things
//!
//! - **Allowance arithmetic:** [`pacing::allowance`] — weekday second
//!   counting, continuous and weekday-aware allowances, the legacy curves.
//!
//! - **Delay sizing:** [`pacing::adaptive`] for the forward-looking engine
//!   ([`calculate_adaptive_delay`](pacing::calculate_adaptive_delay)) and
//!   [`pacing::legacy`] for the proportional formula.
//!
//! - **Both windows at once:** [`decide`](pacing::decide) in
//!   [`pacing::decision`].
//!
//! - **Settings:** [`PacingConfig`](config::PacingConfig), loadable from JSON.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`pacing`] | Allowance calculator, window selector, adaptive engine, orchestrator |
//! | [`config`] | [`PacingConfig`](config::PacingConfig) defaults, JSON loading, validation |
//! | [`status`] | [`StatusReport`](status::StatusReport) text rendering |
//! | [`error`] | [`PacingError`](error::PacingError) |

pub mod config;
pub mod error;
pub mod pacing;
pub mod prelude;
pub mod status;

pub use config::PacingConfig;
pub use error::{PacingError, PacingResult};
