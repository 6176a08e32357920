//! Forward-looking adaptive delay calculation.
//!
//! Rather than reacting only to how far usage sits above the allowance, the
//! engine projects where the window will end at the current burn rate and
//! sizes the delay by how much the burn rate has to drop to land exactly on the
//! safety-buffer endpoint.
//!
//! The calculation runs in phases:
//!
//! 1. **Resolve** the allowance, either from a caller-supplied target
//!    ([`WindowInput::Legacy`]) or from the calendar ([`WindowInput::Calendar`]).
//!    Calendar resolution can short-circuit when the weekly limit is disabled
//!    or when usage is over budget on a weekend.
//! 2. **Project** the end-of-window utilization at the observed burn rate.
//!    Zero time remaining short-circuits to the maximum delay.
//! 3. **Correct**: when over the safe allowance, derive a target burn rate and
//!    the slowdown ratio, and translate that into a graduated delay.
//! 4. **Classify** the clamped delay into a [`Strategy`].

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use tracing::debug;

use super::allowance::{
    continuous_allowance_pct, hours, is_weekend, weekday_aware_allowance_pct, weekday_seconds,
};
use crate::error::{PacingError, PacingResult};

/// Windows at least this long accrue on weekdays only and honor the
/// weekly-limit toggle.
pub const WEEKLY_WINDOW_HOURS: f64 = 168.0;

/// Default minimum (and base) delay in seconds.
pub const DEFAULT_MIN_DELAY: u32 = 5;

/// Default maximum delay in seconds: a 360s hook timeout minus a 10s margin.
pub const DEFAULT_MAX_DELAY: u32 = 350;

/// Default share of the allowance that may be used before throttling.
pub const DEFAULT_SAFETY_BUFFER_PCT: f64 = 95.0;

pub const REASON_WEEKLY_DISABLED: &str = "weekly limit disabled";
pub const REASON_WEEKEND_FROZEN: &str = "over safe budget on weekend - allowance frozen";

/// Slowdown ratios at or above this are treated as "already on pace".
const ON_PACE_RATIO: f64 = 0.95;

// ── Result types ───────────────────────────────────────────────────

/// Severity label attached to a delay decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    None,
    Minimal,
    Gradual,
    Aggressive,
    Emergency,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::None => "none",
            Strategy::Minimal => "minimal",
            Strategy::Gradual => "gradual",
            Strategy::Aggressive => "aggressive",
            Strategy::Emergency => "emergency",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where the window is heading, with and without throttling.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Projection {
    /// End-of-window utilization if the current burn rate continues.
    pub util_if_no_throttle: f64,
    /// End-of-window utilization at the corrective burn rate.
    pub util_if_throttled: f64,
    /// `100 - current_util`.
    pub credits_remaining_pct: f64,
    /// Raw allowance percentage.
    pub allowance: f64,
    /// Allowance after the safety buffer.
    pub safe_allowance: f64,
    /// `safe_allowance - current_util`.
    pub buffer_remaining: f64,
}

impl Projection {
    /// A projection that assumes utilization stays where it is.
    fn standing(current_util: f64, allowance: f64, safe_allowance: f64) -> Self {
        Self::new(current_util, current_util, current_util, allowance, safe_allowance)
    }

    fn new(
        current_util: f64,
        util_if_no_throttle: f64,
        util_if_throttled: f64,
        allowance: f64,
        safe_allowance: f64,
    ) -> Self {
        Self {
            util_if_no_throttle,
            util_if_throttled,
            credits_remaining_pct: 100.0 - current_util,
            allowance,
            safe_allowance,
            buffer_remaining: safe_allowance - current_util,
        }
    }
}

/// A delay and its classification for one window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PacingDecision {
    pub delay_seconds: u32,
    pub strategy: Strategy,
    pub projection: Projection,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl PacingDecision {
    fn new(delay_seconds: u32, strategy: Strategy, projection: Projection) -> Self {
        Self {
            delay_seconds,
            strategy,
            projection,
            reason: None,
        }
    }

    fn with_reason(mut self, reason: &str) -> Self {
        self.reason = Some(reason.to_string());
        self
    }
}

// ── Inputs ─────────────────────────────────────────────────────────

/// How the allowance for the window is obtained.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WindowInput {
    /// The caller already knows the target and elapsed percentage.
    Legacy {
        target_util: f64,
        time_elapsed_pct: f64,
    },
    /// The allowance is derived from the calendar.
    Calendar {
        window_start: DateTime<Utc>,
        now: DateTime<Utc>,
    },
}

impl WindowInput {
    /// Build an input from loosely supplied values.
    ///
    /// A complete calendar pair takes precedence; otherwise a complete legacy
    /// pair is required. Anything else is [`PacingError::InvalidArguments`].
    pub fn from_parts(
        target_util: Option<f64>,
        time_elapsed_pct: Option<f64>,
        window_start: Option<DateTime<Utc>>,
        now: Option<DateTime<Utc>>,
    ) -> PacingResult<Self> {
        match (window_start, now, target_util, time_elapsed_pct) {
            (Some(window_start), Some(now), _, _) => Ok(Self::Calendar { window_start, now }),
            (_, _, Some(target_util), Some(time_elapsed_pct)) => Ok(Self::Legacy {
                target_util,
                time_elapsed_pct,
            }),
            _ => Err(PacingError::InvalidArguments),
        }
    }
}

/// Per-window parameters for [`calculate_adaptive_delay`].
#[derive(Debug, Clone, PartialEq)]
pub struct AdaptiveParams {
    /// Current utilization percentage. May be negative or above 100.
    pub current_util: f64,
    /// Hours until the window resets.
    pub time_remaining_hours: f64,
    /// Window length in hours. Default: 168.
    pub window_hours: f64,
    /// Smallest non-zero delay, also the base of the delay formula. Default: 5.
    pub min_delay: u32,
    /// Delay cap. Default: 350.
    pub max_delay: u32,
    /// Default: 95.
    pub safety_buffer_pct: f64,
    /// Preload plateau length in hours. Default: 0.
    pub preload_hours: f64,
    /// When `false`, weekly windows never throttle. Default: `true`.
    pub weekly_limit_enabled: bool,
}

impl Default for AdaptiveParams {
    fn default() -> Self {
        Self {
            current_util: 0.0,
            time_remaining_hours: 0.0,
            window_hours: WEEKLY_WINDOW_HOURS,
            min_delay: DEFAULT_MIN_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
            safety_buffer_pct: DEFAULT_SAFETY_BUFFER_PCT,
            preload_hours: 0.0,
            weekly_limit_enabled: true,
        }
    }
}

impl AdaptiveParams {
    pub fn new(current_util: f64, time_remaining_hours: f64) -> Self {
        Self {
            current_util,
            time_remaining_hours,
            ..Default::default()
        }
    }

    pub fn with_window_hours(mut self, window_hours: f64) -> Self {
        self.window_hours = window_hours;
        self
    }

    pub fn with_delays(mut self, min_delay: u32, max_delay: u32) -> Self {
        self.min_delay = min_delay;
        self.max_delay = max_delay;
        self
    }

    pub fn with_safety_buffer(mut self, safety_buffer_pct: f64) -> Self {
        self.safety_buffer_pct = safety_buffer_pct;
        self
    }

    pub fn with_preload_hours(mut self, preload_hours: f64) -> Self {
        self.preload_hours = preload_hours;
        self
    }

    pub fn with_weekly_limit(mut self, enabled: bool) -> Self {
        self.weekly_limit_enabled = enabled;
        self
    }
}

// ── Calculation ────────────────────────────────────────────────────

/// Allowance resolved for the window, or an early decision.
enum Resolution {
    Resolved {
        allowance: f64,
        safe_allowance: f64,
        time_elapsed_pct: f64,
    },
    Decided(PacingDecision),
}

fn resolve(input: WindowInput, p: &AdaptiveParams) -> Resolution {
    let (window_start, now) = match input {
        WindowInput::Legacy {
            target_util,
            time_elapsed_pct,
        } => {
            return Resolution::Resolved {
                allowance: target_util,
                safe_allowance: target_util * p.safety_buffer_pct / 100.0,
                time_elapsed_pct,
            };
        }
        WindowInput::Calendar { window_start, now } => (window_start, now),
    };

    let weekly = p.window_hours >= WEEKLY_WINDOW_HOURS;

    if weekly && !p.weekly_limit_enabled {
        debug!("Weekly limit disabled, skipping {}h window", p.window_hours);
        return Resolution::Decided(
            PacingDecision::new(
                0,
                Strategy::None,
                Projection::standing(p.current_util, 100.0, 100.0),
            )
            .with_reason(REASON_WEEKLY_DISABLED),
        );
    }

    let allowance = if weekly {
        weekday_aware_allowance_pct(window_start, now, p.window_hours, p.preload_hours)
    } else {
        continuous_allowance_pct(window_start, now, p.window_hours, p.preload_hours)
    };
    let safe_allowance = allowance * p.safety_buffer_pct / 100.0;

    if p.current_util > safe_allowance && is_weekend(now) {
        debug!(
            "Over safe budget on weekend ({:.1}% > {:.1}%), allowance frozen",
            p.current_util, safe_allowance
        );
        return Resolution::Decided(
            PacingDecision::new(
                p.max_delay,
                Strategy::Emergency,
                Projection::standing(p.current_util, allowance, safe_allowance),
            )
            .with_reason(REASON_WEEKEND_FROZEN),
        );
    }

    let total = weekday_seconds(window_start, window_start + hours(p.window_hours));
    let elapsed = weekday_seconds(window_start, now);
    let time_elapsed_pct = if total > 0 {
        elapsed as f64 / total as f64 * 100.0
    } else {
        0.0
    };

    Resolution::Resolved {
        allowance,
        safe_allowance,
        time_elapsed_pct,
    }
}

/// Translate a slowdown ratio into a raw (unclamped) delay.
fn delay_for_slowdown(slowdown_ratio: f64, time_remaining_hours: f64, p: &AdaptiveParams) -> u32 {
    if slowdown_ratio >= ON_PACE_RATIO {
        return if slowdown_ratio < 1.0 { p.min_delay } else { 0 };
    }
    if slowdown_ratio <= 0.0 {
        return p.max_delay;
    }

    // Less time left means each unit of required slowdown costs more delay.
    let multiplier = if time_remaining_hours < 1.0 {
        60.0
    } else if time_remaining_hours < 3.0 {
        40.0
    } else {
        20.0
    };

    (p.min_delay as f64 * (1.0 / slowdown_ratio - 1.0) * multiplier).floor() as u32
}

/// Compute the delay needed to bring a window back onto its allowance curve.
///
/// Early exits are evaluated in a fixed order: weekly limit disabled, over
/// budget on a weekend, then no time remaining. See the module docs for the
/// full sequence.
pub fn calculate_adaptive_delay(input: WindowInput, p: &AdaptiveParams) -> PacingDecision {
    let (allowance, safe_allowance, time_elapsed_pct) = match resolve(input, p) {
        Resolution::Decided(decision) => return decision,
        Resolution::Resolved {
            allowance,
            safe_allowance,
            time_elapsed_pct,
        } => (allowance, safe_allowance, time_elapsed_pct),
    };

    let util = p.current_util;
    let remaining = p.time_remaining_hours;
    let budget_remaining = 100.0 - util;
    let overage = util - safe_allowance;
    let elapsed_hours = time_elapsed_pct / 100.0 * p.window_hours;

    if remaining <= 0.0 {
        debug!("No time remaining in {}h window", p.window_hours);
        return PacingDecision::new(
            p.max_delay,
            Strategy::Emergency,
            Projection::standing(util, allowance, safe_allowance),
        );
    }

    let burn_rate = if elapsed_hours > 0.0 {
        util / elapsed_hours
    } else {
        0.0
    };
    let util_if_no_throttle = util + burn_rate * remaining;

    if overage <= 0.0 {
        return PacingDecision::new(
            0,
            Strategy::None,
            Projection::new(
                util,
                util_if_no_throttle,
                util_if_no_throttle,
                allowance,
                safe_allowance,
            ),
        );
    }

    // Aim to finish the window exactly at the safety-buffer endpoint.
    let target_remaining = p.safety_buffer_pct - util;
    let target_burn_rate = if target_remaining <= 0.0 {
        budget_remaining / remaining * 0.5
    } else {
        target_remaining / remaining
    };

    let slowdown_ratio = if burn_rate > 0.0 {
        target_burn_rate / burn_rate
    } else {
        1.0
    };

    let delay = delay_for_slowdown(slowdown_ratio, remaining, p)
        .max(p.min_delay)
        .min(p.max_delay);
    let util_if_throttled = util + target_burn_rate * remaining;

    let (delay, strategy) = if delay <= p.min_delay {
        (0, Strategy::None)
    } else if delay >= p.max_delay {
        (delay, Strategy::Emergency)
    } else if overage < 5.0 {
        (delay, Strategy::Minimal)
    } else if overage < 20.0 {
        (delay, Strategy::Gradual)
    } else {
        (delay, Strategy::Aggressive)
    };

    debug!(
        "Adaptive pacing: util={util:.1}% safe={safe_allowance:.1}% burn={burn_rate:.2}%/h \
         target_burn={target_burn_rate:.2}%/h ratio={slowdown_ratio:.3} -> {delay}s ({strategy})"
    );

    PacingDecision::new(
        delay,
        strategy,
        Projection::new(
            util,
            util_if_no_throttle,
            util_if_throttled,
            allowance,
            safe_allowance,
        ),
    )
}
