//! Pacing decision orchestration across the 5-hour and 7-day windows.
//!
//! [`decide`] computes a target for each window, picks the most constrained
//! one and asks either the adaptive engine or the legacy formula for a delay.
//! The short window always accrues continuously with a fixed 30-minute
//! preload; the long window accrues on weekdays only with the configured
//! preload and can be switched off entirely via
//! [`PacingConfig::weekly_limit_enabled`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::adaptive::{
    AdaptiveParams, PacingDecision, Projection, Strategy, WEEKLY_WINDOW_HOURS, WindowInput,
    calculate_adaptive_delay,
};
use super::allowance::{
    AccrualModel, RateWindow, elapsed_pct_from_reset, linear_target, logarithmic_target,
};
use super::legacy::calculate_delay;
use super::selector::{WindowKind, select_constrained_window};
use crate::config::PacingConfig;

/// Length of the short window in hours.
pub const SHORT_WINDOW_HOURS: f64 = 5.0;

/// Flat preload granted at the start of every short window (10% of 5 hours).
pub const SHORT_WINDOW_PRELOAD_HOURS: f64 = 0.5;

/// Length of the long window in hours.
pub const LONG_WINDOW_HOURS: f64 = WEEKLY_WINDOW_HOURS;

// ── Inputs ─────────────────────────────────────────────────────────

/// Usage reported for one window. Missing fields mark the window inactive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WindowUsage {
    pub utilization: Option<f64>,
    pub resets_at: Option<DateTime<Utc>>,
}

impl WindowUsage {
    pub fn new(utilization: f64, resets_at: DateTime<Utc>) -> Self {
        Self {
            utilization: Some(utilization),
            resets_at: Some(resets_at),
        }
    }

    pub fn inactive() -> Self {
        Self::default()
    }

    /// Utilization, if the window is active (both fields known).
    fn active_utilization(&self) -> Option<f64> {
        self.resets_at.and(self.utilization)
    }
}

/// A usage snapshot for both windows, taken at `as_of`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UsageSample {
    pub short: WindowUsage,
    pub long: WindowUsage,
    pub as_of: DateTime<Utc>,
}

// ── Output ─────────────────────────────────────────────────────────

/// Which delay formula produced a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Algorithm {
    Adaptive,
    Legacy,
}

/// Per-window figures reported alongside a decision.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WindowStatus {
    pub utilization: Option<f64>,
    pub target: f64,
    pub time_elapsed_pct: f64,
}

/// The combined pacing decision for both windows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindowedDecision {
    pub should_throttle: bool,
    pub delay_seconds: u32,
    pub algorithm: Algorithm,
    /// Adaptive strategy; `None` for legacy decisions.
    pub strategy: Option<Strategy>,
    /// Adaptive projection; `None` for legacy decisions.
    pub projection: Option<Projection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub constrained_window: Option<WindowKind>,
    pub deviation_percent: f64,
    pub short: WindowStatus,
    pub long: WindowStatus,
}

// ── Orchestration ──────────────────────────────────────────────────

fn short_window(resets_at: DateTime<Utc>) -> RateWindow {
    RateWindow::ending_at(
        resets_at,
        SHORT_WINDOW_HOURS,
        SHORT_WINDOW_PRELOAD_HOURS,
        AccrualModel::Continuous,
    )
}

fn long_window(resets_at: DateTime<Utc>, config: &PacingConfig) -> RateWindow {
    RateWindow::ending_at(
        resets_at,
        LONG_WINDOW_HOURS,
        config.preload_hours,
        AccrualModel::WeekdayAware,
    )
}

/// Run the adaptive engine against the selected window.
fn adaptive_for(
    kind: WindowKind,
    utilization: f64,
    resets_at: DateTime<Utc>,
    config: &PacingConfig,
    now: DateTime<Utc>,
) -> PacingDecision {
    let (window, weekly_limit_enabled) = match kind {
        // The weekly toggle never disables the short window.
        WindowKind::Short => (short_window(resets_at), true),
        WindowKind::Long => (long_window(resets_at, config), config.weekly_limit_enabled),
    };

    let params = AdaptiveParams::new(utilization, window.hours_remaining(now))
        .with_window_hours(window.window_hours)
        .with_delays(config.base_delay, config.max_delay)
        .with_safety_buffer(config.safety_buffer_pct)
        .with_preload_hours(window.preload_hours)
        .with_weekly_limit(weekly_limit_enabled);

    calculate_adaptive_delay(
        WindowInput::Calendar {
            window_start: window.window_start,
            now,
        },
        &params,
    )
}

/// Decide how long to delay the next operation.
///
/// `now` is used for every time-dependent sub-computation; callers should
/// sample the clock once and pass the same instant throughout.
pub fn decide(
    short: &WindowUsage,
    long: &WindowUsage,
    config: &PacingConfig,
    now: DateTime<Utc>,
) -> WindowedDecision {
    let short_elapsed = elapsed_pct_from_reset(short.resets_at, SHORT_WINDOW_HOURS, now);
    let long_elapsed = elapsed_pct_from_reset(long.resets_at, LONG_WINDOW_HOURS, now);

    let short_target = match short.resets_at {
        Some(resets_at) if config.use_adaptive => short_window(resets_at).allowance_pct(now),
        _ => logarithmic_target(short_elapsed),
    };
    let long_target = match long.resets_at {
        Some(resets_at) if config.use_adaptive => long_window(resets_at, config).allowance_pct(now),
        _ => linear_target(long_elapsed),
    };

    let long_util = if config.weekly_limit_enabled {
        long.active_utilization()
    } else {
        None
    };
    let constrained = select_constrained_window(
        short.active_utilization(),
        short_target,
        long_util,
        long_target,
    );

    debug!(
        "Pacing targets: 5-hour {short_target:.1}% ({short_elapsed:.1}% elapsed), \
         7-day {long_target:.1}% ({long_elapsed:.1}% elapsed); constrained={:?} deviation={:+.1}%",
        constrained.window, constrained.deviation
    );

    let selected = constrained.window.and_then(|kind| {
        let usage = match kind {
            WindowKind::Short => short,
            WindowKind::Long => long,
        };
        Some((kind, usage.utilization?, usage.resets_at?))
    });

    let (delay_seconds, algorithm, strategy, projection, reason) = match selected {
        Some((kind, utilization, resets_at)) if config.use_adaptive => {
            let d = adaptive_for(kind, utilization, resets_at, config, now);
            (
                d.delay_seconds,
                Algorithm::Adaptive,
                Some(d.strategy),
                Some(d.projection),
                d.reason,
            )
        }
        _ => {
            let delay = calculate_delay(
                constrained.deviation,
                config.base_delay,
                config.threshold_percent,
                config.max_delay,
            );
            (delay, Algorithm::Legacy, None, None, None)
        }
    };

    if delay_seconds > 0 {
        info!(
            "Throttling {delay_seconds}s ({} window, {:?}{})",
            constrained
                .window
                .map(|w| w.to_string())
                .unwrap_or_else(|| "no".into()),
            algorithm,
            strategy.map(|s| format!(", {s}")).unwrap_or_default(),
        );
    }

    WindowedDecision {
        should_throttle: delay_seconds > 0,
        delay_seconds,
        algorithm,
        strategy,
        projection,
        reason,
        constrained_window: constrained.window,
        deviation_percent: constrained.deviation,
        short: WindowStatus {
            utilization: short.utilization,
            target: short_target,
            time_elapsed_pct: short_elapsed,
        },
        long: WindowStatus {
            utilization: long.utilization,
            target: long_target,
            time_elapsed_pct: long_elapsed,
        },
    }
}

/// Decide for a snapshot, treating its `as_of` instant as "now".
pub fn decide_sample(sample: &UsageSample, config: &PacingConfig) -> WindowedDecision {
    decide(&sample.short, &sample.long, config, sample.as_of)
}

/// Decide against the current wall clock, sampled once.
pub fn decide_now(
    short: &WindowUsage,
    long: &WindowUsage,
    config: &PacingConfig,
) -> WindowedDecision {
    decide(short, long, config, Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeDelta, TimeZone};

    /// 2024-01-01 is a Monday.
    fn at(day: u32, hour: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, day, hour, min, 0).unwrap()
    }

    #[test]
    fn both_windows_inactive_no_throttle() {
        let d = decide(
            &WindowUsage::inactive(),
            &WindowUsage::inactive(),
            &PacingConfig::default(),
            at(2, 12, 0),
        );
        assert!(!d.should_throttle);
        assert_eq!(d.delay_seconds, 0);
        assert_eq!(d.constrained_window, None);
        assert_eq!(d.algorithm, Algorithm::Legacy);
        assert_eq!(d.short.time_elapsed_pct, 0.0);
    }

    #[test]
    fn short_target_uses_preload_plateau() {
        let now = at(2, 12, 0);
        let short = WindowUsage::new(5.0, now + TimeDelta::minutes(280));
        let d = decide(&short, &WindowUsage::inactive(), &PacingConfig::default(), now);
        assert!((d.short.target - 10.0).abs() < 1e-9);
        assert_eq!(d.constrained_window, Some(WindowKind::Short));
        assert_eq!(d.delay_seconds, 0);
        assert_eq!(d.strategy, Some(Strategy::None));
    }

    #[test]
    fn over_budget_short_window_throttles() {
        // 4h into the 5h window: allowance 80%, safe 76%.
        let now = at(2, 13, 0);
        let short = WindowUsage::new(95.0, now + TimeDelta::hours(1));
        let d = decide(&short, &WindowUsage::inactive(), &PacingConfig::default(), now);
        assert!(d.should_throttle);
        assert_eq!(d.algorithm, Algorithm::Adaptive);
        assert_eq!(d.constrained_window, Some(WindowKind::Short));
        assert_eq!(d.delay_seconds, 350);
        assert_eq!(d.strategy, Some(Strategy::Emergency));
        assert!((d.deviation_percent - 15.0).abs() < 1e-9);
    }

    #[test]
    fn long_window_selected_when_further_behind() {
        // Long window started Monday 00:00; Wednesday noon allowance is 50%.
        let now = at(3, 12, 0);
        let short = WindowUsage::new(20.0, now + TimeDelta::hours(4));
        let long = WindowUsage::new(70.0, at(8, 0, 0));
        let d = decide(&short, &long, &PacingConfig::default(), now);
        assert_eq!(d.constrained_window, Some(WindowKind::Long));
        assert!((d.long.target - 50.0).abs() < 1e-9);
        assert!(d.should_throttle);
        assert_eq!(d.algorithm, Algorithm::Adaptive);
    }

    #[test]
    fn weekly_limit_disabled_ignores_long_window() {
        let now = at(3, 12, 0);
        let short = WindowUsage::new(10.0, now + TimeDelta::hours(4));
        let long = WindowUsage::new(99.0, at(8, 0, 0));
        let config = PacingConfig::default().with_weekly_limit(false);
        let d = decide(&short, &long, &config, now);
        assert_eq!(d.constrained_window, Some(WindowKind::Short));
        assert!(!d.should_throttle);
        assert_eq!(d.long.utilization, Some(99.0));
    }

    #[test]
    fn weekly_limit_disabled_keeps_short_window_pacing() {
        let now = at(2, 13, 0);
        let short = WindowUsage::new(95.0, now + TimeDelta::hours(1));
        let config = PacingConfig::default().with_weekly_limit(false);
        let d = decide(&short, &WindowUsage::inactive(), &config, now);
        assert_eq!(d.delay_seconds, 350);
        assert!(d.reason.is_none());
    }

    #[test]
    fn weekend_over_budget_long_window_is_frozen() {
        let now = at(6, 15, 0);
        let long = WindowUsage::new(99.0, at(8, 0, 0));
        let d = decide(&WindowUsage::inactive(), &long, &PacingConfig::default(), now);
        assert_eq!(d.delay_seconds, 350);
        assert_eq!(d.strategy, Some(Strategy::Emergency));
        assert!(d.reason.is_some());
    }

    #[test]
    fn legacy_mode_uses_log_and_linear_curves() {
        // 50% of the short window elapsed, 2h of the 168h window elapsed.
        let now = at(2, 12, 0);
        let short = WindowUsage::new(70.0, now + TimeDelta::minutes(150));
        let long = WindowUsage::new(1.0, now + TimeDelta::hours(166));
        let config = PacingConfig::default().with_adaptive(false);
        let d = decide(&short, &long, &config, now);

        assert_eq!(d.algorithm, Algorithm::Legacy);
        assert!(d.strategy.is_none());
        assert!((d.short.target - logarithmic_target(50.0)).abs() < 1e-9);
        assert!((d.long.target - linear_target(2.0 / 168.0 * 100.0)).abs() < 1e-9);
        assert_eq!(d.constrained_window, Some(WindowKind::Short));
        // Deviation ~8 points over the log curve -> 5 * (1 + 2 * 8) = 85s.
        let expected = calculate_delay(d.deviation_percent, 5, 0.0, 350);
        assert_eq!(d.delay_seconds, expected);
        assert!((80..=90).contains(&d.delay_seconds), "got {}", d.delay_seconds);
    }

    #[test]
    fn missing_reset_makes_window_inactive() {
        let now = at(2, 12, 0);
        let short = WindowUsage {
            utilization: Some(90.0),
            resets_at: None,
        };
        let d = decide(&short, &WindowUsage::inactive(), &PacingConfig::default(), now);
        assert_eq!(d.constrained_window, None);
        assert!(!d.should_throttle);
        assert_eq!(d.short.target, 0.0);
    }

    #[test]
    fn decide_sample_uses_snapshot_time() {
        let as_of = at(2, 13, 0);
        let sample = UsageSample {
            short: WindowUsage::new(95.0, as_of + TimeDelta::hours(1)),
            long: WindowUsage::inactive(),
            as_of,
        };
        let config = PacingConfig::default();
        assert_eq!(
            decide_sample(&sample, &config),
            decide(&sample.short, &sample.long, &config, as_of)
        );
    }

    #[test]
    fn delay_never_exceeds_max() {
        let now = at(4, 16, 0);
        let config = PacingConfig::default().with_delays(5, 90);
        for util in [0.0, 25.0, 60.0, 85.0, 100.0, 130.0] {
            let short = WindowUsage::new(util, now + TimeDelta::minutes(45));
            let long = WindowUsage::new(util, at(8, 0, 0));
            let d = decide(&short, &long, &config, now);
            assert!(d.delay_seconds <= 90, "util {util}: {}", d.delay_seconds);
        }
    }

    #[test]
    fn serializes_to_json() {
        let now = at(2, 13, 0);
        let short = WindowUsage::new(95.0, now + TimeDelta::hours(1));
        let d = decide(&short, &WindowUsage::inactive(), &PacingConfig::default(), now);
        let json = serde_json::to_value(&d).unwrap();
        assert_eq!(json["constrained_window"], "5-hour");
        assert_eq!(json["algorithm"], "adaptive");
        assert_eq!(json["strategy"], "emergency");
        assert_eq!(json["delay_seconds"], 350);
    }
}
