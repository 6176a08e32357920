//! End-to-end pacing scenarios through the public API.
//!
//! Each test walks a realistic usage situation through `decide` or the
//! adaptive engine and checks the delay and strategy a caller would act on.

use chrono::{TimeDelta, TimeZone};
use pacemaker::pacing::{calculate_delay, continuous_allowance_pct, weekday_seconds};
use pacemaker::prelude::*;

/// 2024-01-01 is a Monday.
fn at(day: u32, hour: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, day, hour, min, 0).unwrap()
}

// ── Allowance arithmetic ─────────────────────────────────────────────

#[test]
fn weekday_seconds_reference_values() {
    assert_eq!(weekday_seconds(at(1, 9, 0), at(1, 17, 0)), 28_800);
    assert_eq!(weekday_seconds(at(5, 18, 0), at(8, 6, 0)), 43_200);
}

#[test]
fn short_window_allowance_curve() {
    let start = at(3, 8, 0);
    let expected = [(0, 10.0), (60, 20.0), (150, 50.0), (300, 100.0)];
    for (minutes, pct) in expected {
        let got = continuous_allowance_pct(start, start + TimeDelta::minutes(minutes), 5.0, 0.5);
        assert!((got - pct).abs() < 1e-9, "+{minutes}min: expected {pct}, got {got}");
    }
}

// ── Adaptive engine ──────────────────────────────────────────────────

#[test]
fn on_track_short_window_needs_no_delay() {
    let params = AdaptiveParams::new(30.0, 2.5).with_window_hours(5.0);
    let input = WindowInput::Legacy {
        target_util: 50.0,
        time_elapsed_pct: 50.0,
    };
    let d = calculate_adaptive_delay(input, &params);
    assert_eq!(d.delay_seconds, 0);
    assert_eq!(d.strategy, Strategy::None);
}

#[test]
fn runaway_short_window_hits_emergency() {
    let params = AdaptiveParams::new(95.0, 1.0)
        .with_window_hours(5.0)
        .with_delays(5, 350);
    let input = WindowInput::Legacy {
        target_util: 50.0,
        time_elapsed_pct: 80.0,
    };
    let d = calculate_adaptive_delay(input, &params);
    assert_eq!(d.delay_seconds, 350);
    assert_eq!(d.strategy, Strategy::Emergency);
    assert!(d.projection.util_if_no_throttle > 115.0);
}

#[test]
fn over_budget_saturday_is_frozen_regardless_of_time_left() {
    for remaining in [0.0, 12.0, 60.0] {
        let params = AdaptiveParams::new(110.0, remaining).with_safety_buffer(95.0);
        let input = WindowInput::Calendar {
            window_start: at(1, 0, 0),
            now: at(6, 9, 30),
        };
        let d = calculate_adaptive_delay(input, &params);
        assert_eq!(d.delay_seconds, params.max_delay);
        assert_eq!(d.strategy, Strategy::Emergency);
    }
}

#[test]
fn no_time_left_is_emergency_even_under_budget() {
    let params = AdaptiveParams::new(5.0, 0.0).with_window_hours(5.0);
    let input = WindowInput::Legacy {
        target_util: 90.0,
        time_elapsed_pct: 100.0,
    };
    let d = calculate_adaptive_delay(input, &params);
    assert_eq!(d.delay_seconds, params.max_delay);
    assert_eq!(d.strategy, Strategy::Emergency);
}

#[test]
fn loose_inputs_without_a_complete_pair_are_rejected() {
    let err = WindowInput::from_parts(Some(40.0), None, None, Some(at(2, 9, 0))).unwrap_err();
    assert!(matches!(err, PacingError::InvalidArguments));
}

// ── Legacy formula ───────────────────────────────────────────────────

#[test]
fn legacy_formula_reference_value() {
    assert_eq!(calculate_delay(2.0, 5, 0.0, 120), 25);
}

// ── Orchestrator ─────────────────────────────────────────────────────

#[test]
fn working_week_progression() {
    // Steady heavy use through the week: the 7-day window should go from
    // unthrottled early on to throttled once usage outpaces the weekday accrual.
    let config = PacingConfig::default();
    let long_resets = at(8, 0, 0);

    let monday = decide(
        &WindowUsage::inactive(),
        &WindowUsage::new(5.0, long_resets),
        &config,
        at(1, 12, 0),
    );
    assert!(!monday.should_throttle, "{monday:?}");

    let thursday = decide(
        &WindowUsage::inactive(),
        &WindowUsage::new(85.0, long_resets),
        &config,
        at(4, 12, 0),
    );
    assert!(thursday.should_throttle, "{thursday:?}");
    assert_eq!(thursday.constrained_window, Some(WindowKind::Long));
    assert!(thursday.delay_seconds <= config.max_delay);

    let sunday = decide(
        &WindowUsage::inactive(),
        &WindowUsage::new(97.0, long_resets),
        &config,
        at(7, 12, 0),
    );
    assert_eq!(sunday.delay_seconds, config.max_delay);
    assert_eq!(sunday.strategy, Some(Strategy::Emergency));
}

#[test]
fn disabling_weekly_limit_leaves_short_window_in_charge() {
    let now = at(4, 12, 0);
    let short = WindowUsage::new(12.0, now + TimeDelta::hours(3));
    let long = WindowUsage::new(98.0, at(8, 0, 0));

    let limited = decide(&short, &long, &PacingConfig::default(), now);
    assert_eq!(limited.constrained_window, Some(WindowKind::Long));
    assert!(limited.should_throttle);

    let unlimited = decide(
        &short,
        &long,
        &PacingConfig::default().with_weekly_limit(false),
        now,
    );
    assert_eq!(unlimited.constrained_window, Some(WindowKind::Short));
    assert!(!unlimited.should_throttle);
}

#[test]
fn status_report_for_throttled_decision() {
    let now = at(2, 13, 0);
    let d = decide(
        &WindowUsage::new(95.0, now + TimeDelta::hours(1)),
        &WindowUsage::inactive(),
        &PacingConfig::default(),
        now,
    );
    let text = StatusReport::new(&d).to_string();
    assert!(text.contains("Next tool use will be delayed by 350s"), "{text}");
}
