//! Time-window allowance arithmetic.
//!
//! An *allowance* is the share of a window's budget that may have been consumed
//! by a given instant. Two accrual models are supported:
//!
//! - [`AccrualModel::Continuous`] — the ceiling rises uniformly over all
//!   calendar time. Used for the 5-hour window.
//! - [`AccrualModel::WeekdayAware`] — the ceiling only rises Monday through
//!   Friday and stays flat across Saturday and Sunday. Used for the 7-day
//!   window.
//!
//! Both models support a *preload*: a flat plateau granted for the first N
//! (weekday) hours of the window before accrual takes over.
//!
//! The two legacy curves, [`logarithmic_target`] and [`linear_target`], map an
//! elapsed-time percentage straight to a target and are used when adaptive
//! pacing is switched off.
//!
//! Every function here is pure. Callers pass `now` explicitly so one decision
//! samples the clock exactly once.

use chrono::{DateTime, Datelike, Days, NaiveTime, TimeDelta, Utc, Weekday};
use serde::Serialize;

const SECONDS_PER_HOUR: f64 = 3600.0;

/// Convert fractional hours into a [`TimeDelta`] with microsecond resolution.
pub fn hours(h: f64) -> TimeDelta {
    TimeDelta::microseconds((h * SECONDS_PER_HOUR * 1_000_000.0).round() as i64)
}

/// Signed length of `delta` in fractional seconds.
fn secs_f64(delta: TimeDelta) -> f64 {
    delta.num_milliseconds() as f64 / 1000.0
}

/// Whether `t` falls on a Saturday or Sunday (UTC).
pub fn is_weekend(t: DateTime<Utc>) -> bool {
    matches!(t.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Count the seconds in `[start, end)` that fall on a weekday.
///
/// Walks the range one calendar day at a time, clipping each segment at the
/// next midnight (or `end`), and only counts segments that start on Monday
/// through Friday. Returns 0 when `start >= end`.
pub fn weekday_seconds(start: DateTime<Utc>, end: DateTime<Utc>) -> i64 {
    if start >= end {
        return 0;
    }

    let mut total = 0;
    let mut current = start;

    while current < end {
        let next_midnight = (current.date_naive() + Days::new(1))
            .and_time(NaiveTime::MIN)
            .and_utc();
        let segment_end = next_midnight.min(end);

        if !is_weekend(current) {
            total += (segment_end - current).num_seconds();
        }

        current = segment_end;
    }

    total
}

/// Allowance for a window that accrues 24/7.
///
/// Elapsed time is clamped to `[0, window_hours]`. While the elapsed hours are
/// within `preload_hours`, the allowance sits on a flat plateau of
/// `preload_hours / window_hours * 100`; afterwards it is the plain linear
/// fraction of the window that has passed.
pub fn continuous_allowance_pct(
    window_start: DateTime<Utc>,
    now: DateTime<Utc>,
    window_hours: f64,
    preload_hours: f64,
) -> f64 {
    let window_secs = window_hours * SECONDS_PER_HOUR;
    let elapsed = secs_f64(now - window_start).clamp(0.0, window_secs);

    if preload_hours > 0.0 && elapsed / SECONDS_PER_HOUR <= preload_hours {
        return preload_hours / window_hours * 100.0;
    }

    elapsed / window_secs * 100.0
}

/// Allowance for a window whose budget only accrues on weekdays.
///
/// The percentage climbs with elapsed weekday seconds and is frozen across
/// weekends. A window containing no weekday seconds at all is fully available
/// (100%).
///
/// `now` is deliberately not clamped to the window end: evaluating past the
/// nominal end yields values above 100.
pub fn weekday_aware_allowance_pct(
    window_start: DateTime<Utc>,
    now: DateTime<Utc>,
    window_hours: f64,
    preload_hours: f64,
) -> f64 {
    let window_end = window_start + hours(window_hours);
    let total = weekday_seconds(window_start, window_end);
    if total == 0 {
        return 100.0;
    }

    let elapsed = weekday_seconds(window_start, now);
    let total_hours = total as f64 / SECONDS_PER_HOUR;

    if preload_hours > 0.0 && elapsed as f64 / SECONDS_PER_HOUR <= preload_hours {
        preload_hours / total_hours * 100.0
    } else if preload_hours <= 0.0 && now <= window_start {
        0.0
    } else {
        elapsed as f64 / total as f64 * 100.0
    }
}

/// Legacy 5-hour target curve: `100 * ln(1 + t * (e - 1))` for `t` in `[0, 1]`.
///
/// Front-loads the allowance so more usage is permitted early in the window.
pub fn logarithmic_target(time_pct: f64) -> f64 {
    if time_pct <= 0.0 {
        return 0.0;
    }
    if time_pct >= 100.0 {
        return 100.0;
    }

    let fraction = time_pct / 100.0;
    100.0 * (1.0 + fraction * (std::f64::consts::E - 1.0)).ln()
}

/// Legacy 7-day target curve: the elapsed percentage itself, clamped to `[0, 100]`.
pub fn linear_target(time_pct: f64) -> f64 {
    time_pct.clamp(0.0, 100.0)
}

/// Percentage of a window that has elapsed, derived from its reset instant.
///
/// An absent `resets_at` means the window is inactive and yields 0. A reset
/// instant at or before `now` yields 100.
pub fn elapsed_pct_from_reset(
    resets_at: Option<DateTime<Utc>>,
    window_hours: f64,
    now: DateTime<Utc>,
) -> f64 {
    let Some(resets_at) = resets_at else {
        return 0.0;
    };

    let remaining = secs_f64(resets_at - now);
    if remaining <= 0.0 {
        return 100.0;
    }

    let window_secs = window_hours * SECONDS_PER_HOUR;
    ((window_secs - remaining) / window_secs * 100.0).clamp(0.0, 100.0)
}

// ── Window value types ─────────────────────────────────────────────

/// How a window's allowance accrues over time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AccrualModel {
    /// Uniform accrual over all calendar time.
    Continuous,
    /// Accrual on Monday–Friday only; frozen over weekends.
    WeekdayAware,
}

/// A rate-limit window, rebuilt from its reset instant for every decision.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RateWindow {
    pub window_start: DateTime<Utc>,
    pub window_hours: f64,
    pub preload_hours: f64,
    pub accrual: AccrualModel,
}

/// Raw allowance and the allowance after applying the safety buffer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Allowance {
    pub raw_pct: f64,
    pub safe_pct: f64,
}

impl Allowance {
    pub fn new(raw_pct: f64, safety_buffer_pct: f64) -> Self {
        Self {
            raw_pct,
            safe_pct: raw_pct * safety_buffer_pct / 100.0,
        }
    }
}

impl RateWindow {
    /// Build the window that ends at `resets_at` and spans `window_hours`.
    pub fn ending_at(
        resets_at: DateTime<Utc>,
        window_hours: f64,
        preload_hours: f64,
        accrual: AccrualModel,
    ) -> Self {
        Self {
            window_start: resets_at - hours(window_hours),
            window_hours,
            preload_hours,
            accrual,
        }
    }

    /// Nominal end of the window (its reset instant).
    pub fn window_end(&self) -> DateTime<Utc> {
        self.window_start + hours(self.window_hours)
    }

    /// Hours until the window resets, floored at zero.
    pub fn hours_remaining(&self, now: DateTime<Utc>) -> f64 {
        (secs_f64(self.window_end() - now) / SECONDS_PER_HOUR).max(0.0)
    }

    /// Allowance percentage at `now` under this window's accrual model.
    pub fn allowance_pct(&self, now: DateTime<Utc>) -> f64 {
        match self.accrual {
            AccrualModel::Continuous => continuous_allowance_pct(
                self.window_start,
                now,
                self.window_hours,
                self.preload_hours,
            ),
            AccrualModel::WeekdayAware => weekday_aware_allowance_pct(
                self.window_start,
                now,
                self.window_hours,
                self.preload_hours,
            ),
        }
    }

    pub fn allowance(&self, now: DateTime<Utc>, safety_buffer_pct: f64) -> Allowance {
        Allowance::new(self.allowance_pct(now), safety_buffer_pct)
    }
}
