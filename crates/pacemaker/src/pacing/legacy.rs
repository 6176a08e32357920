//! Proportional delay formula used when adaptive pacing is off.
//!
//! `delay = base_delay * (1 + 2 * excess)` where `excess` is how many
//! percentage points the deviation exceeds the threshold. With the default
//! threshold of 0, throttling starts the moment usage crosses the target.

/// Lower bound applied to any non-zero legacy delay.
pub const LEGACY_MIN_DELAY: u32 = 5;

/// Delay cap of the standalone legacy formula.
pub const LEGACY_MAX_DELAY: u32 = 120;

/// Delay in seconds for a deviation above target.
///
/// Returns 0 when `deviation_pct <= threshold_pct`; otherwise the proportional
/// delay floored to whole seconds and clamped to `[5, max_delay]`.
pub fn calculate_delay(
    deviation_pct: f64,
    base_delay: u32,
    threshold_pct: f64,
    max_delay: u32,
) -> u32 {
    if deviation_pct <= threshold_pct {
        return 0;
    }

    let excess = deviation_pct - threshold_pct;
    let delay = base_delay as f64 * (1.0 + 2.0 * excess);

    delay.min(max_delay as f64).max(LEGACY_MIN_DELAY as f64) as u32
}
