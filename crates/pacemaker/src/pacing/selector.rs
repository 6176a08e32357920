//! Most-constrained window selection.

use serde::Serialize;
use std::fmt;

/// Which of the two rate-limit windows a value refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum WindowKind {
    /// The 5-hour window.
    #[serde(rename = "5-hour")]
    Short,
    /// The 7-day window.
    #[serde(rename = "7-day")]
    Long,
}

impl fmt::Display for WindowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WindowKind::Short => write!(f, "5-hour"),
            WindowKind::Long => write!(f, "7-day"),
        }
    }
}

/// Outcome of [`select_constrained_window`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ConstrainedWindow {
    /// The selected window, or `None` when both windows are inactive.
    pub window: Option<WindowKind>,
    /// Utilization minus target for the selected window, in percentage points.
    pub deviation: f64,
}

/// Pick the window whose utilization is furthest above its target.
///
/// An absent utilization marks that window inactive. With both windows active
/// the larger deviation wins and an exact tie goes to the short window.
pub fn select_constrained_window(
    short_util: Option<f64>,
    short_target: f64,
    long_util: Option<f64>,
    long_target: f64,
) -> ConstrainedWindow {
    let short = short_util.map(|u| u - short_target);
    let long = long_util.map(|u| u - long_target);

    let (window, deviation) = match (short, long) {
        (None, None) => (None, 0.0),
        (Some(s), None) => (Some(WindowKind::Short), s),
        (None, Some(l)) => (Some(WindowKind::Long), l),
        (Some(s), Some(l)) if s >= l => (Some(WindowKind::Short), s),
        (Some(_), Some(l)) => (Some(WindowKind::Long), l),
    };

    ConstrainedWindow { window, deviation }
}
