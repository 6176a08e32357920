//! Human-readable pace status.
//!
//! [`StatusReport`] renders a [`WindowedDecision`] the way a user sees it from
//! the `pacemaker` CLI: current usage per window, the target pace of the
//! constrained window and whether the next operation will be delayed.

use std::fmt;

use crate::pacing::{WindowKind, WindowedDecision};

/// Display adapter for a pacing decision.
pub struct StatusReport<'a> {
    decision: Option<&'a WindowedDecision>,
}

impl<'a> StatusReport<'a> {
    /// Report for an active pacemaker.
    pub fn new(decision: &'a WindowedDecision) -> Self {
        Self {
            decision: Some(decision),
        }
    }

    /// Report for a disabled pacemaker; only the header is shown.
    pub fn inactive() -> Self {
        Self { decision: None }
    }
}

fn pace_word(deviation: f64) -> &'static str {
    if deviation < 0.0 { "ahead" } else { "behind" }
}

impl fmt::Display for StatusReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(d) = self.decision else {
            return write!(f, "Pace Maker: INACTIVE");
        };

        write!(f, "Pace Maker: ACTIVE")?;

        let short_util = d.short.utilization;
        // A 7-day window at zero usage is how accounts without a weekly cap report.
        let long_util = d.long.utilization.filter(|u| *u > 0.0);

        if short_util.is_none() && long_util.is_none() {
            return write!(f, "\n\nNo usage data available yet.");
        }

        write!(f, "\n\nCurrent Usage:")?;
        if let Some(u) = short_util {
            write!(f, "\n  5-hour window: {u:.1}% used")?;
        }
        if let Some(u) = long_util {
            write!(f, "\n  7-day window: {u:.1}% used")?;
        }

        write!(f, "\n\nPacing Status:")?;
        let deviation = d.deviation_percent;
        match d.constrained_window {
            Some(WindowKind::Short) => {
                write!(
                    f,
                    "\n  Target pace: {:.1}% (should be at this point)",
                    d.short.target
                )?;
                write!(f, "\n  Deviation: {deviation:+.1}% ({} pace)", pace_word(deviation))?;
            }
            Some(WindowKind::Long) => {
                write!(f, "\n  Most constrained: 7-day window")?;
                write!(f, "\n  Target pace: {:.1}%", d.long.target)?;
                write!(f, "\n  Deviation: {deviation:+.1}% ({} pace)", pace_word(deviation))?;
            }
            None => {}
        }

        if d.should_throttle {
            write!(
                f,
                "\n\nNext tool use will be delayed by {}s to maintain pace",
                d.delay_seconds
            )?;
            if let Some(p) = &d.projection {
                write!(f, "\n  Safe threshold: {:.1}%", p.safe_allowance)?;
                write!(f, "\n  Safety buffer remaining: {:+.1}%", p.buffer_remaining)?;
            }
        } else {
            write!(f, "\n\nOn pace - no throttling needed")?;
            if let Some(p) = &d.projection {
                write!(f, "\n  Safety buffer remaining: {:+.1}%", p.buffer_remaining)?;
            }
        }

        Ok(())
    }
}
