//! Evaluate a pacing decision from the command line.
//!
//! Usage figures come from flags (typically filled in by whatever polls the
//! usage API); settings come from an optional JSON config file and can be
//! overridden per run. The tool only reports the decision; it never sleeps.
//!
//! # Examples
//!
//! ```sh
//! # Both windows, status text
//! pacemaker --short-util 42 --short-resets-at 2024-01-03T15:00:00Z \
//!   --long-util 31.5 --long-resets-at 2024-01-08T00:00:00Z
//!
//! # Reproduce a decision at a fixed instant, as JSON
//! pacemaker --config ~/.pacemaker/config.json --short-util 95 \
//!   --short-resets-at 2024-01-02T14:00:00Z --now 2024-01-02T13:00:00Z --json
//!
//! # Legacy curves, 7-day window ignored
//! pacemaker --legacy --no-weekly-limit --short-util 70 \
//!   --short-resets-at 2024-01-02T14:30:00Z
//! ```

use chrono::{DateTime, Utc};
use clap::Parser;
use pacemaker::prelude::*;
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

/// Evaluate a pacing decision for the 5-hour and 7-day usage windows.
#[derive(Parser)]
#[command(name = "pacemaker")]
struct Cli {
    /// Path to a JSON config file (missing file = defaults)
    #[arg(long)]
    config: Option<PathBuf>,

    // ── Usage ──────────────────────────────────────────────────
    /// Current 5-hour utilization (%)
    #[arg(long, allow_negative_numbers = true)]
    short_util: Option<f64>,

    /// When the 5-hour window resets (RFC 3339)
    #[arg(long, value_parser = parse_instant)]
    short_resets_at: Option<DateTime<Utc>>,

    /// Current 7-day utilization (%)
    #[arg(long, allow_negative_numbers = true)]
    long_util: Option<f64>,

    /// When the 7-day window resets (RFC 3339)
    #[arg(long, value_parser = parse_instant)]
    long_resets_at: Option<DateTime<Utc>>,

    /// Evaluate at this instant instead of the current time (RFC 3339)
    #[arg(long, value_parser = parse_instant)]
    now: Option<DateTime<Utc>>,

    // ── Overrides ──────────────────────────────────────────────
    /// Use the legacy logarithmic/linear curves and proportional delay
    #[arg(long)]
    legacy: bool,

    /// Ignore the 7-day window
    #[arg(long)]
    no_weekly_limit: bool,

    /// Override the safety buffer percentage
    #[arg(long)]
    safety_buffer: Option<f64>,

    /// Override the 7-day preload hours
    #[arg(long)]
    preload_hours: Option<f64>,

    // ── Output ─────────────────────────────────────────────────
    /// Print the decision as JSON
    #[arg(long)]
    json: bool,

    /// Log decision details to stderr
    #[arg(long, short)]
    verbose: bool,
}

fn parse_instant(s: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| format!("invalid RFC 3339 timestamp '{s}': {e}"))
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(cli: &Cli) -> Result<PacingConfig, String> {
    let mut config = match &cli.config {
        Some(path) => PacingConfig::load_or_default(path).map_err(|e| e.to_string())?,
        None => PacingConfig::default(),
    };

    if cli.legacy {
        config = config.with_adaptive(false);
    }
    if cli.no_weekly_limit {
        config = config.with_weekly_limit(false);
    }
    if let Some(pct) = cli.safety_buffer {
        config = config.with_safety_buffer(pct);
    }
    if let Some(h) = cli.preload_hours {
        config = config.with_preload_hours(h);
    }

    config.validate().map_err(|e| e.to_string())?;
    Ok(config)
}

fn run(cli: &Cli) -> Result<String, String> {
    let config = load_config(cli)?;

    if !config.enabled {
        return Ok(StatusReport::inactive().to_string());
    }

    let sample = UsageSample {
        short: WindowUsage {
            utilization: cli.short_util,
            resets_at: cli.short_resets_at,
        },
        long: WindowUsage {
            utilization: cli.long_util,
            resets_at: cli.long_resets_at,
        },
        as_of: cli.now.unwrap_or_else(Utc::now),
    };

    let decision = decide_sample(&sample, &config);

    if cli.json {
        serde_json::to_string_pretty(&decision)
            .map_err(|e| format!("failed to serialize decision: {e}"))
    } else {
        Ok(StatusReport::new(&decision).to_string())
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(&cli) {
        Ok(output) => println!("{output}"),
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }
}
