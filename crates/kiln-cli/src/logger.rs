//! Logging setup for the kiln CLI.
//!
//! The level for kiln's own crates is picked in this order:
//!
//! 1. `--verbose` (debug) or `--quiet` (errors only)
//! 2. `KILN_LOG`, either a bare level or full `EnvFilter` directives
//! 3. `settings.log_level` from the config
//! 4. info
//!
//! Everything outside kiln stays at `warn`. Events go to stderr so the
//! build summary on stdout can be piped.

use kiln_bundler::LogLevel;
use kiln_bundler::logging::LOG_ENV;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const KILN_CRATES: &[&str] = &["kiln_config", "kiln_graph", "kiln_bundler", "kiln_cli"];

/// Install the global subscriber.
///
/// `configured` is `settings.log_level`; it must already have been
/// validated. Calling this twice keeps the first subscriber.
pub fn init_logger(verbose: bool, quiet: bool, no_color: bool, configured: Option<&str>) {
    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_level(true)
        .with_ansi(!no_color)
        .with_writer(std::io::stderr)
        .without_time()
        .compact();

    let _ = tracing_subscriber::registry()
        .with(filter(verbose, quiet, configured))
        .with(fmt_layer)
        .try_init();
}

fn filter(verbose: bool, quiet: bool, configured: Option<&str>) -> EnvFilter {
    if verbose {
        return level_filter(LogLevel::Debug);
    }
    if quiet {
        return level_filter(LogLevel::Error);
    }
    if let Ok(raw) = std::env::var(LOG_ENV) {
        if let Ok(level) = raw.parse::<LogLevel>() {
            return level_filter(level);
        }
        if let Ok(filter) = EnvFilter::try_new(&raw) {
            return filter;
        }
    }
    level_filter(LogLevel::from_setting(configured).unwrap_or_default())
}

fn level_filter(level: LogLevel) -> EnvFilter {
    EnvFilter::new(directives(level))
}

fn directives(level: LogLevel) -> String {
    let base = if level == LogLevel::Silent { "off" } else { "warn" };
    std::iter::once(base.to_string())
        .chain(KILN_CRATES.iter().map(|krate| format!("{krate}={level}")))
        .collect::<Vec<_>>()
        .join(",")
}
