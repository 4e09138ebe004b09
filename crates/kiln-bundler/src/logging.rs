//! Subscriber setup for binaries embedding kiln.
//!
//! Only compiled with the `logging` feature. The library itself just emits
//! `tracing` events; applications that want them printed call one of the
//! `init_*` functions once at startup.

use std::sync::Once;

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Environment variable consulted by [`init_logging_from_env`].
pub const LOG_ENV: &str = "KILN_LOG";

/// Crates whose events the default filter lets through.
const KILN_TARGETS: &[&str] = &["kiln_config", "kiln_graph", "kiln_bundler", "kiln_cli"];

static INIT: Once = Once::new();

/// Verbosity of kiln's own events
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Silent,
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    /// Per-reference resolution and scanning detail
    Trace,
}

impl LogLevel {
    fn directive(self) -> &'static str {
        match self {
            LogLevel::Silent => "off",
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }

    /// Level from the `settings.log_level` config value, `Info` when unset.
    pub fn from_setting(value: Option<&str>) -> Result<Self, String> {
        value.map_or(Ok(LogLevel::Info), str::parse)
    }

    /// Filter that applies this level to kiln crates and `warn` to the rest.
    fn filter(self) -> EnvFilter {
        let mut spec = String::from(if self == LogLevel::Silent { "off" } else { "warn" });
        for target in KILN_TARGETS {
            spec.push_str(&format!(",{target}={}", self.directive()));
        }
        EnvFilter::new(spec)
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "silent" | "off" | "none" => Ok(LogLevel::Silent),
            "error" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            other => Err(format!("unknown log level '{other}'")),
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.directive())
    }
}

fn install(filter: EnvFilter) {
    INIT.call_once(|| {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact().with_target(false).without_time())
            .init();
    });
}

/// Print kiln events at `level` to stderr.
///
/// Installs a global subscriber; calls after the first are ignored.
///
/// ```rust,no_run
/// use kiln_bundler::logging::{init_logging, LogLevel};
///
/// init_logging(LogLevel::Debug);
/// ```
pub fn init_logging(level: LogLevel) {
    install(level.filter());
}

/// Like [`init_logging`], with the filter taken from `KILN_LOG`.
///
/// `KILN_LOG` accepts either a bare level (`debug`) or full `EnvFilter`
/// directives (`kiln_graph=trace,warn`). Unset or unparsable values fall
/// back to `Info`.
pub fn init_logging_from_env() {
    let filter = match std::env::var(LOG_ENV) {
        Ok(raw) => match raw.parse::<LogLevel>() {
            Ok(level) => level.filter(),
            Err(_) => EnvFilter::try_new(&raw).unwrap_or_else(|_| LogLevel::Info.filter()),
        },
        Err(_) => LogLevel::Info.filter(),
    };
    install(filter);
}
