//! Logging setup for specwizard.
//!
//! Wraps `tracing-subscriber` so the binary and tests share one way of
//! turning CLI verbosity into a filter.

use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Target of the facet query builder, which logs on every toggle.
const QUERY_TARGET: &str = "specwizard::facet::query";

/// Targets that make up this program: the library and the `specwiz` binary.
const TARGETS: [&str; 2] = ["specwizard", "specwiz"];

/// Verbosity level for logging output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// Suppress all output except errors.
    Quiet,
    /// Normal output level (info and above).
    #[default]
    Normal,
    /// Verbose output (debug and above), without the per-toggle query log.
    Verbose,
    /// Everything, including each generated facet query.
    Trace,
}

impl Verbosity {
    /// Map the `-q` flag and the number of `-v` flags to a verbosity.
    ///
    /// `quiet` wins over any number of `-v`.
    #[must_use]
    pub fn from_flags(verbose: u8, quiet: bool) -> Self {
        match (quiet, verbose) {
            (true, _) => Self::Quiet,
            (false, 0) => Self::Normal,
            (false, 1) => Self::Verbose,
            (false, _) => Self::Trace,
        }
    }

    /// Convert verbosity to a tracing level.
    #[must_use]
    pub fn to_level_filter(&self) -> Level {
        match self {
            Self::Quiet => Level::ERROR,
            Self::Normal => Level::INFO,
            Self::Verbose => Level::DEBUG,
            Self::Trace => Level::TRACE,
        }
    }

    /// Filter directives for this verbosity, e.g. `specwizard=info,specwiz=info`.
    #[must_use]
    pub fn directives(&self) -> String {
        let level = self.to_level_filter();
        let mut directives: Vec<String> = TARGETS.iter().map(|t| format!("{t}={level}")).collect();
        if *self == Self::Verbose {
            directives.push(format!("{QUERY_TARGET}={}", Level::INFO));
        }
        directives.join(",")
    }
}

/// Build the filter: `RUST_LOG`-style `env` directives when given and valid,
/// otherwise the directives for `verbosity`.
fn build_filter(verbosity: Verbosity, env: Option<&str>) -> EnvFilter {
    env.and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(verbosity.directives()))
}

/// Initialize the logging system.
///
/// Call once at startup. `RUST_LOG` takes precedence over `verbosity`.
/// Log lines go to stderr so they never mix with rendered results.
///
/// # Examples
///
/// ```no_run
/// use specwizard::{init_logging, logging::Verbosity};
///
/// init_logging(Verbosity::Verbose);
/// ```
pub fn init_logging(verbosity: Verbosity) {
    let env = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let env_filter = build_filter(verbosity, env.as_deref());

    let subscriber = tracing_subscriber::registry().with(env_filter).with(
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false),
    );

    // Already set is fine (tests call this repeatedly)
    let _ = subscriber.try_init();
}

/// Initialize logging for tests.
///
/// Only warnings and errors, routed through the test writer.
#[cfg(test)]
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("warn")
        .with_test_writer()
        .try_init();
}
