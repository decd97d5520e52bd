//! # Structured Logging
//!
//! Initializes the `tracing` subscriber with configurable format (JSON or
//! pretty-printed) and environment-based filtering via `RUST_LOG`.
//!
//! All log output is written to stderr. `courier seal` and `courier open`
//! write envelopes and plaintext to stdout when no output file is given,
//! and log lines must never end up mixed into those.

use clap::ValueEnum;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Log output format.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable, colored output. Suitable for interactive use.
    #[default]
    Pretty,
    /// Machine-parseable JSON lines. Suitable for log aggregation.
    Json,
}

/// Initialize the global tracing subscriber.
///
/// Call this exactly once, early in `main()`. Subsequent calls will panic.
///
/// # Arguments
///
/// * `default_level` - The default log level when `RUST_LOG` is not set.
///   Typical values: `"warn"`, `"info"`, `"courier=debug,courier_protocol=trace"`.
/// * `format` - Output format (JSON or pretty-printed).
///
/// # Environment
///
/// The `RUST_LOG` environment variable overrides `default_level` when set.
/// Syntax follows the `tracing_subscriber::EnvFilter` directives, e.g.:
///
/// ```text
/// RUST_LOG=courier=info,courier_protocol=debug
/// ```
pub fn init_logging(default_level: &str, format: LogFormat) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    match format {
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    fmt::layer()
                        .with_writer(std::io::stderr)
                        .with_target(true)
                        .with_file(true)
                        .with_line_number(true),
                )
                .init();
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    fmt::layer()
                        .json()
                        .with_writer(std::io::stderr)
                        .with_target(true),
                )
                .init();
        }
    }

    tracing::debug!(?format, "logging initialized");
}
