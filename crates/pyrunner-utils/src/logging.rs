//! Logging and observability infrastructure for pyrunner
//!
//! Structured logging goes through `tracing`. Binaries call [`init_tracing`]
//! once at startup; library code only emits events and spans.

use tracing::{Level, span};
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

/// Default filter directives when `RUST_LOG` is not set.
fn default_directives(verbose: bool) -> &'static str {
    if verbose {
        "pyrunner=debug,pyrunner_runner=debug,pyrunner_config=debug,info"
    } else {
        "pyrunner=info,pyrunner_runner=info,warn"
    }
}

/// Initialize the tracing subscriber for structured logging.
///
/// Sets up tracing with either compact (default) or verbose format. Verbose
/// format includes targets and span close events carrying the invocation
/// duration. `RUST_LOG` takes precedence over both.
///
/// Log output goes to stderr so captured script output on stdout stays clean.
///
/// # Errors
///
/// Returns an error if a global subscriber was already installed.
pub fn init_tracing(verbose: bool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directives(verbose)))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    if verbose {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_thread_names(false)
                    .with_line_number(false)
                    .with_file(false)
                    .with_span_events(FmtSpan::CLOSE)
                    .compact(),
            )
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_thread_names(false)
                    .with_line_number(false)
                    .with_file(false)
                    .compact(),
            )
            .try_init()?;
    }

    Ok(())
}

/// Create a span for one process invocation with structured fields.
#[must_use]
pub fn invocation_span(program: &str, arg_count: usize, timeout_ms: u128) -> tracing::Span {
    span!(
        Level::INFO,
        "invocation",
        program = %program,
        arg_count = arg_count,
        timeout_ms = %timeout_ms,
    )
}

/// Create a span for one environment bootstrap step.
#[must_use]
pub fn bootstrap_span(step: &str, environment: &str) -> tracing::Span {
    span!(
        Level::INFO,
        "bootstrap_step",
        step = %step,
        environment = %environment,
    )
}
