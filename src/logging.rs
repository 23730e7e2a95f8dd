//! Logging setup for hosts embedding the agent.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the tracing subscriber.
///
/// Reads `RUST_LOG`; otherwise this crate logs at `info`, or `debug` when
/// `verbose` is set. Output goes to stderr. Calling it again is a no-op.
pub fn init_logging(verbose: bool) {
    let default_filter = if verbose {
        "mobile_use=debug"
    } else {
        "mobile_use=info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .try_init();
}
