//! Logging setup.

use tracing_subscriber::EnvFilter;

/// Installs the global tracing subscriber.
///
/// `RUST_LOG` takes precedence when set; otherwise the level is `debug` when
/// `verbose` is true and `info` otherwise. With `json` the events are written
/// as JSON lines. Calling this more than once is a no-op.
pub fn init_logging(verbose: bool, json: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    // A subscriber may already be installed by the host application.
    let _ = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}
