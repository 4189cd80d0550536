//! Logger setup. Logs go to stderr so stdout carries only events.

use tracing_subscriber::EnvFilter;

/// Install the global subscriber. `RUST_LOG` wins over `default_filter`.
pub fn setup_logger(default_filter: &str, json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}
