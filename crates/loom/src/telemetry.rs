//! Console logging setup.

use tracing_subscriber::EnvFilter;

/// Install a stderr fmt subscriber filtered by `directive`.
///
/// An unparseable directive falls back to `info` with a warning.
pub fn init(directive: &str) {
    let (filter, rejected) = match EnvFilter::try_new(directive) {
        Ok(filter) => (filter, None),
        Err(e) => (EnvFilter::new("info"), Some(e)),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    if let Some(e) = rejected {
        tracing::warn!(directive, error = %e, "invalid log filter, using info");
    }
}
