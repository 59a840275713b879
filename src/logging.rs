// Tracing subscriber setup

use tracing_subscriber::EnvFilter;

/// Log to stderr so PNG and CSV output on stdout stays clean. `RUST_LOG`
/// overrides the default `warn` filter.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
