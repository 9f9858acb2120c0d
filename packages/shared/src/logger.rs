//! Logging setup based on `tracing-subscriber`.

use tracing_subscriber::EnvFilter;

/// Initialize the global tracing subscriber.
///
/// `RUST_LOG` takes precedence when set; otherwise the given binary name
/// (dashes normalized to underscores, as in tracing targets) is filtered
/// at `default_level` and `tower_http` at `info`.
pub fn setup_logger(bin_name: &str, default_level: &str) {
    let target = bin_name.replace('-', "_");
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("{target}={default_level},tower_http=info"))
    });

    tracing_subscriber::fmt().with_env_filter(filter).init();
}
