//! Logging setup. Events go to stderr, as JSON lines when configured.
//!
//! TODO: Open a request-scoped span carrying the dataset name in `Registry::read` and `register`.

use tracing_subscriber::EnvFilter;

use crate::common::config::AppCfg;

/// Install the global subscriber. Safe to call more than once; later calls are ignored.
pub fn init(cfg: &AppCfg) {
    let filter = EnvFilter::try_new(&cfg.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    let result = if cfg.log_json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .try_init()
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .try_init()
    };

    if result.is_ok() {
        tracing::debug!(level = %cfg.log_level, json = cfg.log_json, "logging initialised");
    }
}
