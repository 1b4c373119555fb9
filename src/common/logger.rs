//! Tracing subscriber bootstrap.
//!
//! The verbosity comes from `RUST_LOG` when set, otherwise from the
//! `[logging]` section of the configuration. The `log` bridge is pinned to
//! errors either way so bridged crates stay quiet.

use tracing_subscriber::EnvFilter;

use crate::config::Config;

pub fn init(config: &Config) {
    let log_level = config
        .logging
        .as_ref()
        .and_then(|l| l.level.as_deref())
        .unwrap_or("info");

    let filters = config
        .logging
        .as_ref()
        .and_then(|l| l.filters.as_deref())
        .unwrap_or("");

    let filter_str = if filters.is_empty() {
        format!("{},log=error", log_level)
    } else {
        format!("{},log=error,{}", log_level, filters)
    };

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter_str));

    tracing_subscriber::fmt().with_env_filter(env_filter).init();
}
