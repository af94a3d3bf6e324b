//! Diagnostic logging on stderr.
//!
//! The filter comes from `IPTV_TOOLS_LOG` (same syntax as `RUST_LOG`).
//! Without it this crate logs at info and everything else at warn;
//! `--verbose` raises this crate to debug.

use crate::config::ENV_LOG;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

pub fn default_filter(verbose: bool) -> &'static str {
    if verbose {
        "iptv_tools=debug,warn"
    } else {
        "iptv_tools=info,warn"
    }
}

pub fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_env(ENV_LOG)
        .unwrap_or_else(|_| EnvFilter::new(default_filter(verbose)));

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    // A subscriber may already be installed when embedded in tests.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}
