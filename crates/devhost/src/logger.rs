//! Logging infrastructure for devhost.
//!
//! Structured logging on top of `tracing`. Lifecycle events (port fallback,
//! compile status, server readiness) are emitted as tracing events with
//! fields, so hosts embedding the library can route them through their own
//! subscriber; the binary installs a compact formatter.
//!
//! # Example
//!
//! ```rust,no_run
//! use devhost::logger::init_logger;
//! use tracing::info;
//!
//! init_logger(false, false, false);
//! info!(port = 6002, "dev server listening");
//! ```

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const VERBOSE_FILTER: &str = "devhost=debug,devhost_config=debug";
const QUIET_FILTER: &str = "devhost=error,devhost_config=error";
const DEFAULT_FILTER: &str = "devhost=info,devhost_config=info";

/// Initialize the tracing subscriber.
///
/// The filter is picked in this order:
/// 1. `verbose`: DEBUG for devhost crates
/// 2. `quiet`: ERROR only
/// 3. `RUST_LOG`
/// 4. INFO for devhost crates
///
/// Log lines go to stderr. Calling it twice is harmless; the second call
/// leaves the first subscriber in place.
pub fn init_logger(verbose: bool, quiet: bool, no_color: bool) {
    let filter = if verbose {
        EnvFilter::new(VERBOSE_FILTER)
    } else if quiet {
        EnvFilter::new(QUIET_FILTER)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
    };

    // stdout may be the parent channel
    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true)
        .with_ansi(!no_color)
        .compact();

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}
