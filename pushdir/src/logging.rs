//! Diagnostic tracing for pushdir.
//!
//! Tracing is for debugging the tool itself and goes to stderr. The console
//! text users read (banners, git output, hints) comes from `report` and the
//! git wrapper and is printed regardless of the filter set here.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global subscriber.
///
/// `RUST_LOG` wins when set. Otherwise the level is `warn`, or `debug` for this
/// crate when `verbose` is true.
///
/// # Example
/// ```bash
/// RUST_LOG=pushdir=trace pushdir --path ./site
/// ```
pub fn init(verbose: bool) {
    let fallback = if verbose { "warn,pushdir=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(verbose)
                .compact(),
        )
        .init();
}
