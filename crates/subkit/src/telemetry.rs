//! Tracing subscriber bootstrap.

use std::sync::Once;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry, fmt};

static INIT: Once = Once::new();

/// Install a `fmt` subscriber filtered by `RUST_LOG`, falling back to
/// `default_directive` (e.g. `"info"` or `"subkit_archive=debug"`).
///
/// Safe to call more than once; only the first call installs a subscriber and
/// an already-installed global subscriber is left in place.
pub fn init(default_directive: &str) {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_directive));

        if Registry::default().with(filter).with(fmt::layer()).try_init().is_err() {
            tracing::debug!("global tracing subscriber already installed");
        }
    });
}
