//! Test support: one global tracing subscriber per test binary.
//!
//! Output goes to stderr at `RUST_LOG` (default `trace`, so per-node and
//! per-dispatch events of the collection types are visible). Events whose
//! target starts with `config::` are dropped: building the environment layer
//! of `Settings` makes the config crate trace every variable it scans.

use std::env;
use std::sync::Once;
use tracing::{debug, info};
use tracing_subscriber::{
    filter::filter_fn,
    fmt::{self, format::FmtSpan},
    prelude::*,
    EnvFilter,
};

static TEST_SETUP: Once = Once::new();

/// Targets excluded from test output.
const SILENCED_TARGETS: &[&str] = &["config::"];

/// Installs the test subscriber once; later calls are no-ops.
///
/// Call it first in every test so output does not depend on test order.
pub fn init_test_setup() {
    TEST_SETUP.call_once(|| {
        if env::var("RUST_LOG").is_err() {
            env::set_var("RUST_LOG", "trace");
        }
        install_subscriber();
        info!("Test Setup complete");
    });
}

fn install_subscriber() {
    let silenced = filter_fn(|metadata| {
        !SILENCED_TARGETS
            .iter()
            .any(|prefix| metadata.target().starts_with(prefix))
    });

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));

    // Span close events carry the duration of each instrumented operation
    let subscriber = tracing_subscriber::registry().with(
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_span_events(FmtSpan::CLOSE)
            .with_filter(silenced)
            .with_filter(env_filter),
    );

    if tracing::dispatcher::has_been_set() {
        debug!("Tracing subscriber already set");
    } else if let Err(e) = subscriber.try_init() {
        eprintln!("Error: Failed to set up logging: {}", e);
    }
}
