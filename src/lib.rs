//! OasisX: order signing and contract tooling for the OasisX exchange.
//!
//! This is the root crate that provides benchmark and integration test access.
//! For actual functionality, use the individual crates directly:
//!
//! - `oasisx-core`: typed-data hashing, order signing, contract bindings,
//!   deployment helpers and test utilities
//! - `deployer`: the `deploy` migration binary

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// Re-export for benchmarks and tests
pub use oasisx_core as core;

/// Install a `tracing` subscriber for test runs. Safe to call more than once.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "oasisx_core=debug,oasisx=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_test_writer())
        .try_init();
}
