//! Testing utilities for reform
//!
//! - [`Deferred`]: validation results resolved by hand, in any order, to
//!   exercise obsolete passes.
//! - [`HookRecorder`]: records hook invocations and checks how often they
//!   happened.
//! - [`init_tracing`]: route `tracing` output to the test harness.

pub mod deferred;
pub mod recorder;

pub use deferred::Deferred;
pub use recorder::{HookRecorder, Times};

use tracing_subscriber::EnvFilter;

/// Install a test-friendly subscriber filtered by `RUST_LOG` (default
/// `warn`). Safe to call from every test.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}
