//! Tracing setup.
//!
//! Library code only emits spans and events; installing a subscriber is the
//! application's choice. [`init`] is a convenience for binaries and
//! examples: fmt output filtered by `RUST_LOG` (default `info`), installed
//! at most once.

use std::sync::Once;
use tracing_subscriber::{fmt, EnvFilter};

static INIT: Once = Once::new();

pub fn init() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("info"));
        fmt().with_env_filter(filter).init();
    });
}
