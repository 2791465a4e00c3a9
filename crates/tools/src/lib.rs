//! Probe Tools
//!
//! CLI tools for working with protocol descriptions.

use tracing_subscriber::{fmt, EnvFilter};

/// Initialize logging with a default filter.
///
/// Use `RUST_LOG` environment variable to override the default filter.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,probe_codegen=debug,probe_schema=debug"));

    fmt().with_env_filter(filter).with_target(false).init();
}
