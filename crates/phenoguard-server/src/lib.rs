//! PhenoGuard HTTP services.
//!
//! Two axum services sit on top of the core libraries:
//!
//! - `phenotype-nlp`: VTE extraction for single notes and background batches
//!   ([`api::phenotype`])
//! - `governance-auditor`: visual PII audit of uploaded document pages
//!   ([`api::auditor`])

pub mod api;
pub mod config;

pub use config::ServiceConfig;

use tracing_subscriber::EnvFilter;

/// Log filter used when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str =
    "warn,phenoguard_core=info,phenoguard_vlm=info,phenoguard_server=info";

/// Install the global `tracing` subscriber.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
