//! HTTP API for the phenotype NLP and governance auditor services.
//!
//! Each service gets its own composable `Router`; the binaries mount one
//! each. Errors share a single JSON shape (see [`ErrorBody`]).

pub mod auditor;
mod error;
pub mod phenotype;

pub use error::*;
