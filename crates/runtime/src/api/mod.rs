//! Public prover API surface.
//!
//! This module gathers the types exposed to consumers of the runtime crate so
//! other layers can stay focused on worker plumbing and timeouts.

pub mod errors;
pub mod handle;
pub mod prover;

pub use errors::{HostError, Result};
pub use handle::ProverHandle;
pub use prover::ProverApi;
