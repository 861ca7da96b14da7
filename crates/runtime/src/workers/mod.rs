//! Prover backends behind [`crate::ProverApi`].
//!
//! The worker runs proofs on a dedicated thread, while the inline prover is
//! the fallback when no such thread is available.

mod inline;
mod metrics;
mod prover;

pub use inline::InlineProver;
pub use metrics::{MetricsSnapshot, ProofMetrics};
pub use prover::{Command, ProverWorker};
