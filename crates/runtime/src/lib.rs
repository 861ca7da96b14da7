//! Prover host for the secret-word proof runtime.
//!
//! This crate keeps proof computation off the interactive path. Consumers
//! embed a [`ProverHost`] and call the two [`ProverApi`] operations; the host
//! decides whether a background worker or the inline fallback serves them.
//!
//! Modules are organized by responsibility:
//! - [`host`] owns the live runtime, applies timeouts and resets
//! - [`api`] exposes the types downstream clients interact with
//! - [`config`] loads host settings from the environment
//! - `workers` keeps the worker thread and inline fallback internal to the crate
pub mod api;
pub mod config;
pub mod host;

mod workers;

pub use api::{HostError, ProverApi, ProverHandle, Result};
pub use config::{HostConfig, ProverMode};
pub use host::{ActiveProver, ProverHost, WarmupOutcome};
pub use workers::{Command, InlineProver, MetricsSnapshot, ProofMetrics, ProverWorker};
