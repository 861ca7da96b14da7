//! Unified error type surfaced by the prover host.
//!
//! Wraps proof failures, worker coordination failures and caller-side
//! timeouts so clients can tell a wrong secret from a stuck runtime.
use std::time::Duration;

use thiserror::Error;
use tokio::sync::oneshot;
use zk::ProofError;

pub type Result<T> = std::result::Result<T, HostError>;

#[derive(Debug, Error)]
pub enum HostError {
    #[error(transparent)]
    Proof(#[from] ProofError),

    #[error("prover worker command channel closed")]
    CommandChannelClosed,

    #[error("prover worker reply channel closed")]
    ReplyChannelClosed(#[source] oneshot::error::RecvError),

    #[error("zk {operation} timed out after {elapsed:?}")]
    TimedOut {
        operation: &'static str,
        elapsed: Duration,
    },

    #[error("failed to spawn prover worker")]
    WorkerSpawn(#[source] std::io::Error),
}

impl HostError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, HostError::TimedOut { .. })
    }

    pub fn is_incorrect_secret(&self) -> bool {
        matches!(self, HostError::Proof(err) if err.is_incorrect_secret())
    }

    /// Text shown to the user for this failure.
    pub fn user_message(&self) -> String {
        match self {
            HostError::Proof(err) => err.remediation(),
            HostError::TimedOut { operation, .. } => format!(
                "ZK {operation} timed out. Retry once; if it keeps happening, rebuild the zk assets and restart."
            ),
            HostError::CommandChannelClosed | HostError::ReplyChannelClosed(_) => {
                "The prover stopped unexpectedly. Retry to restart it.".to_string()
            }
            HostError::WorkerSpawn(_) => {
                "Could not start the background prover. Proving will run inline.".to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_is_distinct_from_wrong_secret() {
        let timeout = HostError::TimedOut {
            operation: "proof generation",
            elapsed: Duration::from_secs(180),
        };
        assert!(timeout.is_timeout());
        assert!(!timeout.is_incorrect_secret());
        assert!(timeout.user_message().contains("Retry once"));

        let wrong = HostError::from(ProofError::IncorrectSecret("unsatisfied".into()));
        assert!(wrong.is_incorrect_secret());
        assert!(!wrong.is_timeout());
        assert!(wrong.user_message().contains("Incorrect secret"));
    }
}
