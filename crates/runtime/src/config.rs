//! Prover host configuration.

use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Where proofs are computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProverMode {
    /// Dedicated worker thread, falling back to inline if it cannot start.
    #[default]
    Worker,
    /// Always on the calling task.
    Inline,
}

impl FromStr for ProverMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "worker" => Ok(ProverMode::Worker),
            "inline" => Ok(ProverMode::Inline),
            other => Err(format!(
                "Invalid ZK_PROVER_MODE: {other}. Must be worker or inline"
            )),
        }
    }
}

/// Timeouts and execution mode for the prover host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostConfig {
    pub mode: ProverMode,
    pub warmup_timeout: Duration,
    pub proof_timeout: Duration,
    /// Warmup attempts before the host is reported degraded.
    pub warmup_retry_limit: u32,
}

impl HostConfig {
    pub const DEFAULT_WARMUP_TIMEOUT: Duration = Duration::from_secs(180);
    pub const DEFAULT_PROOF_TIMEOUT: Duration = Duration::from_secs(180);
    pub const DEFAULT_WARMUP_RETRY_LIMIT: u32 = 2;

    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `ZK_PROVER_MODE` - worker or inline (default: worker)
    /// - `ZK_WARMUP_TIMEOUT_MS` - warmup timeout (default: 180000)
    /// - `ZK_PROOF_TIMEOUT_MS` - proof timeout (default: 180000)
    /// - `ZK_WARMUP_RETRY_LIMIT` - warmup attempts (default: 2)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let mode = match env::var("ZK_PROVER_MODE") {
            Ok(raw) => raw.parse().unwrap_or_else(|err: String| {
                tracing::warn!("{err}; using worker mode");
                ProverMode::Worker
            }),
            Err(_) => defaults.mode,
        };

        Self {
            mode,
            warmup_timeout: read_env::<u64>("ZK_WARMUP_TIMEOUT_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.warmup_timeout),
            proof_timeout: read_env::<u64>("ZK_PROOF_TIMEOUT_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.proof_timeout),
            warmup_retry_limit: read_env::<u32>("ZK_WARMUP_RETRY_LIMIT")
                .filter(|limit| *limit > 0)
                .unwrap_or(defaults.warmup_retry_limit),
        }
    }
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            mode: ProverMode::Worker,
            warmup_timeout: Self::DEFAULT_WARMUP_TIMEOUT,
            proof_timeout: Self::DEFAULT_PROOF_TIMEOUT,
            warmup_retry_limit: Self::DEFAULT_WARMUP_RETRY_LIMIT,
        }
    }
}

fn read_env<T>(key: &str) -> Option<T>
where
    T: FromStr,
{
    env::var(key).ok()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_modes() {
        assert_eq!("Worker".parse::<ProverMode>(), Ok(ProverMode::Worker));
        assert_eq!(" inline ".parse::<ProverMode>(), Ok(ProverMode::Inline));
        assert!("thread".parse::<ProverMode>().is_err());
    }

    #[test]
    fn default_timeouts_are_three_minutes() {
        let config = HostConfig::default();
        assert_eq!(config.warmup_timeout, Duration::from_millis(180_000));
        assert_eq!(config.proof_timeout, Duration::from_millis(180_000));
        assert_eq!(config.warmup_retry_limit, 2);
    }
}
