//! CipherForge client: composition of the proof host, the challenger
//! workbench and the settlement layer.
//!
//! # Architecture
//!
//! ```text
//! cipherforge (binary)
//!   ├─→ ClientConfig (assets, host timeouts)
//!   ├─→ Workbench    (guess throttle → self-check → ProverHost)
//!   ├─→ SettlementFlow (ledger, wallet, contract, store)
//!   └─→ check_accounts (Horizon lookups, Friendbot funding)
//! ```

pub mod accounts;
pub mod config;
pub mod demo;
pub mod workbench;

use std::sync::Arc;

use anyhow::Result;
use runtime::ProverHost;
use zk::EngineFactory;

pub use accounts::{AccountStatus, check_accounts, horizon_ledger};
pub use config::{AssetLocation, ClientConfig};
pub use demo::{DemoReport, run_demo};
pub use workbench::{DEGRADED_WARMUP_MESSAGE, Workbench, WorkbenchError};

/// Proving engine compiled into this build.
pub fn engine_factory() -> Result<Arc<dyn EngineFactory>> {
    #[cfg(feature = "stub")]
    {
        Ok(Arc::new(zk::StubEngineFactory::new()))
    }

    #[cfg(not(feature = "stub"))]
    {
        anyhow::bail!("no proving engine compiled in; enable the `stub` feature")
    }
}

/// Builds the prover host described by `config`.
pub fn build_host(config: &ClientConfig) -> Result<ProverHost> {
    Ok(ProverHost::new(
        config.host.clone(),
        config.runtime.clone(),
        config.asset_source()?,
        engine_factory()?,
    ))
}
