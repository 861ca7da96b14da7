//! Client configuration loaded from the environment.

use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use runtime::HostConfig;
use zk::{AssetSource, FsAssetSource, ProofRuntimeConfig, ZK_ASSET_VERSION};

/// Where the proof runtime loads its wasm modules and circuit from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetLocation {
    /// Static host, fetched with `?v=<version>`.
    Http { base_url: String, version: String },
    /// Local directory laid out like the static host.
    Dir(PathBuf),
    /// Development engine assets compiled into the binary.
    Bundled,
}

impl AssetLocation {
    /// Builds the asset source for this location.
    pub fn source(&self, runtime: &ProofRuntimeConfig) -> anyhow::Result<Arc<dyn AssetSource>> {
        match self {
            #[cfg(feature = "http")]
            AssetLocation::Http { base_url, version } => {
                Ok(Arc::new(zk::HttpAssetSource::new(base_url.clone(), version.clone())))
            }
            #[cfg(not(feature = "http"))]
            AssetLocation::Http { .. } => {
                anyhow::bail!("ZK_ASSET_BASE_URL requires the `http` feature")
            }
            AssetLocation::Dir(root) => Ok(Arc::new(FsAssetSource::new(root.clone()))),
            #[cfg(feature = "stub")]
            AssetLocation::Bundled => Ok(Arc::new(zk::MemoryAssetSource::stub_bundle(
                &runtime.paths,
                zk::backend::stub::supported_circuit_json(),
            ))),
            #[cfg(not(feature = "stub"))]
            AssetLocation::Bundled => {
                let _ = runtime;
                anyhow::bail!("bundled assets require the `stub` feature; set ZK_ASSET_DIR")
            }
        }
    }
}

/// Top-level client settings.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub assets: AssetLocation,
    pub host: HostConfig,
    pub runtime: ProofRuntimeConfig,
}

impl ClientConfig {
    /// Construct configuration from process environment variables.
    ///
    /// Environment variables:
    /// - `ZK_ASSET_BASE_URL` - Static host serving the ZK assets
    /// - `ZK_ASSET_DIR` - Local asset directory (used when no base URL is set)
    /// - `ZK_ASSET_VERSION` - Cache-busting version (default: 20260222)
    /// - plus the prover host variables read by [`HostConfig::from_env`]
    ///
    /// With neither asset variable set, the bundled development assets are used.
    pub fn from_env() -> Self {
        let version = read_var("ZK_ASSET_VERSION").unwrap_or_else(|| ZK_ASSET_VERSION.to_string());
        let assets = match (read_var("ZK_ASSET_BASE_URL"), read_var("ZK_ASSET_DIR")) {
            (Some(base_url), _) => AssetLocation::Http { base_url, version },
            (None, Some(dir)) => AssetLocation::Dir(PathBuf::from(dir)),
            (None, None) => AssetLocation::Bundled,
        };

        Self {
            assets,
            host: HostConfig::from_env(),
            runtime: ProofRuntimeConfig::default(),
        }
    }

    pub fn asset_source(&self) -> anyhow::Result<Arc<dyn AssetSource>> {
        self.assets.source(&self.runtime)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            assets: AssetLocation::Bundled,
            host: HostConfig::default(),
            runtime: ProofRuntimeConfig::default(),
        }
    }
}

fn read_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
