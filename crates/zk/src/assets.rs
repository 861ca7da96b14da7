//! Runtime asset sources.
//!
//! The proof runtime needs three build artifacts: the circuit-engine wasm, the
//! ABI-codec wasm and the compiled circuit JSON. They are served as static
//! files, so sources are keyed by relative path.

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use serde::Serialize;

use crate::prover::ProofError;

/// Bumped whenever the zk assets are rebuilt, to bust HTTP caches.
pub const ZK_ASSET_VERSION: &str = "20260222";

/// Relative paths of the three runtime assets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetPaths {
    pub circuit_engine_wasm: String,
    pub abi_codec_wasm: String,
    pub circuit_json: String,
}

impl Default for AssetPaths {
    fn default() -> Self {
        Self {
            circuit_engine_wasm: "zk/wasm/acvm_js_bg.wasm".to_string(),
            abi_codec_wasm: "zk/wasm/noirc_abi_wasm_bg.wasm".to_string(),
            circuit_json: "zk/secret_word_puzzle.json".to_string(),
        }
    }
}

impl AssetPaths {
    pub fn all(&self) -> [&str; 3] {
        [
            &self.circuit_engine_wasm,
            &self.abi_codec_wasm,
            &self.circuit_json,
        ]
    }
}

/// Fetches an asset by relative path.
#[async_trait]
pub trait AssetSource: Send + Sync {
    /// Returns the asset bytes or [`ProofError::AssetMissing`].
    async fn fetch(&self, path: &str) -> Result<Vec<u8>, ProofError>;

    /// Human-readable location, for logs.
    fn describe(&self) -> String;
}

/// Result of checking one asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssetCheck {
    pub path: String,
    pub ok: bool,
    pub status: Option<u16>,
}

/// Fetches every asset concurrently and reports which ones are reachable,
/// in [`AssetPaths::all`] order.
///
/// Does not initialise any engine.
pub async fn check_assets(source: &dyn AssetSource, paths: &AssetPaths) -> Vec<AssetCheck> {
    let [engine, codec, circuit] = paths.all();
    let (engine, codec, circuit) = tokio::join!(
        check_one(source, engine),
        check_one(source, codec),
        check_one(source, circuit),
    );
    vec![engine, codec, circuit]
}

async fn check_one(source: &dyn AssetSource, path: &str) -> AssetCheck {
    let (ok, status) = match source.fetch(path).await {
        Ok(_) => (true, Some(200)),
        Err(ProofError::AssetMissing { status, .. }) => (false, status),
        Err(err) => {
            tracing::warn!(path, error = %err, "asset check failed");
            (false, None)
        }
    };
    AssetCheck {
        path: path.to_string(),
        ok,
        status,
    }
}

fn missing(path: &str, status: Option<u16>, reason: impl Into<String>) -> ProofError {
    ProofError::AssetMissing {
        path: path.to_string(),
        status,
        reason: reason.into(),
    }
}

// ============================================================================
// Filesystem
// ============================================================================

/// Reads assets from a local directory.
#[derive(Debug, Clone)]
pub struct FsAssetSource {
    root: PathBuf,
}

impl FsAssetSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl AssetSource for FsAssetSource {
    async fn fetch(&self, path: &str) -> Result<Vec<u8>, ProofError> {
        let full = self.root.join(path);
        tokio::fs::read(&full).await.map_err(|err| {
            let status = (err.kind() == std::io::ErrorKind::NotFound).then_some(404);
            missing(path, status, format!("{}: {err}", full.display()))
        })
    }

    fn describe(&self) -> String {
        format!("dir:{}", self.root.display())
    }
}

// ============================================================================
// HTTP
// ============================================================================

/// Fetches assets from a static host, appending `?v=<version>`.
#[cfg(feature = "http")]
#[derive(Debug, Clone)]
pub struct HttpAssetSource {
    client: reqwest::Client,
    base_url: String,
    version: String,
}

#[cfg(feature = "http")]
impl HttpAssetSource {
    pub fn new(base_url: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            version: version.into(),
        }
    }

    pub fn url_for(&self, path: &str) -> String {
        format!(
            "{}/{}?v={}",
            self.base_url,
            path.trim_start_matches('/'),
            self.version
        )
    }
}

#[cfg(feature = "http")]
#[async_trait]
impl AssetSource for HttpAssetSource {
    async fn fetch(&self, path: &str) -> Result<Vec<u8>, ProofError> {
        let url = self.url_for(path);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|err| missing(path, None, err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(missing(path, Some(status.as_u16()), format!("HTTP {status}")));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|err| missing(path, Some(status.as_u16()), err.to_string()))?;
        Ok(bytes.to_vec())
    }

    fn describe(&self) -> String {
        format!("{}?v={}", self.base_url, self.version)
    }
}

// ============================================================================
// In-memory
// ============================================================================

/// Serves assets from memory. Used by tests and the demo.
#[derive(Debug, Clone, Default)]
pub struct MemoryAssetSource {
    assets: HashMap<String, Vec<u8>>,
}

impl MemoryAssetSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, path: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.assets.insert(path.into(), bytes.into());
        self
    }

    pub fn remove(&mut self, path: &str) -> Option<Vec<u8>> {
        self.assets.remove(path)
    }

    /// Asset bundle for the stub engine with the given circuit document.
    #[cfg(feature = "stub")]
    pub fn stub_bundle(paths: &AssetPaths, circuit_json: String) -> Self {
        use crate::backend::stub::MINIMAL_WASM;

        Self::new()
            .with(paths.circuit_engine_wasm.clone(), MINIMAL_WASM)
            .with(paths.abi_codec_wasm.clone(), MINIMAL_WASM)
            .with(paths.circuit_json.clone(), circuit_json.into_bytes())
    }
}

#[async_trait]
impl AssetSource for MemoryAssetSource {
    async fn fetch(&self, path: &str) -> Result<Vec<u8>, ProofError> {
        self.assets
            .get(path)
            .cloned()
            .ok_or_else(|| missing(path, Some(404), "not in bundle"))
    }

    fn describe(&self) -> String {
        format!("memory:{} assets", self.assets.len())
    }
}
