//! CipherForge command-line client.
//!
//! # Examples
//!
//! ```bash
//! # Commitment for a secret
//! cargo run -p cipherforge-client -- hash OPEN_SESAME
//!
//! # Prove against a published commitment, assets from a static host
//! ZK_ASSET_BASE_URL=https://cipherforge.example cargo run -p cipherforge-client -- \
//!     prove --secret OPEN_SESAME --hash 51b4...84dd
//!
//! # Full flow with in-memory ledger and contract
//! cargo run -p cipherforge-client -- demo --secret OPEN_SESAME
//!
//! # Look up testnet accounts on Horizon, funding missing ones
//! cargo run -p cipherforge-client -- check-accounts --fund GBRP...OX2H
//! ```

use std::sync::Arc;

use anyhow::{Context, Result, bail};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use cipherforge_client::{ClientConfig, build_host, check_accounts, horizon_ledger, run_demo};
use clap::{Parser, Subcommand};
use client_blockchain_core::{Address, SettlementOp, friendly_message};
use client_blockchain_stellar::StellarConfig;
use runtime::ProverApi;
use tracing_subscriber::EnvFilter;
use zk::{
    check_assets, flatten_public_inputs, hash_secret_word, matches_commitment, normalize_hash,
    prepare_witness,
};

#[derive(Parser)]
#[command(name = "cipherforge", version, about = "Secret-word ZK challenges")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the commitment hash of a secret.
    Hash { secret: String },

    /// Flatten field elements into the contract's public-input bytes.
    EncodeInputs {
        #[arg(required = true)]
        fields: Vec<String>,
    },

    /// Fetch every runtime asset and report which are reachable.
    CheckAssets,

    /// Self-check, prove and print the base64 transport JSON.
    Prove {
        #[arg(long)]
        secret: String,
        #[arg(long)]
        hash: String,
    },

    /// Run creator, challenger and settlement against in-memory services.
    Demo {
        #[arg(long)]
        secret: String,
        #[arg(long)]
        guess: Option<String>,
    },

    /// Check Stellar accounts on Horizon; `--fund` requests Friendbot funding.
    CheckAccounts {
        #[arg(required = true)]
        addresses: Vec<String>,
        #[arg(long)]
        fund: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (silently ignore if not found)
    let _ = dotenvy::dotenv();
    setup_logging();

    let cli = Cli::parse();
    let config = ClientConfig::from_env();

    match cli.command {
        Command::Hash { secret } => {
            println!("{}", hash_secret_word(&secret)?);
        }
        Command::EncodeInputs { fields } => {
            let bytes = flatten_public_inputs(&fields)?;
            println!("hex:    {}", hex::encode(&bytes));
            println!("base64: {}", STANDARD.encode(&bytes));
        }
        Command::CheckAssets => {
            let source = config.asset_source()?;
            tracing::info!(source = %source.describe(), "checking assets");
            let checks = check_assets(source.as_ref(), &config.runtime.paths).await;
            for check in &checks {
                let status = check
                    .status
                    .map(|code| code.to_string())
                    .unwrap_or_else(|| "-".to_string());
                let verdict = if check.ok { "ok" } else { "missing" };
                println!("{verdict:<8} {status:<4} {}", check.path);
            }
            if checks.iter().any(|check| !check.ok) {
                bail!("one or more ZK assets are unavailable; rebuild and sync assets");
            }
        }
        Command::Prove { secret, hash } => {
            let hash = normalize_hash(&hash)?;
            if !matches_commitment(&secret, &hash)? {
                bail!("Incorrect victory code for this challenge. Check the hint and try again.");
            }
            let host = build_host(&config)?;
            let witness = prepare_witness(&secret, &hash)?;
            let artifact = host
                .prove_and_verify(witness)
                .await
                .map_err(|err| anyhow::anyhow!(err.user_message()))?;
            let metrics = host.metrics().snapshot();
            tracing::info!(?metrics, "proof complete");
            println!("{}", serde_json::to_string_pretty(&artifact.to_transport())?);
        }
        Command::Demo { secret, guess } => {
            let host = Arc::new(build_host(&config)?);
            let report = run_demo(host, &secret, guess.as_deref())
                .await
                .context("demo failed")?;
            println!("commitment: {}", report.expected_hash_hex);
            println!("guess:      {}", report.guess.message());
            for address in &report.funded {
                println!("funded:     {address}");
            }
            println!("session:    {}", report.session_id);
            println!("proof:      {}", serde_json::to_string(&report.proof)?);
        }
        Command::CheckAccounts { addresses, fund } => {
            let stellar = StellarConfig::from_env()?;
            let ledger = horizon_ledger(&stellar)?;
            let addresses: Vec<Address> =
                addresses.iter().map(|raw| Address::normalize(raw)).collect();
            let statuses = check_accounts(&ledger, &addresses, fund)
                .await
                .map_err(|err| {
                    anyhow::anyhow!(friendly_message(SettlementOp::FundAccount, &err.to_string()))
                })?;
            for status in &statuses {
                let verdict = match (status.exists, status.funded) {
                    (true, true) => "funded",
                    (true, false) => "ok",
                    (false, _) => "missing",
                };
                println!("{verdict:<8} {}", status.address);
            }
            if statuses.iter().any(|status| !status.exists) {
                bail!("one or more accounts are not funded on {}", stellar.network);
            }
        }
    }

    Ok(())
}

/// Logs to stderr; `RUST_LOG` overrides the default `info` level.
fn setup_logging() {
    let env_filter =
        EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}
