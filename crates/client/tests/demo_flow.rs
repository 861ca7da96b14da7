//! Client-level flow tests against the bundled stub engine.

use std::sync::Arc;

use cipherforge_client::{
    AssetLocation, ClientConfig, Workbench, WorkbenchError, build_host, run_demo,
};
use client_blockchain_core::{
    Address, ChallengeStore, GamePreset, GuessOutcome, InMemoryChallengeStore, NewChallenge,
};
use runtime::{HostConfig, ProverHost, ProverMode};
use zk::{ProofRuntimeConfig, check_assets, hash_secret_word};

const OPEN_SESAME_HASH: &str = "51b496726b4eaf172fa79885d33f61456a9e1d08576ae19f49b61a8c72ca84dd";
const CREATOR: &str = "GBRPYHIL2CI3FNQ4BXLFMNDLFJUNPU2HY3ZMFSHONUCEOASW7QC7OX2H";

fn bundled(mode: ProverMode) -> ClientConfig {
    ClientConfig {
        assets: AssetLocation::Bundled,
        host: HostConfig {
            mode,
            ..HostConfig::default()
        },
        runtime: ProofRuntimeConfig::default(),
    }
}

fn host(mode: ProverMode) -> Arc<ProverHost> {
    Arc::new(build_host(&bundled(mode)).unwrap())
}

async fn published_challenge(secret: &str) -> client_blockchain_core::Challenge {
    let store = InMemoryChallengeStore::new();
    let creator = Address::normalize(CREATOR);
    let id = store
        .create_draft(
            &creator,
            NewChallenge {
                title: "Vault".into(),
                description: "Find the key".into(),
                hint: Some("magic words".into()),
                expected_hash_hex: hash_secret_word(secret).unwrap(),
                game_preset: GamePreset::Snake,
            },
        )
        .await
        .unwrap();
    store.publish_draft(&id, &creator).await.unwrap();
    store.get_by_id(&id).await.unwrap().unwrap()
}

#[tokio::test]
async fn demo_settles_open_sesame() {
    let report = run_demo(host(ProverMode::Inline), "OPEN_SESAME", None)
        .await
        .unwrap();

    assert_eq!(report.expected_hash_hex, OPEN_SESAME_HASH);
    assert_eq!(report.guess, GuessOutcome::Matched);
    assert_eq!(report.funded.len(), 2);
    assert_eq!(report.session_id, 1);
    assert!(report.proof.is_valid);
    assert!(!report.proof.proof_base64.is_empty());
}

#[tokio::test]
async fn demo_runs_on_worker() {
    let report = run_demo(host(ProverMode::Worker), "OPEN_SESAME", Some("  OPEN_SESAME "))
        .await
        .unwrap();
    assert_eq!(report.session_id, 1);
}

#[tokio::test]
async fn demo_stops_on_wrong_guess() {
    let err = run_demo(host(ProverMode::Inline), "OPEN_SESAME", Some("CLOSE_SESAME"))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), GuessOutcome::Incorrect.message());
}

#[tokio::test]
async fn wrong_secret_never_reaches_prover() {
    let host = host(ProverMode::Inline);
    let mut workbench = Workbench::new(published_challenge("OPEN_SESAME").await, host.clone());

    let err = workbench.prove("CLOSE_SESAME").await.unwrap_err();
    assert!(matches!(err, WorkbenchError::IncorrectSecret));
    assert!(workbench.proof().is_none());
    assert!(workbench.submission().is_none());
    assert_eq!(host.metrics().snapshot().generated, 0);
}

#[tokio::test]
async fn invalid_input_is_rejected_before_commitment_check() {
    let mut workbench = Workbench::new(
        published_challenge("OPEN_SESAME").await,
        host(ProverMode::Inline),
    );

    let err = workbench.prove("this key is far too long").await.unwrap_err();
    assert!(matches!(err, WorkbenchError::InvalidInput(_)));
    assert_eq!(err.user_message(), "Input format is invalid for Challenge key.");
}

#[tokio::test]
async fn proof_is_ready_for_settlement() {
    let mut workbench = Workbench::new(
        published_challenge("OPEN_SESAME").await,
        host(ProverMode::Inline),
    );
    workbench.warmup().await;

    let artifact = workbench.prove("OPEN_SESAME").await.unwrap();
    assert!(artifact.is_valid);

    let submission = workbench.submission().unwrap();
    assert!(submission.is_ready());
    assert_eq!(submission.proof_bytes, workbench.proof().unwrap().proof_bytes);
}

#[tokio::test]
async fn missing_asset_dir_reports_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let config = ClientConfig {
        assets: AssetLocation::Dir(dir.path().to_path_buf()),
        ..ClientConfig::default()
    };

    let source = config.asset_source().unwrap();
    let checks = check_assets(source.as_ref(), &config.runtime.paths).await;
    assert_eq!(checks.len(), 3);
    assert!(checks.iter().all(|check| !check.ok && check.status == Some(404)));
}
