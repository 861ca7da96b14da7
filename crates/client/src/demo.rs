//! End-to-end creator → challenger → settlement run against in-memory
//! collaborators.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result, bail};
use client_blockchain_core::{
    Address, ChallengeStore, Collaborators, GamePreset, GuessOutcome, InMemoryChallengeStore,
    MockGameContract, MockLedger, MockWallet, NewChallenge, SessionId, SettlementError,
    SettlementFlow,
};
use client_blockchain_stellar::StellarNetwork;
use runtime::ProverHost;
use tracing::info;
use zk::{ProofTransport, hash_secret_word};

use crate::workbench::Workbench;

pub const DEMO_CREATOR: &str = "GBRPYHIL2CI3FNQ4BXLFMNDLFJUNPU2HY3ZMFSHONUCEOASW7QC7OX2H";
pub const DEMO_CHALLENGER: &str = "GAAZI4TCR3TY5OJHCTJC2A4QSY6CJWJH5IAJTGKIN2ER7LBNVKOCCWN7";

#[derive(Debug, Clone)]
pub struct DemoReport {
    pub expected_hash_hex: String,
    pub guess: GuessOutcome,
    /// Accounts funded after the first preflight.
    pub funded: Vec<Address>,
    pub session_id: SessionId,
    pub proof: ProofTransport,
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or_default()
}

/// Runs the whole flow. `guess` defaults to `secret`.
///
/// Both ledger accounts start unfunded so the preflight and funding steps run.
pub async fn run_demo(host: Arc<ProverHost>, secret: &str, guess: Option<&str>) -> Result<DemoReport> {
    let creator = Address::normalize(DEMO_CREATOR);
    let challenger = Address::normalize(DEMO_CHALLENGER);
    let store = InMemoryChallengeStore::new();

    // creator side
    let expected_hash_hex = hash_secret_word(secret).context("secret cannot be committed")?;
    let id = store
        .create_draft(
            &creator,
            NewChallenge {
                title: "Demo vault".into(),
                description: "Recover the challenge key".into(),
                hint: None,
                expected_hash_hex: expected_hash_hex.clone(),
                game_preset: GamePreset::Pong,
            },
        )
        .await?;
    store.publish_draft(&id, &creator).await?;
    let challenge = store
        .get_by_id(&id)
        .await?
        .context("published challenge disappeared")?;
    info!(challenge = %id, hash = %expected_hash_hex, "challenge published");

    // challenger side
    let mut workbench = Workbench::new(challenge.clone(), host);
    workbench.warmup().await;
    let attempt = guess.unwrap_or(secret);
    let outcome = workbench.guess(attempt, now_ms())?;
    info!(result = outcome.message(), "local guess");
    if outcome != GuessOutcome::Matched {
        bail!("{}", outcome.message());
    }
    let proof = workbench
        .prove(attempt)
        .await
        .map_err(|err| anyhow::anyhow!(err.user_message()))?
        .to_transport();
    let submission = workbench
        .submission()
        .context("proof missing after generation")?;

    // settlement
    let ledger = MockLedger::new();
    let collaborators = Collaborators {
        ledger: Arc::new(ledger),
        wallet: Arc::new(MockWallet::connected_as(&challenger)),
        contract: Arc::new(MockGameContract::new(StellarNetwork::Testnet.passphrase())),
        store: Arc::new(store.clone()),
    };
    let mut flow = SettlementFlow::new(&challenge, collaborators);
    flow.auto_fill_challenger();

    let mut funded = Vec::new();
    let session_id = match flow.start_session().await {
        Ok(session_id) => session_id,
        Err(SettlementError::AccountsNotFunded(missing)) => {
            for address in &missing {
                flow.fund_account(address)
                    .await
                    .map_err(|err| anyhow::anyhow!(err.user_message()))?;
                funded.push(address.clone());
            }
            flow.start_session()
                .await
                .map_err(|err| anyhow::anyhow!(err.user_message()))?
        }
        Err(err) => bail!(err.user_message()),
    };

    flow.submit_proof(&submission)
        .await
        .map_err(|err| anyhow::anyhow!(err.user_message()))?;
    info!(session_id, status = flow.status(), "demo settled");

    Ok(DemoReport {
        expected_hash_hex,
        guess: outcome,
        funded,
        session_id,
        proof,
    })
}
