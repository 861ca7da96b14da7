//! In-memory challenge store.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use tracing::debug;
use zk::normalize_hash;

use crate::traits::{ChallengeStore, StoreError};
use crate::types::{Address, Challenge, ChallengeId, ChallengeStatus, NewChallenge, SessionId};

/// Millisecond clock used for record timestamps.
pub type Clock = Arc<dyn Fn() -> u64 + Send + Sync>;

fn system_clock() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or_default()
}

struct Record {
    /// Insertion order; breaks timestamp ties.
    seq: u64,
    challenge: Challenge,
}

/// [`ChallengeStore`] backed by a `HashMap`.
#[derive(Clone)]
pub struct InMemoryChallengeStore {
    records: Arc<Mutex<HashMap<ChallengeId, Record>>>,
    next_seq: Arc<AtomicU64>,
    clock: Clock,
}

impl InMemoryChallengeStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(system_clock))
    }

    pub fn with_clock(clock: Clock) -> Self {
        Self {
            records: Arc::new(Mutex::new(HashMap::new())),
            next_seq: Arc::new(AtomicU64::new(1)),
            clock,
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<ChallengeId, Record>> {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn update<F>(&self, id: &ChallengeId, apply: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut Challenge),
    {
        let mut records = self.lock();
        let record = records
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        apply(&mut record.challenge);
        Ok(())
    }

    fn collect_sorted<P, K>(&self, keep: P, key: K) -> Vec<Challenge>
    where
        P: Fn(&Challenge) -> bool,
        K: Fn(&Challenge) -> u64,
    {
        let records = self.lock();
        let mut matching: Vec<&Record> = records.values().filter(|r| keep(&r.challenge)).collect();
        matching.sort_by(|a, b| {
            (key(&b.challenge), b.seq).cmp(&(key(&a.challenge), a.seq))
        });
        matching.into_iter().map(|r| r.challenge.clone()).collect()
    }
}

impl Default for InMemoryChallengeStore {
    fn default() -> Self {
        Self::new()
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[async_trait]
impl ChallengeStore for InMemoryChallengeStore {
    async fn create_draft(
        &self,
        creator: &Address,
        draft: NewChallenge,
    ) -> Result<ChallengeId, StoreError> {
        if creator.is_empty() {
            return Err(StoreError::Unauthenticated);
        }
        let expected_hash_hex = normalize_hash(&draft.expected_hash_hex)?;
        let rules = draft.game_preset.input_rules();

        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        let id = ChallengeId(format!("ch_{seq:06}"));
        let challenge = Challenge {
            id: id.clone(),
            creator_address: creator.clone(),
            title: draft.title.trim().to_string(),
            description: draft.description.trim().to_string(),
            hint: non_empty(draft.hint),
            game_preset: draft.game_preset,
            input_label: rules.label.to_string(),
            input_placeholder: rules.placeholder.to_string(),
            input_pattern: rules.pattern.to_string(),
            expected_hash_hex,
            status: ChallengeStatus::Draft,
            published_at: None,
            session_id: None,
            challenger_address: None,
            submitted_by: None,
            settled_at: None,
            created_at: (self.clock)(),
        };

        self.lock().insert(id.clone(), Record { seq, challenge });
        debug!(challenge = %id, creator = %creator, "draft created");
        Ok(id)
    }

    async fn publish_draft(&self, id: &ChallengeId, caller: &Address) -> Result<(), StoreError> {
        if caller.is_empty() {
            return Err(StoreError::Unauthenticated);
        }
        let now = (self.clock)();
        let mut records = self.lock();
        let record = records
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        let challenge = &mut record.challenge;

        if !challenge.creator_address.same_as(caller) {
            return Err(StoreError::NotCreator);
        }
        if challenge.status != ChallengeStatus::Draft {
            return Ok(());
        }
        challenge.status = ChallengeStatus::Published;
        challenge.published_at = Some(now);
        debug!(challenge = %id, "draft published");
        Ok(())
    }

    async fn get_by_id(&self, id: &ChallengeId) -> Result<Option<Challenge>, StoreError> {
        Ok(self.lock().get(id).map(|r| r.challenge.clone()))
    }

    async fn list_by_creator(&self, creator: &Address) -> Result<Vec<Challenge>, StoreError> {
        if creator.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self.collect_sorted(|c| c.creator_address.same_as(creator), |c| c.created_at))
    }

    async fn list_published(&self) -> Result<Vec<Challenge>, StoreError> {
        Ok(self.collect_sorted(
            |c| c.status != ChallengeStatus::Draft,
            |c| c.published_at.unwrap_or(c.created_at),
        ))
    }

    async fn record_session_start(
        &self,
        id: &ChallengeId,
        session_id: SessionId,
        challenger: &Address,
    ) -> Result<(), StoreError> {
        self.update(id, |challenge| {
            challenge.session_id = Some(session_id);
            challenge.challenger_address = Some(challenger.clone());
        })?;
        debug!(challenge = %id, session_id, challenger = %challenger, "session recorded");
        Ok(())
    }

    async fn record_settlement(
        &self,
        id: &ChallengeId,
        session_id: SessionId,
        solver: &Address,
    ) -> Result<(), StoreError> {
        let now = (self.clock)();
        self.update(id, |challenge| {
            challenge.status = ChallengeStatus::Settled;
            challenge.session_id = Some(session_id);
            challenge.submitted_by = Some(solver.clone());
            challenge.settled_at = Some(now);
        })?;
        debug!(challenge = %id, session_id, solver = %solver, "settlement recorded");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::GamePreset;
    use zk::hash_secret_word;

    const CREATOR: &str = "GBRPYHIL2CI3FNQ4BXLFMNDLFJUNPU2HY3ZMFSHONUCEOASW7QC7OX2H";
    const OTHER: &str = "GAAZI4TCR3TY5OJHCTJC2A4QSY6CJWJH5IAJTGKIN2ER7LBNVKOCCWN7";

    fn fixed_clock() -> (Clock, Arc<AtomicU64>) {
        let now = Arc::new(AtomicU64::new(1_000));
        let handle = Arc::clone(&now);
        (Arc::new(move || handle.load(Ordering::SeqCst)), now)
    }

    fn draft(title: &str) -> NewChallenge {
        NewChallenge {
            title: format!("  {title} "),
            description: "find the key".into(),
            hint: Some("   ".into()),
            expected_hash_hex: hash_secret_word("OPEN_SESAME").unwrap().to_uppercase(),
            game_preset: GamePreset::Snake,
        }
    }

    #[tokio::test]
    async fn draft_is_normalized() {
        let store = InMemoryChallengeStore::new();
        let id = store.create_draft(&CREATOR.into(), draft("Vault")).await.unwrap();
        let challenge = store.get_by_id(&id).await.unwrap().unwrap();

        assert_eq!(challenge.title, "Vault");
        assert_eq!(challenge.hint, None);
        assert_eq!(challenge.status, ChallengeStatus::Draft);
        assert_eq!(challenge.input_label, "Challenge key");
        assert_eq!(challenge.expected_hash_hex, hash_secret_word("OPEN_SESAME").unwrap());
    }

    #[tokio::test]
    async fn rejects_bad_hash_and_anonymous_creator() {
        let store = InMemoryChallengeStore::new();
        let mut bad = draft("Vault");
        bad.expected_hash_hex = "abc".into();
        assert!(matches!(
            store.create_draft(&CREATOR.into(), bad).await,
            Err(StoreError::InvalidHash(_))
        ));
        assert_eq!(
            store.create_draft(&Address::default(), draft("Vault")).await,
            Err(StoreError::Unauthenticated)
        );
    }

    #[tokio::test]
    async fn publish_is_creator_only_and_idempotent() {
        let (clock, now) = fixed_clock();
        let store = InMemoryChallengeStore::with_clock(clock);
        let id = store.create_draft(&CREATOR.into(), draft("Vault")).await.unwrap();

        assert_eq!(
            store.publish_draft(&id, &OTHER.into()).await,
            Err(StoreError::NotCreator)
        );

        now.store(2_000, Ordering::SeqCst);
        store.publish_draft(&id, &CREATOR.into()).await.unwrap();
        now.store(3_000, Ordering::SeqCst);
        store.publish_draft(&id, &CREATOR.into()).await.unwrap();

        let challenge = store.get_by_id(&id).await.unwrap().unwrap();
        assert_eq!(challenge.status, ChallengeStatus::Published);
        assert_eq!(challenge.published_at, Some(2_000));
    }

    #[tokio::test]
    async fn listings_are_newest_first() {
        let (clock, now) = fixed_clock();
        let store = InMemoryChallengeStore::with_clock(clock);
        let first = store.create_draft(&CREATOR.into(), draft("one")).await.unwrap();
        now.store(1_500, Ordering::SeqCst);
        let second = store.create_draft(&CREATOR.into(), draft("two")).await.unwrap();
        let hidden = store.create_draft(&OTHER.into(), draft("three")).await.unwrap();

        let mine: Vec<_> = store
            .list_by_creator(&CREATOR.into())
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(mine, vec![second.clone(), first.clone()]);

        now.store(5_000, Ordering::SeqCst);
        store.publish_draft(&first, &CREATOR.into()).await.unwrap();
        now.store(4_000, Ordering::SeqCst);
        store.publish_draft(&second, &CREATOR.into()).await.unwrap();

        let published: Vec<_> = store
            .list_published()
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(published, vec![first, second]);
        assert!(!published.contains(&hidden));
    }

    #[tokio::test]
    async fn settlement_marks_solver() {
        let store = InMemoryChallengeStore::new();
        let id = store.create_draft(&CREATOR.into(), draft("Vault")).await.unwrap();
        store.record_session_start(&id, 7, &OTHER.into()).await.unwrap();
        store.record_settlement(&id, 7, &OTHER.into()).await.unwrap();

        let challenge = store.get_by_id(&id).await.unwrap().unwrap();
        assert_eq!(challenge.status, ChallengeStatus::Settled);
        assert_eq!(challenge.session_id, Some(7));
        assert_eq!(challenge.submitted_by, Some(OTHER.into()));
        assert!(challenge.settled_at.is_some());

        let missing = ChallengeId("nope".into());
        assert_eq!(
            store.record_settlement(&missing, 1, &OTHER.into()).await,
            Err(StoreError::NotFound(missing))
        );
    }
}
