//! Local guess throttle and session countdown.
//!
//! Purely a client-side UX limit. Nothing stops a challenger from hashing
//! guesses offline; the commitment's preimage resistance is the only control.

use std::time::Duration;

use zk::{CommitmentError, hash_secret_word};

use crate::types::{Challenge, InputFormatError};

pub const MAX_LOCAL_ATTEMPTS: usize = 12;
pub const SESSION_WINDOW: Duration = Duration::from_secs(10 * 60);

/// Prefix of the digest kept in the attempt log.
const DIGEST_PREVIEW_LENGTH: usize = 12;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuessAttempt {
    /// 1-based.
    pub id: usize,
    pub digest_preview: String,
    pub matched: bool,
    pub created_at: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuessOutcome {
    Matched,
    Incorrect,
}

impl GuessOutcome {
    pub fn message(self) -> &'static str {
        match self {
            GuessOutcome::Matched => "Correct guess candidate found. Generate ZK proof to finalize.",
            GuessOutcome::Incorrect => "Incorrect guess. Try again.",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GuessError {
    #[error(transparent)]
    InvalidFormat(#[from] InputFormatError),

    #[error(
        "Attempt limit reached for this session. Generate proof if you solved it, or start a new challenge."
    )]
    LimitReached,

    #[error(transparent)]
    Commitment(#[from] CommitmentError),
}

/// Attempt log for one workbench session, newest first.
#[derive(Debug, Clone)]
pub struct GuessLimiter {
    max_attempts: usize,
    attempts: Vec<GuessAttempt>,
}

impl GuessLimiter {
    pub fn new() -> Self {
        Self::with_limit(MAX_LOCAL_ATTEMPTS)
    }

    pub fn with_limit(max_attempts: usize) -> Self {
        Self {
            max_attempts,
            attempts: Vec::new(),
        }
    }

    pub fn attempts(&self) -> &[GuessAttempt] {
        &self.attempts
    }

    pub fn used(&self) -> usize {
        self.attempts.len()
    }

    pub fn remaining(&self) -> usize {
        self.max_attempts.saturating_sub(self.attempts.len())
    }

    /// Validates the format first, then the limit, then hashes and compares.
    ///
    /// Invalid input does not consume an attempt.
    pub fn guess(
        &mut self,
        challenge: &Challenge,
        raw: &str,
        now_ms: u64,
    ) -> Result<GuessOutcome, GuessError> {
        let secret = challenge.game_preset.normalize_input(raw)?;
        if self.remaining() == 0 {
            return Err(GuessError::LimitReached);
        }

        let digest = hash_secret_word(&secret)?;
        let matched = digest == challenge.expected_hash_hex.to_lowercase();
        self.attempts.insert(
            0,
            GuessAttempt {
                id: self.attempts.len() + 1,
                digest_preview: digest.chars().take(DIGEST_PREVIEW_LENGTH).collect(),
                matched,
                created_at: now_ms,
            },
        );

        Ok(if matched {
            GuessOutcome::Matched
        } else {
            GuessOutcome::Incorrect
        })
    }

    pub fn reset(&mut self) {
        self.attempts.clear();
    }
}

impl Default for GuessLimiter {
    fn default() -> Self {
        Self::new()
    }
}

/// Seconds left in the session window; counted from challenge creation once
/// a session exists. May be negative after expiry.
pub fn session_seconds_left(challenge: &Challenge, now_ms: u64) -> i64 {
    let window = SESSION_WINDOW.as_secs() as i64;
    if challenge.session_id.is_none() {
        return window;
    }
    let elapsed = now_ms.saturating_sub(challenge.created_at) / 1000;
    window - elapsed as i64
}

/// `MM:SS`, clamped at zero.
pub fn format_countdown(seconds_left: i64) -> String {
    let clamped = seconds_left.max(0);
    format!("{:02}:{:02}", clamped / 60, clamped % 60)
}
