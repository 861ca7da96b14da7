//! Common types for challenges and on-chain settlement.

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};
use zk::ProofArtifact;

/// Contract session identifier. Sessions are numbered from 1.
pub type SessionId = u32;

// ============================================================================
// Addresses
// ============================================================================

/// Normalized ledger account address.
///
/// Built with [`Address::normalize`], which trims, uppercases and recovers a
/// Stellar public key embedded in pasted noise. An empty address means "not
/// provided" and never equals anything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(String);

const ED25519_KEY_LENGTH: usize = 56;
const MUXED_KEY_LENGTH: usize = 69;
const TOKEN_MIN_TAIL: usize = 20;
const TOKEN_MAX_TAIL: usize = 80;

impl Address {
    pub fn normalize(raw: &str) -> Self {
        let normalized = raw.trim().to_uppercase();
        if normalized.is_empty() {
            return Self::default();
        }

        let base32_only: String = normalized.chars().filter(|c| is_base32(*c)).collect();
        let mut candidates = vec![normalized.clone(), base32_only];
        candidates.extend(address_tokens(&normalized));

        candidates
            .into_iter()
            .find(|candidate| is_account_key(candidate))
            .map(Self)
            .unwrap_or(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Equality after normalization; `false` when either side is empty.
    pub fn same_as(&self, other: &Address) -> bool {
        !self.is_empty() && !other.is_empty() && self.0 == other.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Address {
    fn from(raw: &str) -> Self {
        Self::normalize(raw)
    }
}

/// Compares two raw addresses after normalization.
pub fn same_address(left: &str, right: &str) -> bool {
    Address::normalize(left).same_as(&Address::normalize(right))
}

fn is_base32(c: char) -> bool {
    c.is_ascii_uppercase() || ('2'..='7').contains(&c)
}

/// Shape check for account (`G…`, 56 chars) and muxed (`M…`, 69 chars) keys.
///
/// The StrKey checksum is not verified here; the ledger rejects bad keys.
fn is_account_key(candidate: &str) -> bool {
    let valid_shape = |prefix: char, len: usize| {
        candidate.len() == len
            && candidate.starts_with(prefix)
            && candidate.chars().all(is_base32)
    };
    valid_shape('G', ED25519_KEY_LENGTH) || valid_shape('M', MUXED_KEY_LENGTH)
}

/// Finds `[GM][A-Z2-7]{20,80}` tokens, leftmost-longest like a global regex scan.
fn address_tokens(value: &str) -> Vec<String> {
    let chars: Vec<char> = value.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        if matches!(chars[i], 'G' | 'M') {
            let tail = chars[i + 1..]
                .iter()
                .take(TOKEN_MAX_TAIL)
                .take_while(|c| is_base32(**c))
                .count();
            if tail >= TOKEN_MIN_TAIL {
                tokens.push(chars[i..=i + tail].iter().collect());
                i += tail + 1;
                continue;
            }
        }
        i += 1;
    }
    tokens
}

// ============================================================================
// Challenges
// ============================================================================

/// Game preset a challenge is bound to. Selects input rules only.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum GamePreset {
    Pong,
    Snake,
    Asteroids,
}

/// Input rules shown to challengers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputRules {
    pub label: &'static str,
    pub placeholder: &'static str,
    /// Regex source of the accepted format, for display and export.
    pub pattern: &'static str,
}

const PRINTABLE_KEY_RULES: InputRules = InputRules {
    label: "Challenge key",
    placeholder: "Enter a challenge key (1-16 printable chars)",
    pattern: r"^[\x20-\x7E]{1,16}$",
};

/// Challenger input that does not match the preset rules.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Input format is invalid for {label}.")]
pub struct InputFormatError {
    pub label: &'static str,
}

impl GamePreset {
    pub fn input_rules(self) -> InputRules {
        match self {
            GamePreset::Pong | GamePreset::Snake | GamePreset::Asteroids => PRINTABLE_KEY_RULES,
        }
    }

    /// Trims `raw` and checks it is 1-16 printable ASCII characters.
    pub fn normalize_input(self, raw: &str) -> Result<String, InputFormatError> {
        let trimmed = raw.trim();
        let valid = (1..=16).contains(&trimmed.len())
            && trimmed.bytes().all(|b| (0x20..=0x7e).contains(&b));
        if valid {
            Ok(trimmed.to_string())
        } else {
            Err(InputFormatError {
                label: self.input_rules().label,
            })
        }
    }

    /// Preset for records created before presets existed.
    pub fn from_legacy_title(title: &str) -> Self {
        let title = title.to_lowercase();
        if title.contains("snake") {
            GamePreset::Snake
        } else if title.contains("asteroid") {
            GamePreset::Asteroids
        } else {
            GamePreset::Pong
        }
    }
}

/// Challenge lifecycle tag.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ChallengeStatus {
    Draft,
    Published,
    Settled,
}

/// Opaque challenge record identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChallengeId(pub String);

impl fmt::Display for ChallengeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Draft submitted by a creator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewChallenge {
    pub title: String,
    pub description: String,
    pub hint: Option<String>,
    pub expected_hash_hex: String,
    pub game_preset: GamePreset,
}

/// Persisted challenge. Timestamps are Unix milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Challenge {
    pub id: ChallengeId,
    pub creator_address: Address,
    pub title: String,
    pub description: String,
    pub hint: Option<String>,
    pub game_preset: GamePreset,
    pub input_label: String,
    pub input_placeholder: String,
    pub input_pattern: String,
    /// Immutable after creation.
    pub expected_hash_hex: String,
    pub status: ChallengeStatus,
    pub published_at: Option<u64>,
    pub session_id: Option<SessionId>,
    pub challenger_address: Option<Address>,
    pub submitted_by: Option<Address>,
    pub settled_at: Option<u64>,
    pub created_at: u64,
}

// ============================================================================
// Proof submission
// ============================================================================

/// What the settlement flow needs from a proof.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProofSubmission {
    pub proof_bytes: Vec<u8>,
    /// Flattened 32-byte public-input words.
    pub public_inputs: Vec<u8>,
    /// Local verification outcome, if known.
    pub is_valid: Option<bool>,
}

impl ProofSubmission {
    pub fn is_ready(&self) -> bool {
        !self.proof_bytes.is_empty() && !self.public_inputs.is_empty()
    }
}

impl From<&ProofArtifact> for ProofSubmission {
    fn from(artifact: &ProofArtifact) -> Self {
        Self {
            proof_bytes: artifact.proof_bytes.clone(),
            public_inputs: artifact.public_inputs_bytes.clone(),
            is_valid: Some(artifact.is_valid),
        }
    }
}

/// Blockchain-specific configuration.
///
/// This is a trait to allow different ledgers to provide their own config types.
pub trait BlockchainConfig: Send + Sync {
    /// Human-readable network name (e.g., "stellar-testnet")
    fn network_name(&self) -> &str;

    /// RPC endpoint URL
    fn rpc_url(&self) -> &str;

    /// Validate configuration (e.g., required identifiers present)
    fn validate(&self) -> Result<(), String>;
}
