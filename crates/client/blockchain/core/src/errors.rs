//! Ledger error classification.
//!
//! Upstream ledger and wallet errors arrive as free text. They are matched
//! against an ordered rule list (case-insensitive substrings) and mapped to a
//! category with remediation text. This is a best-effort heuristic tuned
//! against Stellar RPC/Horizon error strings, not a closed taxonomy; anything
//! unmatched passes through with the failing operation prefixed.

use strum::Display;

/// Settlement operation that produced an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum SettlementOp {
    #[strum(serialize = "create_session")]
    CreateSession,
    #[strum(serialize = "submit_proof")]
    SubmitProof,
    #[strum(serialize = "fund_account")]
    FundAccount,
}

impl SettlementOp {
    fn failure_prefix(self) -> &'static str {
        match self {
            SettlementOp::CreateSession => "Unable to start session",
            SettlementOp::SubmitProof => "Unable to submit proof",
            SettlementOp::FundAccount => "Unable to fund account",
        }
    }
}

/// Category of a ledger failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerErrorKind {
    /// Balance too low for fees or reserves.
    Underfunded,
    /// Signature rejected.
    BadAuth,
    /// Account missing on the ledger; the id is extracted when present.
    AccountNotFound { account: Option<String> },
    Other,
}

type Rule = (fn(&str) -> bool, fn(&str) -> LedgerErrorKind);

/// Evaluated in order; first match wins.
const RULES: &[Rule] = &[
    (is_underfunded, underfunded),
    (is_bad_auth, bad_auth),
    (is_account_not_found, account_not_found),
];

fn is_underfunded(m: &str) -> bool {
    ["op_underfunded", "underfunded", "insufficient", "reserve"]
        .iter()
        .any(|needle| m.contains(needle))
}

fn is_bad_auth(m: &str) -> bool {
    m.contains("tx_bad_auth") || m.contains("bad auth")
}

fn is_account_not_found(m: &str) -> bool {
    m.contains("account not found")
}

fn underfunded(_: &str) -> LedgerErrorKind {
    LedgerErrorKind::Underfunded
}

fn bad_auth(_: &str) -> LedgerErrorKind {
    LedgerErrorKind::BadAuth
}

fn account_not_found(m: &str) -> LedgerErrorKind {
    LedgerErrorKind::AccountNotFound {
        account: missing_account_id(m),
    }
}

pub fn classify(raw: &str) -> LedgerErrorKind {
    let normalized = raw.to_lowercase();
    RULES
        .iter()
        .find(|(matches, _)| matches(&normalized))
        .map(|(_, kind)| kind(&normalized))
        .unwrap_or(LedgerErrorKind::Other)
}

/// User-facing text for a ledger failure during `op`.
pub fn friendly_message(op: SettlementOp, raw: &str) -> String {
    match classify(raw) {
        LedgerErrorKind::Underfunded => "Transaction failed because the wallet balance is too low \
             for fees/reserves. Fund the wallet on Stellar Testnet and retry."
            .to_string(),
        LedgerErrorKind::BadAuth => {
            "Transaction signature was rejected. Reconnect your wallet and approve the prompt again."
                .to_string()
        }
        LedgerErrorKind::AccountNotFound { account } => {
            let account = account.map(|id| format!(" {id}")).unwrap_or_default();
            format!("Stellar account{account} is missing on testnet. Fund it with Friendbot, then retry.")
        }
        LedgerErrorKind::Other => format!("{}: {raw}", op.failure_prefix()),
    }
}

/// Alphanumeric token after `account not found:`, uppercased.
fn missing_account_id(normalized: &str) -> Option<String> {
    let (_, rest) = normalized.split_once("account not found:")?;
    let id: String = rest
        .trim_start()
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric())
        .collect();
    (!id.is_empty()).then(|| id.to_uppercase())
}
