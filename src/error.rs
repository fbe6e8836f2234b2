//! Error types shared by every client and aggregation in the crate.

use serde::Serialize;
use thiserror::Error;

/// Message the wallet raises after it already redirected the user to sign.
pub const FAILED_TO_REDIRECT_MESSAGE: &str = "Failed to redirect to sign transaction";

#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{url} responded with status {status}")]
    Status { url: String, status: u16 },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("Unexpected query response kind from {0}")]
    UnexpectedResponse(String),

    #[error("Invalid account id {account_id}: {reason}")]
    InvalidAccountId { account_id: String, reason: String },

    #[error("Amount error: {0}")]
    Amount(#[from] AmountError),

    #[error("Appchain {0} has no anchor status")]
    MissingAnchorStatus(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Secret key required: {0}")]
    SecretKeyRequired(&'static str),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Request cancelled")]
    Cancelled,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AmountError {
    #[error("not a number: {0:?}")]
    Invalid(String),

    #[error("{value:?} has more than {decimals} fractional digits")]
    TooPrecise { value: String, decimals: u32 },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has invalid value {value:?}")]
    Invalid { name: &'static str, value: String },
}

/// Coarse classification of a failure, stable enough to branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Transport,
    Status,
    Decode,
    Rpc,
    InvalidInput,
    MissingData,
    Config,
    Cancelled,
}

impl DashboardError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DashboardError::Http(e) if e.is_decode() => ErrorKind::Decode,
            DashboardError::Http(_) => ErrorKind::Transport,
            DashboardError::Status { .. } => ErrorKind::Status,
            DashboardError::Json(_) => ErrorKind::Decode,
            DashboardError::Rpc(_) | DashboardError::UnexpectedResponse(_) => ErrorKind::Rpc,
            DashboardError::InvalidAccountId { .. }
            | DashboardError::Amount(_)
            | DashboardError::SecretKeyRequired(_)
            | DashboardError::Io(_) => ErrorKind::InvalidInput,
            DashboardError::MissingAnchorStatus(_) => ErrorKind::MissingData,
            DashboardError::Config(_) => ErrorKind::Config,
            DashboardError::Cancelled => ErrorKind::Cancelled,
        }
    }
}

/// A failed sub-fetch kept inside a partial aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FetchFailure {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&DashboardError> for FetchFailure {
    fn from(err: &DashboardError) -> Self {
        FetchFailure {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

impl From<DashboardError> for FetchFailure {
    fn from(err: DashboardError) -> Self {
        FetchFailure::from(&err)
    }
}

/// What to do with an error coming back from the wallet after a signed call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalletOutcome {
    /// The wallet redirect flow already handled it.
    Ignored,
    Report(String),
}

pub fn classify_wallet_error(message: &str) -> WalletOutcome {
    if message == FAILED_TO_REDIRECT_MESSAGE {
        WalletOutcome::Ignored
    } else {
        WalletOutcome::Report(message.to_string())
    }
}
