use shared::error::ValidationErrors;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("generation transport is unavailable")]
    Unavailable,
    #[error("invalid generation endpoint '{endpoint}': {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },
    #[error("generation request failed: {0}")]
    Network(String),
    #[error("generation service responded with status {status}")]
    Status { status: u16, body: String },
    #[error("malformed generation response: {0}")]
    MalformedBody(String),
}

impl TransportError {
    /// The service answers 403 once the free allowance is used up.
    pub fn is_quota_exhausted(&self) -> bool {
        matches!(self, Self::Status { status: 403, .. })
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(value: reqwest::Error) -> Self {
        Self::Network(value.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    #[error(transparent)]
    Invalid(#[from] ValidationErrors),
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// How a transport failure is reported back to the caller of `submit`.
/// Either way the failure is logged and kept as the controller's last failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Absorb the failure and return `SubmitOutcome::FailureAbsorbed`.
    #[default]
    Silent,
    /// Return the failure as `SubmitError::Transport`.
    Surface,
}
