pub mod client;
pub mod payload;
pub mod scheduler;
pub mod status;
pub mod timing;

use serde::{Deserialize, Serialize};

pub use client::{HttpRelayClient, RelayClient};
pub use scheduler::{RelayScheduler, RelayTicket};
pub use status::StatusSummary;
pub use timing::TimingModel;

/// How the scheduler paces a relay before the outbound request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelayMode {
    Humanized,
    Immediate,
}

impl RelayMode {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "humanized" => Some(RelayMode::Humanized),
            "immediate" => Some(RelayMode::Immediate),
            _ => None,
        }
    }
}

/// Result of one exchange with the external endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayOutcome {
    Success { status_code: u16 },
    Failure { status_code: u16 },
    TransportError { cause: String },
}

impl RelayOutcome {
    /// `200` and `302` are acceptance; every other received status is a rejection.
    pub fn from_status(status_code: u16) -> Self {
        match status_code {
            200 | 302 => RelayOutcome::Success { status_code },
            _ => RelayOutcome::Failure { status_code },
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, RelayOutcome::Success { .. })
    }

    pub fn error(&self) -> Option<RelayError> {
        match self {
            RelayOutcome::Success { .. } => None,
            RelayOutcome::Failure { status_code } => {
                Some(RelayError::EndpointRejected(*status_code))
            }
            RelayOutcome::TransportError { cause } => Some(RelayError::Transport(cause.clone())),
        }
    }
}

#[derive(Debug)]
pub enum RelayError {
    NotFound(String),
    EndpointRejected(u16),
    Transport(String),
    Persistence(String),
}

impl std::fmt::Display for RelayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RelayError::NotFound(msg) => write!(f, "Not found: {msg}"),
            RelayError::EndpointRejected(code) => write!(f, "Endpoint rejected with status {code}"),
            RelayError::Transport(msg) => write!(f, "Transport failure: {msg}"),
            RelayError::Persistence(msg) => write!(f, "Persistence failure: {msg}"),
        }
    }
}

impl std::error::Error for RelayError {}

impl From<crate::db::StoreError> for RelayError {
    fn from(err: crate::db::StoreError) -> Self {
        RelayError::Persistence(err.to_string())
    }
}

impl From<crate::files::FileError> for RelayError {
    fn from(err: crate::files::FileError) -> Self {
        match err {
            crate::files::FileError::NotFound(reference)
            | crate::files::FileError::InvalidName(reference) => RelayError::NotFound(reference),
            crate::files::FileError::Io(e) => RelayError::Transport(e.to_string()),
        }
    }
}
