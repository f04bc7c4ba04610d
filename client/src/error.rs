use std::io;
use std::path::PathBuf;

use civic_core::JoinEligibility;
use thiserror::Error;

use crate::draft::DraftErrors;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("API unreachable: {0}")]
    Unreachable(#[source] reqwest::Error),

    #[error("API returned {status} ({code}): {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    #[error("Unexpected API response: {0}")]
    Decode(String),

    #[error("Sign in required")]
    MissingSession,

    #[error("Failed to read snapshot {path:?}")]
    SnapshotIo {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Snapshot is not a JSON array of events")]
    SnapshotFormat(#[from] serde_json::Error),

    #[error("Cannot join: {0}")]
    NotJoinable(JoinEligibility),

    #[error("Event '{0}' not found")]
    NotFound(String),

    #[error("Invalid event: {0}")]
    InvalidDraft(#[from] DraftErrors),

    #[error("{primary}; fallback failed too: {fallback}")]
    Exhausted {
        primary: Box<ClientError>,
        fallback: Box<ClientError>,
    },
}

impl ClientError {
    pub fn is_not_found(&self) -> bool {
        match self {
            ClientError::NotFound(_) => true,
            ClientError::Api { status, .. } => *status == 404,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ClientError::Decode(err.to_string())
        } else {
            ClientError::Unreachable(err)
        }
    }
}
