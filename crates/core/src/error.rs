use thiserror::Error;
use uuid::Uuid;

use crate::types::CampaignStatus;

pub type AdServeResult<T> = Result<T, AdServeError>;

/// Failure reported by an external store. The transient/structural split
/// drives the retry-vs-abort decision in the event pipeline.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out after {0}ms")]
    Timeout(u64),

    #[error("store rejected the request: {0}")]
    Rejected(String),

    #[error("unknown campaign: {0}")]
    UnknownCampaign(Uuid),
}

impl StoreError {
    /// Transient failures are worth retrying; structural ones fail the
    /// request immediately.
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Network(_) | StoreError::Timeout(_))
    }
}

#[derive(Error, Debug)]
pub enum AdServeError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("{actor} may not move a campaign from {from:?} to {to:?}")]
    PermissionDenied {
        actor: String,
        from: CampaignStatus,
        to: CampaignStatus,
    },

    #[error("invalid campaign transition from {from:?} to {to:?}")]
    InvalidTransition {
        from: CampaignStatus,
        to: CampaignStatus,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}
