//! Interfaces to the external campaign and event stores. The pipeline
//! owns neither; it only queries, mutates, and appends.

use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::error::StoreError;
use crate::types::{AdEvent, Campaign, CampaignStatus};

/// Persistent campaign records.
#[async_trait]
pub trait CampaignStore: Send + Sync {
    /// Campaigns with `status == active` whose window contains `today`.
    /// Both filters are pushed to the store; rows come back most
    /// recently created first.
    async fn find_eligible(&self, today: NaiveDate) -> Result<Vec<Campaign>, StoreError>;

    /// Persist a status change. Unknown ids are rejected with
    /// [`StoreError::UnknownCampaign`].
    async fn set_status(&self, id: Uuid, status: CampaignStatus) -> Result<(), StoreError>;
}

/// Append-only sink for impression/click/view records. No update, no
/// delete, no uniqueness constraint.
#[async_trait]
pub trait EventStore: Send + Sync {
    async fn insert_events(&self, records: &[AdEvent]) -> Result<(), StoreError>;
}
