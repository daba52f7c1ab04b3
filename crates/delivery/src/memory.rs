//! In-memory store implementations, used by integration tests and local
//! demos. The event store supports failure injection so the pipeline's
//! resilience can be exercised end to end.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::NaiveDate;
use dashmap::DashMap;
use parking_lot::Mutex;
use uuid::Uuid;

use adserve_core::error::StoreError;
use adserve_core::store::{CampaignStore, EventStore};
use adserve_core::types::{AdEvent, Campaign, CampaignStatus};

#[derive(Default)]
pub struct MemoryCampaignStore {
    campaigns: DashMap<Uuid, Campaign>,
}

impl MemoryCampaignStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, campaign: Campaign) {
        self.campaigns.insert(campaign.id, campaign);
    }

    pub fn get(&self, id: &Uuid) -> Option<Campaign> {
        self.campaigns.get(id).map(|c| c.value().clone())
    }
}

#[async_trait]
impl CampaignStore for MemoryCampaignStore {
    async fn find_eligible(&self, today: NaiveDate) -> Result<Vec<Campaign>, StoreError> {
        let mut rows: Vec<Campaign> = self
            .campaigns
            .iter()
            .filter(|e| {
                e.value().status == CampaignStatus::Active && e.value().window.contains(today)
            })
            .map(|e| e.value().clone())
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn set_status(&self, id: Uuid, status: CampaignStatus) -> Result<(), StoreError> {
        match self.campaigns.get_mut(&id) {
            Some(mut entry) => {
                entry.value_mut().status = status;
                Ok(())
            }
            None => Err(StoreError::UnknownCampaign(id)),
        }
    }
}

/// Append-only event sink with failure injection.
#[derive(Default)]
pub struct MemoryEventStore {
    events: Mutex<Vec<AdEvent>>,
    fail_with: Mutex<Option<StoreError>>,
    attempts: AtomicU64,
}

impl MemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent insert fail with `error`; `None` restores
    /// normal operation.
    pub fn fail_with(&self, error: Option<StoreError>) {
        *self.fail_with.lock() = error;
    }

    pub fn events(&self) -> Vec<AdEvent> {
        self.events.lock().clone()
    }

    pub fn attempts(&self) -> u64 {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EventStore for MemoryEventStore {
    async fn insert_events(&self, records: &[AdEvent]) -> Result<(), StoreError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.fail_with.lock().clone() {
            return Err(err);
        }
        self.events.lock().extend_from_slice(records);
        Ok(())
    }
}
