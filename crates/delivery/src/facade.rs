//! The delivery façade. Returns matched campaigns synchronously, then
//! schedules impression telemetry as a detached task — never awaited on
//! the display path.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use tracing::{debug, error};

use adserve_core::config::DeliveryConfig;
use adserve_core::store::CampaignStore;
use adserve_core::types::{AdEvent, Campaign, Placement, UserProfile};
use adserve_targeting::matcher;
use adserve_telemetry::EventPipeline;

pub struct AdDelivery {
    campaigns: Arc<dyn CampaignStore>,
    impressions: Arc<EventPipeline>,
    interactions: Arc<EventPipeline>,
    max_ads_per_placement: usize,
}

impl AdDelivery {
    pub fn new(
        campaigns: Arc<dyn CampaignStore>,
        impressions: Arc<EventPipeline>,
        interactions: Arc<EventPipeline>,
    ) -> Self {
        Self {
            campaigns,
            impressions,
            interactions,
            max_ads_per_placement: DeliveryConfig::default().max_ads_per_placement,
        }
    }

    pub fn with_max_ads(mut self, max_ads_per_placement: usize) -> Self {
        self.max_ads_per_placement = max_ads_per_placement;
        self
    }

    /// Ads to render for one placement on one page, evaluated against
    /// today's date.
    pub async fn ads_for_placement(
        &self,
        profile: &UserProfile,
        page: &str,
        placement: Placement,
    ) -> Vec<Campaign> {
        self.ads_for_placement_on(profile, page, placement, Utc::now().date_naive())
            .await
    }

    /// Same as [`AdDelivery::ads_for_placement`] with an explicit
    /// calendar day, so window boundaries can be exercised without a
    /// clock.
    ///
    /// Store or matcher trouble resolves to an empty list: a failing ad
    /// pipeline must never break the page it is embedded in. Impression
    /// reporting is scheduled only after the returned set is final, and
    /// its outcome never reaches the caller.
    pub async fn ads_for_placement_on(
        &self,
        profile: &UserProfile,
        page: &str,
        placement: Placement,
        today: NaiveDate,
    ) -> Vec<Campaign> {
        let eligible = match self.campaigns.find_eligible(today).await {
            Ok(rows) => rows,
            Err(err) => {
                error!(error = %err, page, "campaign query failed; serving no ads");
                return Vec::new();
            }
        };

        // Store ordering (most recently created first) is preserved; the
        // caller decides how many of the returned ads to render.
        let mut matched: Vec<Campaign> = eligible
            .into_iter()
            .filter(|c| c.placement == placement && matcher::matches(profile, &c.targeting))
            .collect();
        matched.truncate(self.max_ads_per_placement);

        debug!(
            count = matched.len(),
            ?placement,
            page,
            user_id = %profile.user_id,
            "ads selected"
        );

        let batch: Vec<AdEvent> = matched
            .iter()
            .map(|c| AdEvent::impression(&profile.user_id, c, page))
            .collect();
        self.impressions.report_detached(batch);

        matched
    }

    /// Report a click on a served ad. Fire-and-forget.
    pub fn record_click(&self, user_id: &str, campaign: &Campaign, page: &str) {
        self.interactions
            .report_detached(vec![AdEvent::click(user_id, campaign, page)]);
    }

    /// Report a completed view with its watch duration. Fire-and-forget.
    pub fn record_view(&self, user_id: &str, campaign: &Campaign, page: &str, duration_seconds: u32) {
        self.interactions
            .report_detached(vec![AdEvent::view(user_id, campaign, page, duration_seconds)]);
    }
}
