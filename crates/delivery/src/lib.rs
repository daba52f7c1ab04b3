//! Ad delivery façade — orchestrates the campaign store, the targeting
//! matcher, and the resilient event pipeline. Display and telemetry are
//! separate failure domains: a broken ad pipeline never breaks the page
//! it is embedded in.

pub mod facade;
pub mod memory;

use std::sync::Arc;
use std::time::Duration;

use adserve_core::config::AppConfig;
use adserve_core::store::{CampaignStore, EventStore};
use adserve_telemetry::{CircuitBreaker, EventPipeline, RetryPolicy};

pub use facade::AdDelivery;
pub use memory::{MemoryCampaignStore, MemoryEventStore};

/// Wires a façade from configuration. Both pipelines share one
/// process-wide breaker: impressions use the lighter retry policy,
/// clicks and views the general one.
pub fn build(
    config: &AppConfig,
    campaigns: Arc<dyn CampaignStore>,
    events: Arc<dyn EventStore>,
) -> AdDelivery {
    let breaker = Arc::new(CircuitBreaker::new(
        config.breaker.failure_threshold,
        Duration::from_secs(config.breaker.cooldown_secs),
    ));
    let attempt_timeout = Duration::from_millis(config.reporting.attempt_timeout_ms);

    let impressions = Arc::new(
        EventPipeline::new(
            events.clone(),
            breaker.clone(),
            RetryPolicy::new(
                config.impressions.max_retries,
                config.impressions.base_delay_ms,
            ),
        )
        .with_attempt_timeout(attempt_timeout),
    );
    let interactions = Arc::new(
        EventPipeline::new(
            events,
            breaker,
            RetryPolicy::new(config.reporting.max_retries, config.reporting.base_delay_ms),
        )
        .with_attempt_timeout(attempt_timeout),
    );

    AdDelivery::new(campaigns, impressions, interactions)
        .with_max_ads(config.delivery.max_ads_per_placement)
}
