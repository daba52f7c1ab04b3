//! Event reporting pipeline. Fire-and-forget from the caller's
//! perspective: all outcomes stay inside the pipeline, logged and
//! counted for diagnostics only. Dropped batches are permanently lost;
//! that is the documented trade-off for analytics-grade telemetry.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use adserve_core::error::StoreError;
use adserve_core::store::EventStore;
use adserve_core::types::AdEvent;

use crate::breaker::CircuitBreaker;
use crate::retry::RetryPolicy;

/// Platform connectivity signal consulted before each send. A
/// known-offline probe turns `report` into a silent no-op that does not
/// charge the breaker.
pub trait ConnectivityProbe: Send + Sync {
    fn is_online(&self) -> bool;
}

/// Probe used when the platform offers no reachability signal: assume
/// online and rely on retry/backoff alone.
pub struct AlwaysOnline;

impl ConnectivityProbe for AlwaysOnline {
    fn is_online(&self) -> bool {
        true
    }
}

/// Outcome of one `report` call. Diagnostic only; callers never see an
/// error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportOutcome {
    Delivered,
    SkippedBreakerOpen,
    SkippedOffline,
    Dropped,
}

const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(3);

pub struct EventPipeline {
    store: Arc<dyn EventStore>,
    breaker: Arc<CircuitBreaker>,
    probe: Arc<dyn ConnectivityProbe>,
    policy: RetryPolicy,
    attempt_timeout: Duration,
}

impl EventPipeline {
    pub fn new(store: Arc<dyn EventStore>, breaker: Arc<CircuitBreaker>, policy: RetryPolicy) -> Self {
        Self {
            store,
            breaker,
            probe: Arc::new(AlwaysOnline),
            policy,
            attempt_timeout: DEFAULT_ATTEMPT_TIMEOUT,
        }
    }

    pub fn with_probe(mut self, probe: Arc<dyn ConnectivityProbe>) -> Self {
        self.probe = probe;
        self
    }

    pub fn with_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = timeout;
        self
    }

    /// The process-wide breaker this pipeline reports through.
    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    /// Hand a batch to a detached background task and return
    /// immediately. The task runs to completion (success, exhausted
    /// retries, or breaker short-circuit); nothing propagates back.
    pub fn report_detached(self: &Arc<Self>, batch: Vec<AdEvent>) {
        if batch.is_empty() {
            return;
        }
        let pipeline = Arc::clone(self);
        tokio::spawn(async move {
            pipeline.report(batch).await;
        });
    }

    /// Submit a batch, retrying transient store failures with
    /// exponential backoff. Structural failures abort immediately. The
    /// batch is dropped once retries are exhausted or the breaker is
    /// open.
    pub async fn report(&self, batch: Vec<AdEvent>) -> ReportOutcome {
        if batch.is_empty() {
            return ReportOutcome::Delivered;
        }

        if !self.breaker.allow() {
            metrics::counter!("events.skipped_breaker").increment(batch.len() as u64);
            debug!(count = batch.len(), "event batch skipped: circuit open");
            return ReportOutcome::SkippedBreakerOpen;
        }

        for attempt in 0..self.policy.total_attempts() {
            if attempt > 0 {
                tokio::time::sleep(self.policy.delay_for_attempt(attempt - 1)).await;
            }

            // Consulted before every attempt: the device may drop
            // offline between retries. Known-offline is not a store
            // failure; the breaker is not charged for it.
            if !self.probe.is_online() {
                debug!(count = batch.len(), attempt, "event batch skipped: offline");
                return ReportOutcome::SkippedOffline;
            }

            match self.try_insert(&batch).await {
                Ok(()) => {
                    self.breaker.record_success();
                    metrics::counter!("events.delivered").increment(batch.len() as u64);
                    debug!(count = batch.len(), attempt, "event batch delivered");
                    return ReportOutcome::Delivered;
                }
                Err(err) if err.is_transient() => {
                    warn!(error = %err, attempt, "transient event store failure");
                }
                Err(err) => {
                    self.breaker.record_failure();
                    metrics::counter!("events.dropped").increment(batch.len() as u64);
                    warn!(
                        error = %err,
                        count = batch.len(),
                        "event batch rejected by store; dropped without retry"
                    );
                    return ReportOutcome::Dropped;
                }
            }
        }

        self.breaker.record_failure();
        metrics::counter!("events.dropped").increment(batch.len() as u64);
        warn!(count = batch.len(), "event batch dropped after exhausting retries");
        ReportOutcome::Dropped
    }

    /// One store write, bounded so a hung attempt counts as a transient
    /// failure instead of stalling the task.
    async fn try_insert(&self, batch: &[AdEvent]) -> Result<(), StoreError> {
        match tokio::time::timeout(self.attempt_timeout, self.store.insert_events(batch)).await {
            Ok(result) => result,
            Err(_) => Err(StoreError::Timeout(self.attempt_timeout.as_millis() as u64)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adserve_core::types::{AdEventType, Placement};
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
    use uuid::Uuid;

    fn event() -> AdEvent {
        AdEvent {
            user_id: "u-1".to_string(),
            ad_id: Uuid::new_v4(),
            event_type: AdEventType::Impression,
            placement: Placement::Sidebar,
            page: "/home".to_string(),
            duration_seconds: None,
            timestamp: Utc::now(),
        }
    }

    /// Fails the first `failures_before_success` inserts, then succeeds.
    struct FlakyStore {
        attempts: AtomicU32,
        failures_before_success: u32,
        error: StoreError,
    }

    impl FlakyStore {
        fn new(failures_before_success: u32, error: StoreError) -> Self {
            Self {
                attempts: AtomicU32::new(0),
                failures_before_success,
                error,
            }
        }

        fn attempts(&self) -> u32 {
            self.attempts.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl EventStore for FlakyStore {
        async fn insert_events(&self, _records: &[AdEvent]) -> Result<(), StoreError> {
            let n = self.attempts.fetch_add(1, Ordering::SeqCst);
            if n < self.failures_before_success {
                Err(self.error.clone())
            } else {
                Ok(())
            }
        }
    }

    struct TogglingProbe {
        online: AtomicBool,
    }

    impl ConnectivityProbe for TogglingProbe {
        fn is_online(&self) -> bool {
            self.online.load(Ordering::SeqCst)
        }
    }

    fn fast_policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy::new(max_retries, 1)
    }

    fn network_error() -> StoreError {
        StoreError::Network("connection reset".to_string())
    }

    #[tokio::test]
    async fn test_transient_failures_are_retried_to_success() {
        let store = Arc::new(FlakyStore::new(2, network_error()));
        let pipeline = EventPipeline::new(
            store.clone(),
            Arc::new(CircuitBreaker::default()),
            fast_policy(3),
        );

        let outcome = pipeline.report(vec![event()]).await;
        assert_eq!(outcome, ReportOutcome::Delivered);
        assert_eq!(store.attempts(), 3);
        assert_eq!(pipeline.breaker().snapshot().consecutive_failures, 0);
    }

    #[tokio::test]
    async fn test_exhausted_retries_drop_the_batch() {
        let store = Arc::new(FlakyStore::new(u32::MAX, network_error()));
        let pipeline = EventPipeline::new(
            store.clone(),
            Arc::new(CircuitBreaker::default()),
            fast_policy(2),
        );

        let outcome = pipeline.report(vec![event()]).await;
        assert_eq!(outcome, ReportOutcome::Dropped);
        // max_retries + 1 total attempts.
        assert_eq!(store.attempts(), 3);
        assert_eq!(pipeline.breaker().snapshot().consecutive_failures, 1);
    }

    #[tokio::test]
    async fn test_structural_failure_does_not_retry() {
        let store = Arc::new(FlakyStore::new(
            u32::MAX,
            StoreError::Rejected("malformed payload".to_string()),
        ));
        let pipeline = EventPipeline::new(
            store.clone(),
            Arc::new(CircuitBreaker::default()),
            fast_policy(3),
        );

        let outcome = pipeline.report(vec![event()]).await;
        assert_eq!(outcome, ReportOutcome::Dropped);
        assert_eq!(store.attempts(), 1);
        assert_eq!(pipeline.breaker().snapshot().consecutive_failures, 1);
    }

    #[tokio::test]
    async fn test_probe_consulted_before_each_attempt() {
        // The device drops offline after the first failed attempt:
        // remaining retries are skipped and the breaker is not charged
        // for a known-offline state.
        struct OfflineDroppingStore {
            attempts: AtomicU32,
            probe: Arc<TogglingProbe>,
        }

        #[async_trait]
        impl EventStore for OfflineDroppingStore {
            async fn insert_events(&self, _records: &[AdEvent]) -> Result<(), StoreError> {
                self.attempts.fetch_add(1, Ordering::SeqCst);
                self.probe.online.store(false, Ordering::SeqCst);
                Err(StoreError::Network("connection reset".to_string()))
            }
        }

        let probe = Arc::new(TogglingProbe {
            online: AtomicBool::new(true),
        });
        let store = Arc::new(OfflineDroppingStore {
            attempts: AtomicU32::new(0),
            probe: probe.clone(),
        });
        let pipeline = EventPipeline::new(
            store.clone(),
            Arc::new(CircuitBreaker::default()),
            fast_policy(2),
        )
        .with_probe(probe);

        let outcome = pipeline.report(vec![event()]).await;
        assert_eq!(outcome, ReportOutcome::SkippedOffline);
        assert_eq!(store.attempts.load(Ordering::SeqCst), 1);
        assert_eq!(pipeline.breaker().snapshot().consecutive_failures, 0);
    }

    #[tokio::test]
    async fn test_breaker_short_circuits_after_consecutive_failures() {
        let store = Arc::new(FlakyStore::new(u32::MAX, network_error()));
        let breaker = Arc::new(CircuitBreaker::new(3, Duration::from_secs(300)));
        let pipeline = EventPipeline::new(store.clone(), breaker, fast_policy(0));

        for _ in 0..3 {
            assert_eq!(pipeline.report(vec![event()]).await, ReportOutcome::Dropped);
        }
        let attempts_before = store.attempts();
        assert_eq!(attempts_before, 3);

        // 4th call: zero network attempts.
        let outcome = pipeline.report(vec![event()]).await;
        assert_eq!(outcome, ReportOutcome::SkippedBreakerOpen);
        assert_eq!(store.attempts(), attempts_before);
    }

    #[tokio::test]
    async fn test_breaker_recovers_after_cooldown() {
        let store = Arc::new(FlakyStore::new(1, network_error()));
        let breaker = Arc::new(CircuitBreaker::new(1, Duration::ZERO));
        let pipeline = EventPipeline::new(store.clone(), breaker, fast_policy(0));

        assert_eq!(pipeline.report(vec![event()]).await, ReportOutcome::Dropped);

        // Cooldown elapsed: the next call attempts again and succeeds.
        assert_eq!(pipeline.report(vec![event()]).await, ReportOutcome::Delivered);
        let snapshot = pipeline.breaker().snapshot();
        assert!(snapshot.enabled);
        assert_eq!(snapshot.consecutive_failures, 0);
    }

    #[tokio::test]
    async fn test_offline_probe_skips_without_charging_breaker() {
        let store = Arc::new(FlakyStore::new(0, network_error()));
        let probe = Arc::new(TogglingProbe {
            online: AtomicBool::new(false),
        });
        let pipeline = EventPipeline::new(
            store.clone(),
            Arc::new(CircuitBreaker::default()),
            fast_policy(3),
        )
        .with_probe(probe.clone());

        let outcome = pipeline.report(vec![event()]).await;
        assert_eq!(outcome, ReportOutcome::SkippedOffline);
        assert_eq!(store.attempts(), 0);
        assert_eq!(pipeline.breaker().snapshot().consecutive_failures, 0);

        probe.online.store(true, Ordering::SeqCst);
        assert_eq!(pipeline.report(vec![event()]).await, ReportOutcome::Delivered);
    }

    #[tokio::test]
    async fn test_hung_attempt_times_out_as_transient() {
        struct HangingStore;

        #[async_trait]
        impl EventStore for HangingStore {
            async fn insert_events(&self, _records: &[AdEvent]) -> Result<(), StoreError> {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(())
            }
        }

        let pipeline = EventPipeline::new(
            Arc::new(HangingStore),
            Arc::new(CircuitBreaker::default()),
            fast_policy(0),
        )
        .with_attempt_timeout(Duration::from_millis(10));

        let outcome = pipeline.report(vec![event()]).await;
        assert_eq!(outcome, ReportOutcome::Dropped);
    }

    #[tokio::test]
    async fn test_detached_report_completes_in_background() {
        let store = Arc::new(FlakyStore::new(0, network_error()));
        let pipeline = Arc::new(EventPipeline::new(
            store.clone(),
            Arc::new(CircuitBreaker::default()),
            fast_policy(0),
        ));

        pipeline.report_detached(vec![event(), event()]);

        for _ in 0..50 {
            if store.attempts() > 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(store.attempts(), 1);
    }
}
