//! Circuit breaker guarding the event store. After repeated failed
//! writes the pipeline stops attempting sends until a cooldown has
//! passed, so a failing backend is never hammered.

use parking_lot::Mutex;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Point-in-time view of the breaker, for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreakerSnapshot {
    pub enabled: bool,
    pub consecutive_failures: u32,
}

struct BreakerState {
    enabled: bool,
    consecutive_failures: u32,
    tripped_at: Option<Instant>,
}

/// Process-wide breaker shared by every pipeline instance. All mutation
/// happens under one lock so concurrent placements can never over- or
/// under-trip it.
pub struct CircuitBreaker {
    threshold: u32,
    cooldown: Duration,
    state: Mutex<BreakerState>,
}

impl CircuitBreaker {
    pub const DEFAULT_THRESHOLD: u32 = 3;
    pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(300);

    pub fn new(threshold: u32, cooldown: Duration) -> Self {
        Self {
            threshold,
            cooldown,
            state: Mutex::new(BreakerState {
                enabled: true,
                consecutive_failures: 0,
                tripped_at: None,
            }),
        }
    }

    /// True when a send may be attempted. Once the cooldown has elapsed
    /// since the trip, the breaker re-enables itself and clears the
    /// failure count.
    pub fn allow(&self) -> bool {
        let mut state = self.state.lock();
        if !state.enabled {
            let cooled = state
                .tripped_at
                .map(|t| t.elapsed() >= self.cooldown)
                .unwrap_or(true);
            if cooled {
                state.enabled = true;
                state.consecutive_failures = 0;
                state.tripped_at = None;
                info!("event pipeline circuit re-enabled after cooldown");
            }
        }
        state.enabled
    }

    /// A write (after any retries) succeeded.
    pub fn record_success(&self) {
        let mut state = self.state.lock();
        state.consecutive_failures = 0;
    }

    /// A write failed after exhausting its retries. A failure recorded
    /// while already tripped is ignored; the original cooldown is not
    /// extended.
    pub fn record_failure(&self) {
        let mut state = self.state.lock();
        if !state.enabled {
            return;
        }
        state.consecutive_failures += 1;
        if state.consecutive_failures >= self.threshold {
            state.enabled = false;
            state.tripped_at = Some(Instant::now());
            warn!(
                failures = state.consecutive_failures,
                cooldown_secs = self.cooldown.as_secs(),
                "event pipeline circuit tripped"
            );
        }
    }

    pub fn snapshot(&self) -> BreakerSnapshot {
        let state = self.state.lock();
        BreakerSnapshot {
            enabled: state.enabled,
            consecutive_failures: state.consecutive_failures,
        }
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new(Self::DEFAULT_THRESHOLD, Self::DEFAULT_COOLDOWN)
    }
}
