//! # Circuit Breaker Module
//!
//! This module implements the circuit breaker pattern for external recipe
//! sources. When a source fails repeatedly the breaker opens and requests fail
//! fast, so a rate-limited or unreachable provider does not add its timeout to
//! every search.

use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::search_config::RecoveryConfig;

#[derive(Debug, Default)]
struct BreakerState {
    failure_count: u32,
    last_failure_time: Option<Instant>,
}

/// Circuit breaker guarding one external source
///
/// # State Machine
///
/// - **Closed**: Normal operation, requests pass through
/// - **Open**: Failure threshold exceeded, requests fail fast
/// - **Half-Open**: Reset timeout elapsed, the next request is let through
///
/// # Configuration
///
/// Uses `RecoveryConfig` for:
/// - `circuit_breaker_threshold`: Failures before opening (default: 5)
/// - `circuit_breaker_reset_secs`: Time before attempting reset (default: 60s)
#[derive(Debug)]
pub struct CircuitBreaker {
    name: String,
    state: Mutex<BreakerState>,
    threshold: u32,
    reset_after: Duration,
}

impl CircuitBreaker {
    /// Create a new circuit breaker for the named source
    ///
    /// # Examples
    ///
    /// ```rust
    /// use pantry_recipes::circuit_breaker::CircuitBreaker;
    /// use pantry_recipes::search_config::RecoveryConfig;
    ///
    /// let breaker = CircuitBreaker::new("live search", &RecoveryConfig::default());
    /// assert!(!breaker.is_open());
    /// ```
    pub fn new(name: impl Into<String>, config: &RecoveryConfig) -> Self {
        Self {
            name: name.into(),
            state: Mutex::new(BreakerState::default()),
            threshold: config.circuit_breaker_threshold.max(1),
            reset_after: Duration::from_secs(config.circuit_breaker_reset_secs),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    // A panic while holding the lock leaves only counters behind, which stay usable
    fn lock_state(&self) -> MutexGuard<'_, BreakerState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Check if the breaker is open (blocking requests)
    ///
    /// Automatically moves back to closed once the reset timeout has elapsed.
    pub fn is_open(&self) -> bool {
        let mut state = self.lock_state();

        if state.failure_count < self.threshold {
            return false;
        }

        match state.last_failure_time {
            Some(last_time) if last_time.elapsed() < self.reset_after => true,
            _ => {
                info!(source = %self.name, "Circuit breaker reset after cool-down");
                *state = BreakerState::default();
                false
            }
        }
    }

    /// Record a failed call
    pub fn record_failure(&self) {
        let mut state = self.lock_state();
        state.failure_count += 1;
        state.last_failure_time = Some(Instant::now());

        if state.failure_count == self.threshold {
            warn!(
                source = %self.name,
                failures = state.failure_count,
                "Circuit breaker opened"
            );
        }
    }

    /// Record a successful call, closing the breaker
    pub fn record_success(&self) {
        *self.lock_state() = BreakerState::default();
    }
}
