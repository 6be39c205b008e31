//! Delivery diagnostics.
//!
//! # Responsibilities
//! - Record the outcome of every handler invocation
//! - Keep aggregate and per-subscriber failure counts
//! - Retain a bounded window of recent outcomes for inspection

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use dashmap::DashMap;

use super::types::EventType;
use crate::observability::metrics;

const RECENT_CAPACITY: usize = 64;

/// Result of delivering one event to one subscriber.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryOutcome {
    pub event: EventType,
    pub subscriber: String,
    /// `None` on success, the rendered handler error otherwise.
    pub error: Option<String>,
}

impl DeliveryOutcome {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Counters fed by the event bus after each handler invocation.
#[derive(Debug, Default)]
pub struct DeliveryStats {
    delivered: AtomicU64,
    failed: AtomicU64,
    failures_by_subscriber: DashMap<String, u64>,
    recent: Mutex<VecDeque<DeliveryOutcome>>,
}

impl DeliveryStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, outcome: DeliveryOutcome) {
        metrics::record_event_delivery(
            outcome.event.as_str(),
            &outcome.subscriber,
            outcome.is_success(),
        );

        if outcome.is_success() {
            self.delivered.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failed.fetch_add(1, Ordering::Relaxed);
            *self
                .failures_by_subscriber
                .entry(outcome.subscriber.clone())
                .or_insert(0) += 1;
        }

        let mut recent = self.recent.lock().unwrap_or_else(PoisonError::into_inner);
        if recent.len() == RECENT_CAPACITY {
            recent.pop_front();
        }
        recent.push_back(outcome);
    }

    /// Successful handler invocations.
    pub fn delivered(&self) -> u64 {
        self.delivered.load(Ordering::Relaxed)
    }

    /// Failed or panicked handler invocations.
    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    pub fn failures_for(&self, subscriber: &str) -> u64 {
        self.failures_by_subscriber
            .get(subscriber)
            .map(|count| *count)
            .unwrap_or(0)
    }

    /// Most recent outcomes, oldest first.
    pub fn recent(&self) -> Vec<DeliveryOutcome> {
        self.recent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(subscriber: &str, error: Option<&str>) -> DeliveryOutcome {
        DeliveryOutcome {
            event: EventType::SendWelcomeMail,
            subscriber: subscriber.to_string(),
            error: error.map(str::to_string),
        }
    }

    #[test]
    fn test_counts_by_outcome() {
        let stats = DeliveryStats::new();
        stats.record(outcome("mailer", None));
        stats.record(outcome("mailer", Some("smtp down")));
        stats.record(outcome("audit", Some("disk full")));

        assert_eq!(stats.delivered(), 1);
        assert_eq!(stats.failed(), 2);
        assert_eq!(stats.failures_for("mailer"), 1);
        assert_eq!(stats.failures_for("audit"), 1);
        assert_eq!(stats.failures_for("nobody"), 0);
    }

    #[test]
    fn test_recent_window_is_bounded() {
        let stats = DeliveryStats::new();
        for i in 0..(RECENT_CAPACITY + 5) {
            stats.record(outcome(&format!("s{i}"), None));
        }

        let recent = stats.recent();
        assert_eq!(recent.len(), RECENT_CAPACITY);
        assert_eq!(recent[0].subscriber, "s5");
    }
}
