//! Activity statistics.
//!
//! Counts what happened to every observed sample so the user can see how
//! much was sent, throttled or dropped.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Counters for the current session.
#[derive(Debug)]
pub struct ActivityStats {
    samples_observed: AtomicU64,
    heartbeats_sent: AtomicU64,
    throttled: AtomicU64,
    dropped_not_ready: AtomicU64,
    dropped_context_error: AtomicU64,
    delivery_failures: AtomicU64,
    registrations: AtomicU64,
    session_start: DateTime<Utc>,
}

impl ActivityStats {
    pub fn new() -> Self {
        Self {
            samples_observed: AtomicU64::new(0),
            heartbeats_sent: AtomicU64::new(0),
            throttled: AtomicU64::new(0),
            dropped_not_ready: AtomicU64::new(0),
            dropped_context_error: AtomicU64::new(0),
            delivery_failures: AtomicU64::new(0),
            registrations: AtomicU64::new(0),
            session_start: Utc::now(),
        }
    }

    pub fn record_sample(&self) {
        self.samples_observed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_sent(&self) {
        self.heartbeats_sent.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_throttled(&self) {
        self.throttled.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_not_ready(&self) {
        self.dropped_not_ready.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_context_error(&self) {
        self.dropped_context_error.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_delivery_failure(&self) {
        self.delivery_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_registration(&self) {
        self.registrations.fetch_add(1, Ordering::Relaxed);
    }

    /// Get the current statistics.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            samples_observed: self.samples_observed.load(Ordering::Relaxed),
            heartbeats_sent: self.heartbeats_sent.load(Ordering::Relaxed),
            throttled: self.throttled.load(Ordering::Relaxed),
            dropped_not_ready: self.dropped_not_ready.load(Ordering::Relaxed),
            dropped_context_error: self.dropped_context_error.load(Ordering::Relaxed),
            delivery_failures: self.delivery_failures.load(Ordering::Relaxed),
            registrations: self.registrations.load(Ordering::Relaxed),
            session_start: self.session_start,
            session_duration_secs: (Utc::now() - self.session_start).num_seconds().max(0) as u64,
        }
    }

    /// Get a summary string for display.
    pub fn summary(&self) -> String {
        let stats = self.snapshot();
        format!(
            "Activity Statistics:\n\
             - Samples observed: {}\n\
             - Heartbeats sent: {}\n\
             - Throttled: {}\n\
             - Dropped (bucket not ready): {}\n\
             - Dropped (editor context error): {}\n\
             - Delivery failures: {}\n\
             - Bucket registrations: {}\n\
             - Session duration: {} seconds",
            stats.samples_observed,
            stats.heartbeats_sent,
            stats.throttled,
            stats.dropped_not_ready,
            stats.dropped_context_error,
            stats.delivery_failures,
            stats.registrations,
            stats.session_duration_secs
        )
    }
}

impl Default for ActivityStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time copy of the counters.
#[derive(Debug, Clone, Serialize)]
pub struct StatsSnapshot {
    pub samples_observed: u64,
    pub heartbeats_sent: u64,
    pub throttled: u64,
    pub dropped_not_ready: u64,
    pub dropped_context_error: u64,
    pub delivery_failures: u64,
    pub registrations: u64,
    pub session_start: DateTime<Utc>,
    pub session_duration_secs: u64,
}

/// Thread-safe shared stats.
pub type SharedStats = Arc<ActivityStats>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counting() {
        let stats = ActivityStats::new();
        stats.record_sample();
        stats.record_sample();
        stats.record_sent();
        stats.record_throttled();

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.samples_observed, 2);
        assert_eq!(snapshot.heartbeats_sent, 1);
        assert_eq!(snapshot.throttled, 1);
        assert_eq!(snapshot.delivery_failures, 0);
    }

    #[test]
    fn test_summary_format() {
        let summary = ActivityStats::new().summary();
        assert!(summary.contains("Heartbeats sent"));
        assert!(summary.contains("Throttled"));
        assert!(summary.contains("Delivery failures"));
    }

    #[test]
    fn test_summary_covers_this_session_only() {
        let first = ActivityStats::new();
        for _ in 0..5 {
            first.record_sample();
            first.record_sent();
        }

        let second = ActivityStats::new();
        second.record_sample();
        second.record_not_ready();

        let summary = second.summary();
        assert!(summary.contains("Samples observed: 1\n"));
        assert!(summary.contains("Heartbeats sent: 0\n"));
        assert!(summary.contains("Dropped (bucket not ready): 1\n"));
    }
}
