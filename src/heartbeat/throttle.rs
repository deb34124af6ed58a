//! Heartbeat rate limiting.
//!
//! A sample becomes a heartbeat when it changes the file or branch, or when
//! the throttle window (`1000 / max_heartbeats_per_sec` milliseconds) since
//! the last heartbeat has elapsed. Context switches are never throttled.

use crate::heartbeat::types::HeartbeatSample;

/// Default rate ceiling.
pub const DEFAULT_MAX_HEARTBEATS_PER_SEC: f64 = 1.0;

/// Memory of the last accepted sample.
#[derive(Debug, Clone, PartialEq)]
pub struct ThrottleState {
    /// File of the last heartbeat ("" before the first one)
    pub last_file_path: String,
    /// Branch of the last heartbeat ("" before the first one)
    pub last_branch: String,
    /// Time of the last heartbeat, milliseconds since the Unix epoch
    pub last_heartbeat_ms: i64,
    /// Configured rate ceiling
    pub max_heartbeats_per_sec: f64,
}

impl Default for ThrottleState {
    fn default() -> Self {
        Self {
            last_file_path: String::new(),
            last_branch: String::new(),
            last_heartbeat_ms: 0,
            max_heartbeats_per_sec: DEFAULT_MAX_HEARTBEATS_PER_SEC,
        }
    }
}

impl ThrottleState {
    /// Minimum spacing between heartbeats in the same context.
    ///
    /// A rate of zero yields an infinite window.
    pub fn window_ms(&self) -> f64 {
        1000.0 / self.max_heartbeats_per_sec
    }
}

/// Decides which samples are emitted as heartbeats.
#[derive(Debug, Default)]
pub struct Throttler {
    state: ThrottleState,
}

impl Throttler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a throttler with an explicit rate ceiling.
    pub fn with_rate(max_heartbeats_per_sec: f64) -> Self {
        Self {
            state: ThrottleState {
                max_heartbeats_per_sec,
                ..ThrottleState::default()
            },
        }
    }

    /// Read-only view of the current state.
    pub fn state(&self) -> &ThrottleState {
        &self.state
    }

    /// Apply a configured rate.
    ///
    /// Absent or falsy values (`None`, zero, NaN) keep the current rate.
    /// Negative and infinite values are ignored as well.
    pub fn load_configuration(&mut self, max_heartbeats_per_sec: Option<f64>) {
        let Some(rate) = max_heartbeats_per_sec else {
            return;
        };
        if rate == 0.0 || rate.is_nan() {
            return;
        }
        if rate < 0.0 || rate.is_infinite() {
            tracing::warn!(rate, "ignoring invalid maxHeartbeatsPerSec");
            return;
        }
        self.state.max_heartbeats_per_sec = rate;
    }

    /// Whether `sample` passes the policy against the current state.
    ///
    /// Pure: never mutates state.
    pub fn should_emit(&self, sample: &HeartbeatSample) -> bool {
        let state = &self.state;
        sample.file() != state.last_file_path
            || sample.branch() != state.last_branch
            || (state.last_heartbeat_ms as f64) + state.window_ms()
                < sample.timestamp_millis() as f64
    }

    /// Evaluate `sample` and, if accepted, record it as the last heartbeat.
    ///
    /// Returns `true` when the caller should deliver the sample.
    pub fn admit(&mut self, sample: &HeartbeatSample) -> bool {
        if !self.should_emit(sample) {
            return false;
        }
        self.state.last_file_path = sample.file().to_string();
        self.state.last_branch = sample.branch().to_string();
        self.state.last_heartbeat_ms = sample.timestamp_millis();
        true
    }
}
