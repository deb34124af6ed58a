//! Heartbeat construction and throttling.

pub mod throttle;
pub mod types;

pub use throttle::{ThrottleState, Throttler, DEFAULT_MAX_HEARTBEATS_PER_SEC};
pub use types::{or_unknown, HeartbeatData, HeartbeatSample, UNKNOWN};
