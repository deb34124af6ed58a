//! Heartbeat event types.
//!
//! A heartbeat marks a single point of editor activity. The tracking server
//! merges consecutive heartbeats with equal data into intervals.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Placeholder used for every field whose real value is unavailable.
pub const UNKNOWN: &str = "unknown";

/// Normalize an optional value to a non-empty string.
pub fn or_unknown(value: Option<String>) -> String {
    match value {
        Some(v) if !v.is_empty() => v,
        _ => UNKNOWN.to_string(),
    }
}

/// Editor context carried by a heartbeat.
///
/// Every field is non-empty; absent values are [`UNKNOWN`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeartbeatData {
    pub language: String,
    pub project: String,
    pub file: String,
    pub branch: String,
}

impl HeartbeatData {
    /// Build the data block, replacing missing values with [`UNKNOWN`].
    pub fn new(
        language: Option<String>,
        project: Option<String>,
        file: Option<String>,
        branch: Option<String>,
    ) -> Self {
        Self {
            language: or_unknown(language),
            project: or_unknown(project),
            file: or_unknown(file),
            branch: or_unknown(branch),
        }
    }
}

/// A snapshot of editor activity, serialized as an ActivityWatch event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeartbeatSample {
    /// Instant of observation
    pub timestamp: DateTime<Utc>,
    /// Always zero: heartbeats mark a point, not an interval
    pub duration: f64,
    /// Editor context
    pub data: HeartbeatData,
}

impl HeartbeatSample {
    /// Create a sample observed at `timestamp`.
    pub fn new(timestamp: DateTime<Utc>, data: HeartbeatData) -> Self {
        Self {
            timestamp,
            duration: 0.0,
            data,
        }
    }

    /// Create a sample observed now.
    pub fn now(data: HeartbeatData) -> Self {
        Self::new(Utc::now(), data)
    }

    pub fn file(&self) -> &str {
        &self.data.file
    }

    pub fn branch(&self) -> &str {
        &self.data.branch
    }

    /// Observation time in milliseconds since the Unix epoch.
    pub fn timestamp_millis(&self) -> i64 {
        self.timestamp.timestamp_millis()
    }
}
