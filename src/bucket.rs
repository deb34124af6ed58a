//! Bucket identity and registration.
//!
//! Every heartbeat goes into one server-side bucket whose id is derived from
//! the editor's short name and the host name. No heartbeat may be sent until
//! the bucket is known to exist.

use crate::client::{ClientError, EnsureBucket, TrackingClient};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// Event type tag of editor activity buckets.
pub const EVENT_TYPE: &str = "app.editor.activity";

/// Prefix of the client name; the app short name is appended.
pub const CLIENT_NAME_PREFIX: &str = "aw-watcher-vscode-";

/// Short names of well-known editor builds.
const KNOWN_APPS: &[(&str, &str)] = &[
    ("Visual Studio Code", "vscode"),
    ("Visual Studio Code - Insiders", "vscode-insiders"),
    ("Cursor", "cursor"),
    ("Windsurf", "windsurf"),
    ("Antigravity", "antigravity"),
];

/// Resolve the bucket suffix for an editor.
///
/// A non-blank `suffix_override` wins, then the known-app table, then the
/// app name lowercased with whitespace runs collapsed into single hyphens.
pub fn app_short_name(app_name: &str, suffix_override: Option<&str>) -> String {
    if let Some(suffix) = suffix_override {
        if !suffix.trim().is_empty() {
            return suffix.to_string();
        }
    }

    if let Some((_, short)) = KNOWN_APPS.iter().find(|(name, _)| *name == app_name) {
        return short.to_string();
    }

    let mut slug = String::with_capacity(app_name.len());
    let mut in_whitespace = false;
    for c in app_name.to_lowercase().chars() {
        if c.is_whitespace() {
            if !in_whitespace {
                slug.push('-');
            }
            in_whitespace = true;
        } else {
            slug.push(c);
            in_whitespace = false;
        }
    }
    slug
}

/// One logical event stream on the tracking server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Bucket {
    pub id: String,
    pub host_name: String,
    pub client_name: String,
    pub event_type: String,
}

impl Bucket {
    /// Derive the bucket for an editor running on `host_name`.
    pub fn new(app_name: &str, host_name: &str, suffix_override: Option<&str>) -> Self {
        let client_name = format!(
            "{CLIENT_NAME_PREFIX}{}",
            app_short_name(app_name, suffix_override)
        );
        Self::from_parts(client_name, host_name.to_string())
    }

    /// Build a bucket from an explicit client name.
    pub fn from_parts(client_name: String, host_name: String) -> Self {
        Self {
            id: format!("{client_name}_{host_name}"),
            host_name,
            client_name,
            event_type: EVENT_TYPE.to_string(),
        }
    }
}

/// Host name of this machine, or "unknown".
pub fn local_host_name() -> String {
    hostname::get()
        .map(|h| h.to_string_lossy().to_string())
        .unwrap_or_else(|_| crate::heartbeat::UNKNOWN.to_string())
}

/// Outcome of a successful registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    Created,
    AlreadyExisted,
    /// A newer attempt started before this one finished; its result was discarded
    Superseded,
}

impl From<EnsureBucket> for Registration {
    fn from(result: EnsureBucket) -> Self {
        if result.already_existed {
            Registration::AlreadyExisted
        } else {
            Registration::Created
        }
    }
}

/// Gate that opens once the bucket exists on the server.
///
/// Clones share the same gate, so a registration running on a background
/// task is observed by the event loop. Only the most recently started attempt
/// may move the gate.
#[derive(Debug, Clone)]
pub struct BucketRegistrar {
    bucket: Bucket,
    ready: Arc<AtomicBool>,
    latest_attempt: Arc<AtomicU64>,
}

impl BucketRegistrar {
    pub fn new(bucket: Bucket) -> Self {
        Self {
            bucket,
            ready: Arc::new(AtomicBool::new(false)),
            latest_attempt: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn bucket(&self) -> &Bucket {
        &self.bucket
    }

    /// Whether heartbeats may be sent.
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    /// Start a new attempt, superseding any attempt still in flight.
    pub fn begin_attempt(&self) -> u64 {
        self.latest_attempt.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn is_latest(&self, attempt: u64) -> bool {
        self.latest_attempt.load(Ordering::SeqCst) == attempt
    }

    /// Ensure the bucket exists. Safe to call repeatedly.
    ///
    /// On failure the gate is closed and the error is returned to the caller;
    /// nothing is retried.
    pub async fn register<C: TrackingClient>(
        &self,
        client: &C,
    ) -> Result<Registration, ClientError> {
        let attempt = self.begin_attempt();
        self.register_attempt(attempt, client).await
    }

    /// Run an attempt obtained from [`BucketRegistrar::begin_attempt`].
    ///
    /// If a newer attempt was started meanwhile, the gate is left alone and
    /// the result is [`Registration::Superseded`], whatever the server said.
    pub async fn register_attempt<C: TrackingClient>(
        &self,
        attempt: u64,
        client: &C,
    ) -> Result<Registration, ClientError> {
        let bucket = &self.bucket;
        let result = client
            .ensure_bucket(&bucket.id, &bucket.event_type, &bucket.host_name)
            .await;

        if !self.is_latest(attempt) {
            tracing::debug!(
                bucket = %bucket.id,
                attempt,
                succeeded = result.is_ok(),
                "discarding superseded registration"
            );
            return Ok(Registration::Superseded);
        }

        match result {
            Ok(result) => {
                let registration = Registration::from(result);
                match registration {
                    Registration::AlreadyExisted => {
                        tracing::info!(bucket = %bucket.id, "bucket already exists")
                    }
                    Registration::Created => tracing::info!(bucket = %bucket.id, "created bucket"),
                    Registration::Superseded => {}
                }
                self.ready.store(true, Ordering::SeqCst);
                Ok(registration)
            }
            Err(e) => {
                self.ready.store(false, Ordering::SeqCst);
                tracing::error!(bucket = %bucket.id, error = %e, "bucket registration failed");
                Err(e)
            }
        }
    }
}
