//! Client for the ActivityWatch tracking server.
//!
//! The [`TrackingClient`] trait is the seam between the watcher and the
//! network; [`AwClient`] implements it over the ActivityWatch REST API.

use crate::heartbeat::HeartbeatSample;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;

/// Default ActivityWatch server port.
pub const DEFAULT_PORT: u16 = 5600;

/// Port used by an ActivityWatch server started in testing mode.
pub const TESTING_PORT: u16 = 5666;

/// Result of ensuring a bucket exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnsureBucket {
    /// Whether the bucket was already present on the server
    pub already_existed: bool,
}

/// Tracking client error types.
#[derive(Debug)]
pub enum ClientError {
    /// Client construction error
    Config(String),
    /// Network/HTTP error
    Network(String),
    /// Server returned an error response
    Server { status: u16, message: String },
}

impl std::fmt::Display for ClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClientError::Config(msg) => write!(f, "Client config error: {msg}"),
            ClientError::Network(msg) => write!(f, "Network error: {msg}"),
            ClientError::Server { status, message } => {
                write!(f, "Server error ({status}): {message}")
            }
        }
    }
}

impl std::error::Error for ClientError {}

/// Operations the watcher needs from a tracking server.
pub trait TrackingClient: Send + Sync + 'static {
    /// Create the bucket unless it already exists.
    fn ensure_bucket(
        &self,
        bucket_id: &str,
        event_type: &str,
        host_name: &str,
    ) -> impl Future<Output = Result<EnsureBucket, ClientError>> + Send;

    /// Send one heartbeat, merged server-side within `pulse_time_secs`.
    fn heartbeat(
        &self,
        bucket_id: &str,
        pulse_time_secs: f64,
        sample: &HeartbeatSample,
    ) -> impl Future<Output = Result<(), ClientError>> + Send;
}

/// Bucket creation body.
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateBucket {
    pub client: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub hostname: String,
}

/// ActivityWatch REST client.
pub struct AwClient {
    base_url: String,
    client_name: String,
    client: reqwest::Client,
}

impl AwClient {
    /// Create a client for the server at `base_url` (e.g. `http://127.0.0.1:5600`).
    pub fn new(base_url: impl Into<String>, client_name: impl Into<String>) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| ClientError::Config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client_name: client_name.into(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn client_name(&self) -> &str {
        &self.client_name
    }

    /// URL of a bucket resource.
    pub fn bucket_url(&self, bucket_id: &str) -> String {
        format!("{}/api/0/buckets/{}", self.base_url, bucket_id)
    }

    /// URL of a bucket's heartbeat endpoint.
    pub fn heartbeat_url(&self, bucket_id: &str, pulse_time_secs: f64) -> String {
        format!(
            "{}/heartbeat?pulsetime={}",
            self.bucket_url(bucket_id),
            pulse_time_secs
        )
    }

    async fn error_from(response: reqwest::Response) -> ClientError {
        let status = response.status().as_u16();
        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        ClientError::Server { status, message }
    }
}

impl TrackingClient for AwClient {
    async fn ensure_bucket(
        &self,
        bucket_id: &str,
        event_type: &str,
        host_name: &str,
    ) -> Result<EnsureBucket, ClientError> {
        let body = CreateBucket {
            client: self.client_name.clone(),
            event_type: event_type.to_string(),
            hostname: host_name.to_string(),
        };

        let response = self
            .client
            .post(self.bucket_url(bucket_id))
            .json(&body)
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        match response.status() {
            reqwest::StatusCode::NOT_MODIFIED => Ok(EnsureBucket {
                already_existed: true,
            }),
            status if status.is_success() => Ok(EnsureBucket {
                already_existed: false,
            }),
            _ => Err(Self::error_from(response).await),
        }
    }

    async fn heartbeat(
        &self,
        bucket_id: &str,
        pulse_time_secs: f64,
        sample: &HeartbeatSample,
    ) -> Result<(), ClientError> {
        let response = self
            .client
            .post(self.heartbeat_url(bucket_id, pulse_time_secs))
            .json(sample)
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }
        Ok(())
    }
}
