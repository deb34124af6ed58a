//! aw-watcher-editor - editor activity watcher for ActivityWatch.
//!
//! The watcher observes what the user is editing (file, language, project,
//! git branch) and sends heartbeats to a local ActivityWatch server, which
//! merges them into time-bucketed activity.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      aw-watcher-editor                        │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐         │
//! │  │ Host bridge │──▶│   Watcher   │──▶│  Throttler  │         │
//! │  │   (stdin)   │   │ (providers) │   │ (rate gate) │         │
//! │  └─────────────┘   └─────────────┘   └─────────────┘         │
//! │                           │                 │                 │
//! │                           ▼                 ▼                 │
//! │                    ┌─────────────┐   ┌─────────────┐         │
//! │                    │  Registrar  │   │  AwClient   │──▶ aw-server
//! │                    │  (bucket)   │   │ (heartbeat) │         │
//! │                    └─────────────┘   └─────────────┘         │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use aw_watcher_editor::{AwClient, Bucket, Config, HostEditorState, LogReporter, NoVcs, Watcher};
//!
//! let runtime = tokio::runtime::Runtime::new().unwrap();
//! let config = Config::load().unwrap_or_default();
//! let bucket = Bucket::new("Visual Studio Code", "devbox", config.bucket_suffix());
//! let client = AwClient::new(config.server_url(), bucket.client_name.clone()).unwrap();
//!
//! let mut watcher = Watcher::new(
//!     "Visual Studio Code",
//!     bucket,
//!     Arc::new(client),
//!     HostEditorState::new(),
//!     NoVcs,
//!     Arc::new(LogReporter),
//!     runtime.handle().clone(),
//! );
//! let _registration = watcher.init(&config);
//! watcher.on_activity();
//! ```

pub mod bucket;
pub mod client;
pub mod config;
pub mod editor;
pub mod heartbeat;
pub mod report;
pub mod stats;
pub mod watcher;

#[cfg(test)]
mod test_support;

// Re-export key types at crate root for convenience
pub use bucket::{app_short_name, Bucket, BucketRegistrar, Registration};
pub use client::{AwClient, ClientError, EnsureBucket, TrackingClient};
pub use config::{Config, ConfigError};
pub use editor::{
    ActiveDocument, ContextError, EditorContext, GitRepositories, HostBridge, HostEditorState,
    HostMessage, NoVcs, VcsProvider,
};
pub use heartbeat::{HeartbeatData, HeartbeatSample, ThrottleState, Throttler, UNKNOWN};
pub use report::{ErrorReporter, LogReporter, Severity};
pub use stats::{ActivityStats, SharedStats};
pub use watcher::{HostResponse, Outcome, Watcher};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
