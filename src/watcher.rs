//! The watcher: turns editor activity into heartbeats.
//!
//! The host calls [`Watcher::on_activity`] for every selection change and
//! every change of the active editor. Samples are rejected until the bucket
//! is registered, then filtered by the [`Throttler`]. Accepted samples are
//! delivered on the tokio runtime without waiting for the result.

use crate::bucket::{app_short_name, Bucket, BucketRegistrar, Registration};
use crate::client::{ClientError, TrackingClient};
use crate::config::{Config, DEFAULT_PULSE_TIME_SECS};
use crate::editor::{
    ContextError, EditorContext, GitRepositories, HostEditorState, HostMessage, VcsProvider,
};
use crate::heartbeat::{HeartbeatData, HeartbeatSample, Throttler};
use crate::report::{ErrorReporter, Severity};
use crate::stats::{ActivityStats, SharedStats};
use std::path::Path;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

/// Shown to the user when the bucket cannot be created.
pub const REGISTRATION_FAILED_MESSAGE: &str = "Couldn't create Bucket. Please make sure the server is running properly and then run the [Reload ActivityWatch] command.";

/// Reported when a heartbeat cannot be delivered.
pub const DELIVERY_FAILED_MESSAGE: &str = "Error while sending heartbeat";

/// What happened to one activity event.
#[derive(Debug)]
pub enum Outcome {
    /// The bucket is not registered; nothing was sampled
    NotReady,
    /// Editor state could not be read; the sample was dropped
    Dropped,
    /// Same context within the throttle window
    Throttled,
    /// Heartbeat handed to the transport
    Sent(JoinHandle<()>),
}

impl Outcome {
    pub fn is_sent(&self) -> bool {
        matches!(self, Outcome::Sent(_))
    }
}

/// What the watcher did with one host message.
#[derive(Debug)]
pub enum HostResponse {
    /// An activity event went through [`Watcher::on_activity`]
    Activity(Outcome),
    /// Registration was restarted with freshly loaded configuration
    Reloaded(JoinHandle<()>),
    /// Text for the "show app name" command
    AppName(String),
}

/// Long-lived controller owning the throttle state.
pub struct Watcher<C, E, V, R> {
    app_name: String,
    bucket_suffix: Option<String>,
    registrar: BucketRegistrar,
    throttler: Throttler,
    pulse_time_secs: f64,
    client: Arc<C>,
    editor: E,
    vcs: V,
    reporter: Arc<R>,
    stats: SharedStats,
    runtime: Handle,
}

impl<C, E, V, R> Watcher<C, E, V, R>
where
    C: TrackingClient,
    E: EditorContext,
    V: VcsProvider,
    R: ErrorReporter,
{
    /// Create a watcher for `bucket`. Call [`Watcher::init`] before use.
    pub fn new(
        app_name: impl Into<String>,
        bucket: Bucket,
        client: Arc<C>,
        editor: E,
        vcs: V,
        reporter: Arc<R>,
        runtime: Handle,
    ) -> Self {
        Self {
            app_name: app_name.into(),
            bucket_suffix: None,
            registrar: BucketRegistrar::new(bucket),
            throttler: Throttler::new(),
            pulse_time_secs: DEFAULT_PULSE_TIME_SECS,
            client,
            editor,
            vcs,
            reporter,
            stats: Arc::new(ActivityStats::new()),
            runtime,
        }
    }

    /// Use shared statistics instead of private ones.
    pub fn with_stats(mut self, stats: SharedStats) -> Self {
        self.stats = stats;
        self
    }

    pub fn bucket(&self) -> &Bucket {
        self.registrar.bucket()
    }

    pub fn registrar(&self) -> &BucketRegistrar {
        &self.registrar
    }

    pub fn throttler(&self) -> &Throttler {
        &self.throttler
    }

    pub fn stats(&self) -> &SharedStats {
        &self.stats
    }

    pub fn editor_mut(&mut self) -> &mut E {
        &mut self.editor
    }

    pub fn vcs_mut(&mut self) -> &mut V {
        &mut self.vcs
    }

    pub fn pulse_time_secs(&self) -> f64 {
        self.pulse_time_secs
    }

    /// Register the bucket in the background and apply `config`.
    ///
    /// Samples are rejected until the registration succeeds.
    pub fn init(&mut self, config: &Config) -> JoinHandle<()> {
        let registration = self.spawn_registration();
        self.load_configuration(config);
        registration
    }

    /// Re-run registration and reload configuration from scratch.
    pub fn reload(&mut self, config: &Config) -> JoinHandle<()> {
        tracing::info!(bucket = %self.bucket().id, "reloading");
        self.init(config)
    }

    /// Apply configuration values. Absent values keep the current settings.
    pub fn load_configuration(&mut self, config: &Config) {
        self.throttler
            .load_configuration(config.max_heartbeats_per_sec);
        if config.pulse_time_secs.is_finite() && config.pulse_time_secs > 0.0 {
            self.pulse_time_secs = config.pulse_time_secs;
        }
        self.bucket_suffix = config.bucket_suffix().map(str::to_string);
        tracing::debug!(
            max_heartbeats_per_sec = self.throttler.state().max_heartbeats_per_sec,
            pulse_time_secs = self.pulse_time_secs,
            "configuration loaded"
        );
    }

    /// Register the bucket and wait for the result.
    pub async fn register(&self) -> Result<Registration, ClientError> {
        let attempt = self.registrar.begin_attempt();
        register_bucket(
            self.registrar.clone(),
            attempt,
            self.client.clone(),
            self.reporter.clone(),
            self.stats.clone(),
        )
        .await
    }

    /// Register the bucket on the runtime without waiting.
    ///
    /// The attempt supersedes any registration still in flight, so an older
    /// attempt finishing late cannot close the gate again.
    pub fn spawn_registration(&self) -> JoinHandle<()> {
        let attempt = self.registrar.begin_attempt();
        let registrar = self.registrar.clone();
        let client = self.client.clone();
        let reporter = self.reporter.clone();
        let stats = self.stats.clone();
        self.runtime.spawn(async move {
            let _ = register_bucket(registrar, attempt, client, reporter, stats).await;
        })
    }

    /// Handle one editor activity event.
    pub fn on_activity(&mut self) -> Outcome {
        self.stats.record_sample();

        if !self.registrar.is_ready() {
            self.stats.record_not_ready();
            return Outcome::NotReady;
        }

        let sample = match self.build_sample() {
            Ok(sample) => sample,
            Err(e) => {
                self.stats.record_context_error();
                self.reporter.report(&e.to_string(), Severity::Recoverable);
                return Outcome::Dropped;
            }
        };

        if !self.throttler.admit(&sample) {
            self.stats.record_throttled();
            return Outcome::Throttled;
        }

        Outcome::Sent(self.deliver(sample))
    }

    /// Read the current editor and VCS state into a sample.
    pub fn build_sample(&self) -> Result<HeartbeatSample, ContextError> {
        let document = self.editor.active_document()?;
        let project = match &document {
            Some(doc) => self.editor.workspace_folder(&doc.file_name)?,
            None => None,
        };
        let (file, language) = match document {
            Some(doc) => (Some(doc.file_name), Some(doc.language_id)),
            None => (None, None),
        };
        let branch = self.vcs.current_branch();

        Ok(HeartbeatSample::now(HeartbeatData::new(
            language, project, file, branch,
        )))
    }

    /// App name and bucket suffix, as shown by the "show app name" command.
    pub fn app_name_summary(&self) -> String {
        let short_name = app_short_name(&self.app_name, self.bucket_suffix.as_deref());
        format!("App Name: \"{}\"\nBucket suffix: \"{}\"", self.app_name, short_name)
    }

    fn deliver(&self, sample: HeartbeatSample) -> JoinHandle<()> {
        let client = self.client.clone();
        let reporter = self.reporter.clone();
        let stats = self.stats.clone();
        let bucket_id = self.bucket().id.clone();
        let pulse_time_secs = self.pulse_time_secs;

        self.runtime.spawn(async move {
            match client.heartbeat(&bucket_id, pulse_time_secs, &sample).await {
                Ok(()) => {
                    stats.record_sent();
                    tracing::debug!(
                        file = %sample.data.file,
                        branch = %sample.data.branch,
                        "sent heartbeat"
                    );
                }
                Err(e) => {
                    stats.record_delivery_failure();
                    tracing::warn!(error = %e, "heartbeat delivery failed");
                    reporter.report(DELIVERY_FAILED_MESSAGE, Severity::Recoverable);
                }
            }
        })
    }
}

impl<C, R> Watcher<C, HostEditorState, GitRepositories, R>
where
    C: TrackingClient,
    R: ErrorReporter,
{
    /// Apply one message from the editor host.
    ///
    /// Activity events first learn the workspace as a git repository, then
    /// replace the editor state before sampling. A reload reads the
    /// configuration at `config_path` again.
    pub fn handle_host_message(
        &mut self,
        message: HostMessage,
        config_path: &Path,
    ) -> HostResponse {
        match message {
            HostMessage::SelectionChanged(snapshot)
            | HostMessage::ActiveEditorChanged(snapshot) => {
                if let Some(workspace) = &snapshot.workspace {
                    self.vcs.discover(workspace);
                }
                self.editor.apply(&snapshot);
                let outcome = self.on_activity();
                tracing::trace!(?outcome, "activity handled");
                HostResponse::Activity(outcome)
            }
            HostMessage::Reload => {
                let config = Config::load_or_default(config_path);
                HostResponse::Reloaded(self.reload(&config))
            }
            HostMessage::ShowAppName => HostResponse::AppName(self.app_name_summary()),
        }
    }
}

async fn register_bucket<C, R>(
    registrar: BucketRegistrar,
    attempt: u64,
    client: Arc<C>,
    reporter: Arc<R>,
    stats: SharedStats,
) -> Result<Registration, ClientError>
where
    C: TrackingClient,
    R: ErrorReporter,
{
    match registrar.register_attempt(attempt, client.as_ref()).await {
        Ok(Registration::Superseded) => Ok(Registration::Superseded),
        Ok(registration) => {
            stats.record_registration();
            Ok(registration)
        }
        Err(e) => {
            reporter.report(REGISTRATION_FAILED_MESSAGE, Severity::Critical);
            Err(e)
        }
    }
}
