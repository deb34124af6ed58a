//! Test doubles for the watcher's collaborators.

use crate::client::{ClientError, EnsureBucket, TrackingClient};
use crate::editor::{ActiveDocument, ContextError, EditorContext, VcsProvider};
use crate::heartbeat::HeartbeatSample;
use crate::report::{ErrorReporter, Severity};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Default)]
struct MockState {
    buckets: Vec<(String, String, String)>,
    heartbeats: Vec<(String, f64, HeartbeatSample)>,
    fail_ensure: bool,
    fail_heartbeat: bool,
    slow_ensure: Option<(Duration, bool)>,
}

/// In-memory tracking server. Clones share state.
#[derive(Clone, Default)]
pub struct MockClient {
    state: Arc<Mutex<MockState>>,
}

impl MockClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_ensure(&self, fail: bool) {
        self.state.lock().unwrap().fail_ensure = fail;
    }

    pub fn fail_heartbeat(&self, fail: bool) {
        self.state.lock().unwrap().fail_heartbeat = fail;
    }

    /// Make the next `ensure_bucket` call wait for `delay` and then
    /// succeed or fail regardless of `fail_ensure`.
    pub fn slow_next_ensure(&self, delay: Duration, fail: bool) {
        self.state.lock().unwrap().slow_ensure = Some((delay, fail));
    }

    pub fn ensured_buckets(&self) -> Vec<(String, String, String)> {
        self.state.lock().unwrap().buckets.clone()
    }

    pub fn heartbeats(&self) -> Vec<(String, f64, HeartbeatSample)> {
        self.state.lock().unwrap().heartbeats.clone()
    }
}

impl TrackingClient for MockClient {
    async fn ensure_bucket(
        &self,
        bucket_id: &str,
        event_type: &str,
        host_name: &str,
    ) -> Result<EnsureBucket, ClientError> {
        let slow = self.state.lock().unwrap().slow_ensure.take();
        if let Some((delay, fail)) = slow {
            tokio::time::sleep(delay).await;
            if fail {
                return Err(ClientError::Network("timed out".to_string()));
            }
        }

        let mut state = self.state.lock().unwrap();
        if slow.is_none() && state.fail_ensure {
            return Err(ClientError::Network("connection refused".to_string()));
        }
        let already_existed = state.buckets.iter().any(|(id, _, _)| id == bucket_id);
        state.buckets.push((
            bucket_id.to_string(),
            event_type.to_string(),
            host_name.to_string(),
        ));
        Ok(EnsureBucket { already_existed })
    }

    async fn heartbeat(
        &self,
        bucket_id: &str,
        pulse_time_secs: f64,
        sample: &HeartbeatSample,
    ) -> Result<(), ClientError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_heartbeat {
            return Err(ClientError::Network("connection reset".to_string()));
        }
        state
            .heartbeats
            .push((bucket_id.to_string(), pulse_time_secs, sample.clone()));
        Ok(())
    }
}

/// Editor with a fixed document.
pub struct MockEditor {
    pub document: Option<ActiveDocument>,
    pub workspace: Option<String>,
    pub fail: bool,
}

impl MockEditor {
    pub fn open(file: &str, language: &str, workspace: Option<&str>) -> Self {
        Self {
            document: Some(ActiveDocument {
                file_name: file.to_string(),
                language_id: language.to_string(),
            }),
            workspace: workspace.map(str::to_string),
            fail: false,
        }
    }

    pub fn closed() -> Self {
        Self {
            document: None,
            workspace: None,
            fail: false,
        }
    }
}

impl EditorContext for MockEditor {
    fn active_document(&self) -> Result<Option<ActiveDocument>, ContextError> {
        if self.fail {
            return Err(ContextError::Unavailable("editor disposed".to_string()));
        }
        Ok(self.document.clone())
    }

    fn workspace_folder(&self, _file_name: &str) -> Result<Option<String>, ContextError> {
        Ok(self.workspace.clone())
    }
}

/// VCS provider returning a fixed branch.
pub struct FixedBranch(Option<String>);

impl FixedBranch {
    pub fn new(branch: Option<&str>) -> Self {
        Self(branch.map(str::to_string))
    }
}

impl VcsProvider for FixedBranch {
    fn current_branch(&self) -> Option<String> {
        self.0.clone()
    }
}

/// Reporter that remembers every report.
#[derive(Default)]
pub struct RecordingReporter {
    reports: Mutex<Vec<(String, Severity)>>,
}

impl RecordingReporter {
    pub fn reports(&self) -> Vec<(String, Severity)> {
        self.reports.lock().unwrap().clone()
    }
}

impl ErrorReporter for RecordingReporter {
    fn report(&self, message: &str, severity: Severity) {
        self.reports
            .lock()
            .unwrap()
            .push((message.to_string(), severity));
    }
}
