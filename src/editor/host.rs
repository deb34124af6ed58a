//! Bridge to the editor host process.
//!
//! The host writes one JSON message per line on the agent's stdin. A reader
//! thread parses the lines and forwards them over a channel so the event loop
//! never blocks on I/O.

use crate::editor::types::{ActiveDocument, ContextError, EditorContext};
use crossbeam_channel::{bounded, Receiver, Sender};
use serde::{Deserialize, Serialize};
use std::io::BufRead;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

/// Editor state reported with an activity event.
///
/// A missing `file` means no editor is focused.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditorSnapshot {
    pub file: Option<String>,
    pub language: Option<String>,
    pub workspace: Option<String>,
}

/// A message from the editor host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HostMessage {
    /// Cursor or selection moved in the focused editor
    SelectionChanged(EditorSnapshot),
    /// A different editor gained focus
    ActiveEditorChanged(EditorSnapshot),
    /// Re-register the bucket and reload configuration
    Reload,
    /// Print the app name and bucket suffix
    ShowAppName,
}

impl HostMessage {
    /// Parse one line of host input.
    pub fn parse(line: &str) -> Result<Self, HostError> {
        serde_json::from_str(line).map_err(|e| HostError::Parse(e.to_string()))
    }

    /// Editor state carried by activity events.
    pub fn snapshot(&self) -> Option<&EditorSnapshot> {
        match self {
            HostMessage::SelectionChanged(s) | HostMessage::ActiveEditorChanged(s) => Some(s),
            HostMessage::Reload | HostMessage::ShowAppName => None,
        }
    }
}

/// Errors on the host channel.
#[derive(Debug)]
pub enum HostError {
    AlreadyRunning,
    Parse(String),
}

impl std::fmt::Display for HostError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HostError::AlreadyRunning => write!(f, "Host bridge is already running"),
            HostError::Parse(e) => write!(f, "Invalid host message: {e}"),
        }
    }
}

impl std::error::Error for HostError {}

/// Editor state as last reported by the host.
#[derive(Debug, Clone, Default)]
pub struct HostEditorState {
    current: EditorSnapshot,
}

impl HostEditorState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the known state with the host's latest report.
    pub fn apply(&mut self, snapshot: &EditorSnapshot) {
        self.current = snapshot.clone();
    }
}

impl EditorContext for HostEditorState {
    fn active_document(&self) -> Result<Option<ActiveDocument>, ContextError> {
        Ok(self.current.file.as_ref().map(|file| ActiveDocument {
            file_name: file.clone(),
            language_id: self.current.language.clone().unwrap_or_default(),
        }))
    }

    fn workspace_folder(&self, file_name: &str) -> Result<Option<String>, ContextError> {
        if self.current.file.as_deref() != Some(file_name) {
            return Ok(None);
        }
        Ok(self.current.workspace.clone())
    }
}

/// Reads host messages on a background thread.
pub struct HostBridge {
    sender: Option<Sender<HostMessage>>,
    receiver: Receiver<HostMessage>,
    running: Arc<AtomicBool>,
}

impl HostBridge {
    /// Create a bridge buffering up to `capacity` messages.
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity);
        Self {
            sender: Some(sender),
            receiver,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Start reading lines from `reader`.
    ///
    /// The channel disconnects once `reader` reaches end of input.
    pub fn start<R>(&mut self, reader: R) -> Result<(), HostError>
    where
        R: BufRead + Send + 'static,
    {
        let Some(sender) = self.sender.take() else {
            return Err(HostError::AlreadyRunning);
        };
        self.running.store(true, Ordering::SeqCst);
        let running = self.running.clone();

        thread::spawn(move || {
            read_messages(reader, &sender);
            running.store(false, Ordering::SeqCst);
            tracing::debug!("host input closed");
        });
        Ok(())
    }

    /// Check if the reader thread is still consuming input.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Get the receiver for host messages.
    pub fn receiver(&self) -> &Receiver<HostMessage> {
        &self.receiver
    }

    /// Try to receive a message without blocking.
    pub fn try_recv(&self) -> Option<HostMessage> {
        self.receiver.try_recv().ok()
    }
}

fn read_messages<R: BufRead>(reader: R, sender: &Sender<HostMessage>) {
    for line in reader.lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                tracing::warn!(error = %e, "failed to read host input");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        match HostMessage::parse(&line) {
            Ok(message) => {
                if sender.send(message).is_err() {
                    break;
                }
            }
            Err(e) => tracing::warn!(error = %e, "skipping host message"),
        }
    }
}
