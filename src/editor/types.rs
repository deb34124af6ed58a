//! Interfaces the watcher needs from the editor and version control.

/// The document in the focused editor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveDocument {
    /// Absolute file name
    pub file_name: String,
    /// Editor language identifier (e.g. "rust")
    pub language_id: String,
}

/// Failure while reading editor state.
#[derive(Debug)]
pub enum ContextError {
    /// The editor context cannot be queried right now
    Unavailable(String),
}

impl std::fmt::Display for ContextError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContextError::Unavailable(msg) => write!(f, "Editor context unavailable: {msg}"),
        }
    }
}

impl std::error::Error for ContextError {}

/// Read access to the editor's current state.
pub trait EditorContext {
    /// The focused document, if any editor is active.
    fn active_document(&self) -> Result<Option<ActiveDocument>, ContextError>;

    /// Root of the workspace folder containing `file_name`, if any.
    fn workspace_folder(&self, file_name: &str) -> Result<Option<String>, ContextError>;
}

/// Read access to version control.
///
/// Absence of a repository or provider is `None`, never an error.
pub trait VcsProvider {
    /// Branch checked out in the first known repository.
    fn current_branch(&self) -> Option<String>;
}

/// Provider for hosts without version control.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoVcs;

impl VcsProvider for NoVcs {
    fn current_branch(&self) -> Option<String> {
        None
    }
}
