//! Editor and version-control providers.
//!
//! The watcher reads editor state through [`EditorContext`] and the current
//! branch through [`VcsProvider`]. The host bridge feeds a
//! [`HostEditorState`] from JSON lines written by the editor process.

pub mod git;
pub mod host;
pub mod types;

pub use git::GitRepositories;
pub use host::{EditorSnapshot, HostBridge, HostEditorState, HostError, HostMessage};
pub use types::{ActiveDocument, ContextError, EditorContext, NoVcs, VcsProvider};
