//! Branch lookup from git repositories on disk.

use crate::editor::types::VcsProvider;
use std::path::{Path, PathBuf};

/// Git repositories known to the watcher, in discovery order.
#[derive(Debug, Clone, Default)]
pub struct GitRepositories {
    roots: Vec<PathBuf>,
}

impl GitRepositories {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track `root` if it is a git work tree not seen before.
    ///
    /// Returns `true` when the repository was added.
    pub fn discover(&mut self, root: impl AsRef<Path>) -> bool {
        let root = root.as_ref();
        if self.roots.iter().any(|r| r == root) || !root.join(".git").exists() {
            return false;
        }
        tracing::debug!(root = %root.display(), "discovered git repository");
        self.roots.push(root.to_path_buf());
        true
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }
}

impl VcsProvider for GitRepositories {
    fn current_branch(&self) -> Option<String> {
        self.roots.first().and_then(|root| read_head_branch(root))
    }
}

/// Directory holding `HEAD` for the work tree at `root`.
///
/// Linked work trees and submodules use a `.git` file pointing elsewhere.
fn git_dir(root: &Path) -> Option<PathBuf> {
    let dot_git = root.join(".git");
    if dot_git.is_dir() {
        return Some(dot_git);
    }
    let content = std::fs::read_to_string(&dot_git).ok()?;
    let target = content.trim().strip_prefix("gitdir:")?.trim();
    let path = PathBuf::from(target);
    Some(if path.is_absolute() {
        path
    } else {
        root.join(path)
    })
}

/// Branch name from `HEAD`, or `None` when detached or unreadable.
pub fn read_head_branch(root: &Path) -> Option<String> {
    let head = std::fs::read_to_string(git_dir(root)?.join("HEAD")).ok()?;
    parse_head(&head)
}

/// Parse the contents of a `HEAD` file.
pub fn parse_head(head: &str) -> Option<String> {
    let reference = head.trim().strip_prefix("ref:")?.trim();
    let name = reference.strip_prefix("refs/heads/").unwrap_or(reference);
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}
