//! Error reporting with two severities.
//!
//! Critical errors need user action and are shown to the user; recoverable
//! ones are only logged.

/// How an error affects the watcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The watcher is degraded until the user reloads
    Critical,
    /// Only the affected sample or delivery is lost
    Recoverable,
}

/// Sink for errors raised by the watcher.
pub trait ErrorReporter: Send + Sync + 'static {
    fn report(&self, message: &str, severity: Severity);
}

/// Reports through `tracing`, echoing critical errors to stderr.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogReporter;

impl ErrorReporter for LogReporter {
    fn report(&self, message: &str, severity: Severity) {
        match severity {
            Severity::Critical => {
                tracing::error!("{message}");
                eprintln!("[ActivityWatch] {message}");
            }
            Severity::Recoverable => tracing::warn!("{message}"),
        }
    }
}
