//! User-facing messages tagged by severity.
//!
//! Errors stop the pipeline of the mesh they concern, warnings never do.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "INFO"),
            Severity::Warning => write!(f, "WARNING"),
            Severity::Error => write!(f, "ERROR"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub severity: Severity,
    pub text: String,
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.severity, self.text)
    }
}

/// Sink for the short human-readable messages the workflow produces.
pub trait Reporter {
    fn report(&mut self, severity: Severity, message: &str);

    /// Called once after each target finishes, successfully or not
    fn progress(&mut self, _done: usize, _total: usize) {}

    fn info(&mut self, message: &str) {
        self.report(Severity::Info, message);
    }

    fn warning(&mut self, message: &str) {
        self.report(Severity::Warning, message);
    }

    fn error(&mut self, message: &str) {
        self.report(Severity::Error, message);
    }
}

/// Collects every message and progress tick, and mirrors messages to `tracing`.
#[derive(Debug, Clone, Default)]
pub struct Report {
    pub messages: Vec<Message>,
    pub progress: Vec<(usize, usize)>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_severity(&self, severity: Severity) -> impl Iterator<Item = &Message> {
        self.messages.iter().filter(move |m| m.severity == severity)
    }

    pub fn warnings(&self) -> usize {
        self.with_severity(Severity::Warning).count()
    }

    pub fn errors(&self) -> usize {
        self.with_severity(Severity::Error).count()
    }

    /// No warnings and no errors
    pub fn is_clean(&self) -> bool {
        self.messages.iter().all(|m| m.severity == Severity::Info)
    }
}

impl Reporter for Report {
    fn report(&mut self, severity: Severity, message: &str) {
        match severity {
            Severity::Info => tracing::info!("{message}"),
            Severity::Warning => tracing::warn!("{message}"),
            Severity::Error => tracing::error!("{message}"),
        }
        self.messages.push(Message {
            severity,
            text: message.to_string(),
        });
    }

    fn progress(&mut self, done: usize, total: usize) {
        tracing::info!(done, total, "progress");
        self.progress.push((done, total));
    }
}
