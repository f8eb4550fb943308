//! Side channel for the non-fatal events raised while parsing and resolving.
//!
//! Every recorded event is also forwarded to `tracing`, so callers get log
//! output for free and tests can assert on the recorded list instead.

use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DiagnosticLevel {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub level: DiagnosticLevel,
    pub paper_id: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    events: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn info(&mut self, paper_id: Option<&str>, message: impl Into<String>) {
        let message = message.into();
        info!(paper_id = paper_id.unwrap_or_default(), "{message}");
        self.push(DiagnosticLevel::Info, paper_id, message);
    }

    pub fn warn(&mut self, paper_id: Option<&str>, message: impl Into<String>) {
        let message = message.into();
        warn!(paper_id = paper_id.unwrap_or_default(), "{message}");
        self.push(DiagnosticLevel::Warning, paper_id, message);
    }

    pub fn error(&mut self, paper_id: Option<&str>, message: impl Into<String>) {
        let message = message.into();
        error!(paper_id = paper_id.unwrap_or_default(), "{message}");
        self.push(DiagnosticLevel::Error, paper_id, message);
    }

    fn push(&mut self, level: DiagnosticLevel, paper_id: Option<&str>, message: String) {
        self.events.push(Diagnostic {
            level,
            paper_id: paper_id.map(ToOwned::to_owned),
            message,
        });
    }

    pub fn events(&self) -> &[Diagnostic] {
        &self.events
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn at_level(&self, level: DiagnosticLevel) -> impl Iterator<Item = &Diagnostic> {
        self.events.iter().filter(move |event| event.level == level)
    }

    pub fn for_paper<'a>(&'a self, paper_id: &'a str) -> impl Iterator<Item = &'a Diagnostic> {
        self.events
            .iter()
            .filter(move |event| event.paper_id.as_deref() == Some(paper_id))
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.events.extend(other.events);
    }

    pub fn into_events(self) -> Vec<Diagnostic> {
        self.events
    }
}
