use std::fmt;

use paperline_core::{CoreError, RecordRoute};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("invalid date {input:?}: {reason}")]
    DateParse { input: String, reason: String },

    #[error("feed parse error: {0}")]
    FeedParse(String),

    #[error("JSON parse error: {0}")]
    JsonParse(String),

    #[error("invalid {route} record: {reason}")]
    RecordValidation { route: RecordRoute, reason: String },

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error from {0}: {1}")]
    Api(String, String),

    #[error("rate limit from {0}, retry after {1}s")]
    RateLimit(String, u64),

    #[error("PDF extraction error: {0}")]
    PdfExtraction(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Core(#[from] CoreError),
}

pub type Result<T> = std::result::Result<T, IngestError>;

/// Failure reported by an output sink for a single record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SinkError {
    #[error("record already exists: {0}")]
    Conflict(String),

    #[error("rejected with HTTP {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("transport failure: {0}")]
    Transport(String),
}

/// Identifies one submitted record within a dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordIdentity {
    pub route: RecordRoute,
    pub paper_id: String,
    pub revision: u32,
    pub author_name: Option<String>,
}

impl fmt::Display for RecordIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}v{}", self.route, self.paper_id, self.revision)?;
        if let Some(author) = &self.author_name {
            write!(f, " ({author})")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot create {record}: {source}")]
pub struct DispatchError {
    pub record: RecordIdentity,
    #[source]
    pub source: SinkError,
}

impl DispatchError {
    pub fn is_conflict(&self) -> bool {
        matches!(self.source, SinkError::Conflict(_))
    }
}
