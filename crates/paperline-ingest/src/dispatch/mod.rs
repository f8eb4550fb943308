//! Ordered submission of mapped records to an output sink.
//!
//! Records of one entry go out as Paper, then CategoryMembership, then every
//! Authorship. The first sink failure aborts the entry.

pub mod rest;

pub use rest::RestSink;

use async_trait::async_trait;
use futures::StreamExt;
use paperline_core::{MetadataEntry, OutputRecord, RecordFields, RecordRoute};
use tracing::debug;

use crate::error::{DispatchError, IngestError, RecordIdentity, Result, SinkError};
use crate::mapping::RecordMapper;

const MAX_CONCURRENT_AUTHORSHIPS: usize = 8;

/// Downstream storage accepting one record at a time.
#[async_trait]
pub trait RecordSink: Send + Sync {
    async fn create_record(&self, route: RecordRoute, record: &RecordFields) -> std::result::Result<(), SinkError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DispatchMode {
    #[default]
    Sequential,
    /// Authorships of one entry are submitted in parallel once the paper and
    /// its category membership exist.
    ConcurrentAuthors,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchSummary {
    pub paper_id: String,
    pub revision: u32,
    pub records: usize,
}

pub struct RecordDispatcher<S> {
    sink: S,
    mode: DispatchMode,
}

impl<S: RecordSink> RecordDispatcher<S> {
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            mode: DispatchMode::Sequential,
        }
    }

    pub fn with_mode(mut self, mode: DispatchMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn mode(&self) -> DispatchMode {
        self.mode
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub async fn dispatch(&self, entry: &MetadataEntry) -> Result<DispatchSummary> {
        let mapped = RecordMapper::map(entry)?;

        self.submit(&mapped.paper).await?;
        self.submit(&mapped.membership).await?;

        match self.mode {
            DispatchMode::Sequential => {
                for authorship in &mapped.authorships {
                    self.submit(authorship).await?;
                }
            }
            DispatchMode::ConcurrentAuthors => {
                // Every submission runs to completion before the first failure
                // is reported; already created siblings are left in place.
                let results: Vec<Result<()>> = futures::stream::iter(&mapped.authorships)
                    .map(|authorship| self.submit(authorship))
                    .buffered(MAX_CONCURRENT_AUTHORSHIPS)
                    .collect()
                    .await;
                results.into_iter().collect::<Result<Vec<()>>>()?;
            }
        }

        debug!(
            paper_id = %entry.paper_id,
            revision = entry.revision,
            records = mapped.record_count(),
            "entry dispatched"
        );

        Ok(DispatchSummary {
            paper_id: entry.paper_id.clone(),
            revision: entry.revision,
            records: mapped.record_count(),
        })
    }

    async fn submit<R: OutputRecord + Sync>(&self, record: &R) -> Result<()> {
        let fields = record.to_fields().map_err(|e| IngestError::RecordValidation {
            route: R::ROUTE,
            reason: e.to_string(),
        })?;

        self.sink
            .create_record(R::ROUTE, &fields)
            .await
            .map_err(|source| {
                IngestError::Dispatch(DispatchError {
                    record: RecordIdentity {
                        route: R::ROUTE,
                        paper_id: record.paper_id().to_string(),
                        revision: record.revision(),
                        author_name: record.author_name().map(str::to_string),
                    },
                    source,
                })
            })
    }
}
