use tracing::{info, warn};

use crate::diagnostics::Diagnostics;
use crate::dispatch::{RecordDispatcher, RecordSink};
use crate::sources::SourceResolutionChain;

/// Outcome of one routine run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoutineReport {
    /// Entries whose records were all created.
    pub dispatched: usize,
    /// Paper ids no source knew about.
    pub missing: Vec<String>,
    /// Paper ids whose dispatch failed, with the reason.
    pub failed: Vec<(String, String)>,
}

impl RoutineReport {
    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }
}

/// Resolves every paper and dispatches each of its revisions.
pub struct MetadataRoutine<S> {
    chain: SourceResolutionChain,
    dispatcher: RecordDispatcher<S>,
}

impl<S: RecordSink> MetadataRoutine<S> {
    pub fn new(chain: SourceResolutionChain, dispatcher: RecordDispatcher<S>) -> Self {
        Self { chain, dispatcher }
    }

    pub fn chain(&self) -> &SourceResolutionChain {
        &self.chain
    }

    pub fn dispatcher(&self) -> &RecordDispatcher<S> {
        &self.dispatcher
    }

    pub async fn run<I, T>(&self, paper_ids: I, diagnostics: &mut Diagnostics) -> RoutineReport
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let mut report = RoutineReport::default();

        for paper_id in paper_ids {
            let paper_id = paper_id.as_ref();
            let entries = self.chain.resolve(paper_id, diagnostics).await;

            if entries.is_empty() {
                diagnostics.warn(Some(paper_id), format!("Metadata for paper {paper_id} not found"));
                report.missing.push(paper_id.to_string());
                continue;
            }

            for entry in &entries {
                match self.dispatcher.dispatch(entry).await {
                    Ok(summary) => {
                        info!(
                            paper_id = %summary.paper_id,
                            revision = summary.revision,
                            records = summary.records,
                            "paper revision stored"
                        );
                        report.dispatched += 1;
                    }
                    Err(e) => {
                        warn!(paper_id, revision = entry.revision, error = %e, "dispatch failed");
                        report.failed.push((paper_id.to_string(), e.to_string()));
                        break;
                    }
                }
            }
        }

        report
    }
}
