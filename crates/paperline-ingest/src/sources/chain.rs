use paperline_core::MetadataEntry;
use tracing::debug;

use crate::diagnostics::Diagnostics;
use crate::sources::MetadataSource;

/// Ordered list of metadata sources; the first one with results wins.
#[derive(Default)]
pub struct SourceResolutionChain {
    sources: Vec<Box<dyn MetadataSource>>,
}

impl SourceResolutionChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `source` with the lowest priority so far.
    pub fn add_source(&mut self, source: impl MetadataSource + 'static) {
        self.sources.push(Box::new(source));
    }

    pub fn add_boxed(&mut self, source: Box<dyn MetadataSource>) {
        self.sources.push(source);
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn source_names(&self) -> Vec<&str> {
        self.sources.iter().map(|source| source.name()).collect()
    }

    /// Queries the sources in order and stops at the first non-empty answer.
    ///
    /// An empty result means no source knows the paper; it is not an error.
    pub async fn resolve(&self, paper_id: &str, diagnostics: &mut Diagnostics) -> Vec<MetadataEntry> {
        for source in &self.sources {
            let entries = source.get_metadata(paper_id, diagnostics).await;
            if !entries.is_empty() {
                debug!(paper_id, source = source.name(), count = entries.len(), "metadata resolved");
                return entries;
            }
            debug!(paper_id, source = source.name(), "no metadata, trying next source");
        }
        Vec::new()
    }
}
