pub mod feed;
pub mod json;

pub use feed::FeedMetadataParser;
pub use json::JsonMetadataParser;

use paperline_core::MetadataEntry;

use crate::diagnostics::Diagnostics;
use crate::error::Result;

/// Turns one raw upstream payload into canonical metadata entries.
pub trait MetadataParser: Send + Sync {
    type Input: ?Sized;

    fn parse_body(
        &self,
        input: &Self::Input,
        diagnostics: &mut Diagnostics,
    ) -> Result<Vec<MetadataEntry>>;
}

/// Missing DOIs are normal upstream; they degrade to an empty string.
pub(crate) fn doi_or_report(
    doi: Option<String>,
    paper_id: &str,
    diagnostics: &mut Diagnostics,
) -> String {
    match doi.map(|value| value.trim().to_string()) {
        Some(value) if !value.is_empty() => value,
        _ => {
            diagnostics.info(
                Some(paper_id),
                format!("Paper {paper_id} does not specify a DOI"),
            );
            String::new()
        }
    }
}

pub(crate) fn push_unique(values: &mut Vec<String>, value: String) {
    if !value.is_empty() && !values.contains(&value) {
        values.push(value);
    }
}
