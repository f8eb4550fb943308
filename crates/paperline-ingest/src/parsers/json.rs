//! Bulk snapshot parsing: one JSON object per paper, one canonical entry per
//! listed version.

use once_cell::sync::Lazy;
use paperline_core::config::SNAPSHOT_DATE_FORMAT;
use paperline_core::{MetadataAuthor, MetadataEntry};
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

use crate::dates::DateExtractor;
use crate::diagnostics::Diagnostics;
use crate::error::{IngestError, Result};
use crate::parsers::{MetadataParser, doi_or_report, push_unique};
use crate::text::clean_text;

static VERSION_LABEL: Lazy<Regex> = Lazy::new(|| Regex::new(r"v(\d+)").expect("valid regex"));

#[derive(Debug, Deserialize)]
struct SnapshotPaper {
    id: String,
    #[serde(default)]
    title: String,
    #[serde(rename = "abstract", default)]
    abstract_text: String,
    categories: String,
    #[serde(default)]
    authors_parsed: Vec<Vec<String>>,
    #[serde(default)]
    doi: Option<String>,
    versions: Vec<SnapshotVersion>,
}

#[derive(Debug, Deserialize)]
struct SnapshotVersion {
    #[serde(default)]
    version: String,
    created: String,
}

#[derive(Debug, Clone)]
pub struct JsonMetadataParser {
    dates: DateExtractor,
}

impl JsonMetadataParser {
    pub fn new() -> Result<Self> {
        Self::with_date_format(SNAPSHOT_DATE_FORMAT)
    }

    pub fn with_date_format(format: &str) -> Result<Self> {
        Ok(Self {
            dates: DateExtractor::new(format)?,
        })
    }

    /// Revision number from a `vN` label, 1 when the label carries none.
    pub fn extract_revision(label: &str) -> u32 {
        VERSION_LABEL
            .captures(label)
            .and_then(|caps| caps.get(1))
            .and_then(|rev| rev.as_str().parse::<u32>().ok())
            .filter(|rev| *rev > 0)
            .unwrap_or(1)
    }

    /// Joins the first and second name components of each author entry.
    ///
    /// The list is truncated at the first entry missing a component, so a
    /// name is never built from two different authors.
    fn parse_authors(authors_parsed: &[Vec<String>]) -> Vec<MetadataAuthor> {
        authors_parsed
            .iter()
            .map_while(|parts| Some((parts.first()?, parts.get(1)?)))
            .map(|(first, last)| MetadataAuthor::new(clean_text(&format!("{first} {last}"))))
            .collect()
    }
}

impl MetadataParser for JsonMetadataParser {
    type Input = Value;

    fn parse_body(&self, entry: &Value, diagnostics: &mut Diagnostics) -> Result<Vec<MetadataEntry>> {
        let paper: SnapshotPaper = serde_json::from_value(entry.clone())
            .map_err(|e| IngestError::JsonParse(format!("invalid snapshot entry: {e}")))?;

        let paper_id = paper.id.trim().to_string();
        if paper_id.is_empty() {
            return Err(IngestError::JsonParse("snapshot entry has an empty id".to_string()));
        }

        let mut categories = Vec::new();
        for category in paper.categories.split_whitespace() {
            push_unique(&mut categories, category.to_string());
        }
        let primary_category = categories.first().cloned().ok_or_else(|| {
            IngestError::JsonParse(format!("paper {paper_id} has an empty category list"))
        })?;

        let title = clean_text(&paper.title);
        let description = clean_text(&paper.abstract_text);
        let authors = Self::parse_authors(&paper.authors_parsed);
        let doi = doi_or_report(paper.doi, &paper_id, diagnostics);

        let mut first_created = None;
        let mut papers = Vec::with_capacity(paper.versions.len());

        for version in &paper.versions {
            let updated_at = self.dates.parse(&version.created)?;
            let created_at = *first_created.get_or_insert(updated_at);

            let entry = MetadataEntry {
                paper_id: paper_id.clone(),
                revision: Self::extract_revision(&version.version),
                title: title.clone(),
                description: description.clone(),
                doi: doi.clone(),
                primary_category: primary_category.clone(),
                categories: categories.clone(),
                authors: authors.clone(),
                links: Vec::new(),
                created_at,
                updated_at,
            };
            entry.check_invariants().map_err(IngestError::JsonParse)?;
            papers.push(entry);
        }

        Ok(papers)
    }
}
