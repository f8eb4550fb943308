//! arXiv Atom 1.0 feed parsing.
//!
//! Atom reference: <https://www.rfc-editor.org/rfc/rfc4287>. One `<entry>`
//! per paper revision; entries are returned in document order.

use once_cell::sync::Lazy;
use paperline_core::{MetadataAuthor, MetadataEntry, MetadataLink};
use quick_xml::de::from_str;
use regex::Regex;
use serde::Deserialize;

use crate::dates::parse_iso8601;
use crate::diagnostics::Diagnostics;
use crate::error::{IngestError, Result};
use crate::parsers::{MetadataParser, doi_or_report, push_unique};
use crate::text::{clean_text, decode_url};

static ENTRY_ID_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^https?://(?:export\.)?arxiv\.org/abs/").expect("valid regex"));
static ENTRY_REV_SUFFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"v(\d+)$").expect("valid regex"));

const API_ERROR_MARKER: &str = "/api/errors";
const DEFAULT_LINK_TYPE: &str = "text/html";

#[derive(Debug, Deserialize)]
struct AtomFeed {
    #[serde(rename = "entry", default)]
    entries: Vec<AtomEntry>,
}

#[derive(Debug, Deserialize)]
struct AtomEntry {
    id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    summary: String,
    published: Option<String>,
    updated: Option<String>,
    #[serde(rename = "author", default)]
    authors: Vec<AtomAuthor>,
    #[serde(rename = "category", default)]
    categories: Vec<AtomCategory>,
    #[serde(rename = "arxiv:primary_category", alias = "primary_category")]
    primary_category: Option<AtomCategory>,
    #[serde(rename = "arxiv:doi", alias = "doi")]
    doi: Option<String>,
    #[serde(rename = "link", default)]
    links: Vec<AtomLink>,
}

#[derive(Debug, Deserialize)]
struct AtomAuthor {
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct AtomCategory {
    #[serde(rename = "@term")]
    term: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AtomLink {
    #[serde(rename = "@href")]
    href: Option<String>,
    #[serde(rename = "@type")]
    link_type: Option<String>,
    #[serde(rename = "@rel")]
    rel: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct FeedMetadataParser;

impl FeedMetadataParser {
    pub fn new() -> Self {
        Self
    }

    /// Paper ID from an `<entry><id>` URL, without prefix or revision suffix.
    pub fn extract_id(entry_id: &str) -> String {
        let trimmed = entry_id.trim();
        let without_prefix = ENTRY_ID_PREFIX.replace(trimmed, "");
        ENTRY_REV_SUFFIX.replace(&without_prefix, "").into_owned()
    }

    /// Revision from the trailing `vN` of an `<entry><id>` URL, 1 when absent.
    pub fn extract_revision(entry_id: &str) -> u32 {
        ENTRY_REV_SUFFIX
            .captures(entry_id.trim())
            .and_then(|caps| caps.get(1))
            .and_then(|rev| rev.as_str().parse::<u32>().ok())
            .filter(|rev| *rev > 0)
            .unwrap_or(1)
    }

    fn parse_entry(&self, entry: AtomEntry, diagnostics: &mut Diagnostics) -> Result<MetadataEntry> {
        let paper_id = Self::extract_id(&entry.id);
        if paper_id.is_empty() {
            return Err(IngestError::FeedParse(format!(
                "entry id {:?} does not name a paper",
                entry.id
            )));
        }
        let revision = Self::extract_revision(&entry.id);

        let published = required(entry.published, "published", &paper_id)?;
        let updated = required(entry.updated, "updated", &paper_id)?;

        let mut categories = Vec::new();
        for category in entry.categories {
            if let Some(term) = category.term {
                push_unique(&mut categories, term.trim().to_string());
            }
        }

        let primary_category = entry
            .primary_category
            .and_then(|category| category.term)
            .map(|term| term.trim().to_string())
            .filter(|term| !term.is_empty())
            .or_else(|| categories.first().cloned())
            .ok_or_else(|| {
                IngestError::FeedParse(format!("entry {paper_id} has no category"))
            })?;

        let authors = entry
            .authors
            .into_iter()
            .map(|author| MetadataAuthor::new(clean_text(&author.name)))
            .collect();

        let links = entry
            .links
            .into_iter()
            .filter_map(|link| {
                let href = link.href?;
                Some(MetadataLink {
                    url: decode_url(href.trim()),
                    media_type: link
                        .link_type
                        .unwrap_or_else(|| DEFAULT_LINK_TYPE.to_string()),
                    relation: link.rel,
                })
            })
            .collect();

        let doi = doi_or_report(entry.doi, &paper_id, diagnostics);

        let entry = MetadataEntry {
            revision,
            title: clean_text(&entry.title),
            description: clean_text(&entry.summary),
            doi,
            primary_category,
            categories,
            authors,
            links,
            created_at: parse_iso8601(&published)?,
            updated_at: parse_iso8601(&updated)?,
            paper_id,
        };
        entry.check_invariants().map_err(IngestError::FeedParse)?;
        Ok(entry)
    }
}

fn required(value: Option<String>, field_name: &str, paper_id: &str) -> Result<String> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| IngestError::FeedParse(format!("entry {paper_id} has no <{field_name}>")))
}

impl MetadataParser for FeedMetadataParser {
    type Input = str;

    fn parse_body(&self, feed: &str, diagnostics: &mut Diagnostics) -> Result<Vec<MetadataEntry>> {
        let feed: AtomFeed =
            from_str(feed).map_err(|e| IngestError::FeedParse(format!("invalid atom xml: {e}")))?;

        let mut papers = Vec::with_capacity(feed.entries.len());
        for entry in feed.entries {
            if entry.id.contains(API_ERROR_MARKER) {
                diagnostics.warn(
                    None,
                    format!("feed returned an error entry: {}", clean_text(&entry.summary)),
                );
                continue;
            }
            papers.push(self.parse_entry(entry, diagnostics)?);
        }

        Ok(papers)
    }
}
