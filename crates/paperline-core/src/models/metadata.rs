use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One paper revision, normalized and independent of the source it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataEntry {
    pub paper_id: String,
    pub revision: u32,
    pub title: String,
    pub description: String,

    /// Empty when the source does not provide one.
    #[serde(default)]
    pub doi: String,

    pub primary_category: String,

    #[serde(default)]
    pub categories: Vec<String>,

    #[serde(default)]
    pub authors: Vec<MetadataAuthor>,

    #[serde(default)]
    pub links: Vec<MetadataLink>,

    /// Submission time of revision 1.
    pub created_at: DateTime<Utc>,

    /// Submission time of this revision.
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataAuthor {
    pub name: String,
}

impl MetadataAuthor {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataLink {
    pub url: String,
    pub media_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relation: Option<String>,
}

impl MetadataEntry {
    pub fn has_doi(&self) -> bool {
        !self.doi.is_empty()
    }

    pub fn is_first_revision(&self) -> bool {
        self.revision == 1
    }

    /// Checks the ordering invariants between revision number and timestamps.
    pub fn check_invariants(&self) -> Result<(), String> {
        if self.paper_id.is_empty() {
            return Err("paper id is empty".to_string());
        }
        if self.revision == 0 {
            return Err(format!("paper {} has revision 0", self.paper_id));
        }
        if self.updated_at < self.created_at {
            return Err(format!(
                "paper {}v{} was updated before it was created",
                self.paper_id, self.revision
            ));
        }
        if self.is_first_revision() && self.updated_at != self.created_at {
            return Err(format!(
                "paper {}v1 has differing created and updated timestamps",
                self.paper_id
            ));
        }
        Ok(())
    }
}
