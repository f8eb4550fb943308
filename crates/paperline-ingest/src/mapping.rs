//! Canonical entry → output records.

use paperline_core::{
    AuthorshipRecord, CategoryMembershipRecord, MetadataEntry, OutputRecord, PaperRecord,
};

use crate::error::{IngestError, Result};

/// Validated records derived from one canonical entry.
#[derive(Debug, Clone, PartialEq)]
pub struct MappedRecords {
    pub paper: PaperRecord,
    pub membership: CategoryMembershipRecord,
    pub authorships: Vec<AuthorshipRecord>,
}

impl MappedRecords {
    pub fn record_count(&self) -> usize {
        2 + self.authorships.len()
    }
}

pub struct RecordMapper;

impl RecordMapper {
    pub fn paper(entry: &MetadataEntry) -> PaperRecord {
        PaperRecord {
            paper_id: entry.paper_id.clone(),
            revision: entry.revision,
            title: entry.title.clone(),
            doi: entry.doi.clone(),
            submission_date: entry.created_at.date_naive(),
            revision_date: entry.updated_at.date_naive(),
            created_at: entry.created_at,
            updated_at: entry.updated_at,
        }
    }

    pub fn membership(entry: &MetadataEntry) -> CategoryMembershipRecord {
        CategoryMembershipRecord {
            paper_id: entry.paper_id.clone(),
            revision: entry.revision,
            category_id: entry.primary_category.clone(),
            created_at: entry.created_at,
        }
    }

    pub fn authorships(entry: &MetadataEntry) -> Vec<AuthorshipRecord> {
        entry
            .authors
            .iter()
            .map(|author| AuthorshipRecord {
                paper_id: entry.paper_id.clone(),
                revision: entry.revision,
                author_name: author.name.clone(),
                created_at: entry.created_at,
            })
            .collect()
    }

    /// Maps and validates every record of `entry`.
    pub fn map(entry: &MetadataEntry) -> Result<MappedRecords> {
        let paper = Self::paper(entry);
        validate(&paper)?;

        let membership = Self::membership(entry);
        validate(&membership)?;

        let authorships = Self::authorships(entry);
        for authorship in &authorships {
            validate(authorship)?;
        }

        Ok(MappedRecords {
            paper,
            membership,
            authorships,
        })
    }
}

fn validate<R: OutputRecord>(record: &R) -> Result<()> {
    record
        .validate()
        .map_err(|e| IngestError::RecordValidation {
            route: R::ROUTE,
            reason: e.to_string(),
        })
}
