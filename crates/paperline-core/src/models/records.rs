use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use validator::Validate;

/// Flat field-name → value mapping submitted to the output sink.
pub type RecordFields = Map<String, Value>;

/// Target collection of an output record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordRoute {
    Paper,
    Authorship,
    CategoryMembership,
}

impl RecordRoute {
    /// Path of the collection, relative to the sink base URL.
    pub fn api_path(&self) -> &'static str {
        match self {
            Self::Paper => "paper",
            Self::Authorship => "paper/author",
            Self::CategoryMembership => "category/membership",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Paper => "Paper",
            Self::Authorship => "Authorship",
            Self::CategoryMembership => "CategoryMembership",
        }
    }
}

impl fmt::Display for RecordRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct PaperRecord {
    #[serde(rename = "arxiv_id")]
    #[validate(length(min = 1, max = 64))]
    pub paper_id: String,

    #[serde(rename = "arxiv_rev")]
    #[validate(range(min = 1))]
    pub revision: u32,

    #[validate(length(min = 1, max = 1024))]
    pub title: String,

    #[serde(rename = "doi_id")]
    #[validate(length(max = 128))]
    pub doi: String,

    pub submission_date: NaiveDate,
    pub revision_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct AuthorshipRecord {
    #[serde(rename = "arxiv_id")]
    #[validate(length(min = 1, max = 64))]
    pub paper_id: String,

    #[serde(rename = "arxiv_rev")]
    #[validate(range(min = 1))]
    pub revision: u32,

    #[validate(length(min = 1, max = 256))]
    pub author_name: String,

    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct CategoryMembershipRecord {
    #[serde(rename = "arxiv_id")]
    #[validate(length(min = 1, max = 64))]
    pub paper_id: String,

    #[serde(rename = "arxiv_rev")]
    #[validate(range(min = 1))]
    pub revision: u32,

    #[validate(length(min = 1, max = 32))]
    pub category_id: String,

    pub created_at: DateTime<Utc>,
}

/// Shape shared by every record the dispatcher submits.
pub trait OutputRecord: Serialize + Validate {
    const ROUTE: RecordRoute;

    fn paper_id(&self) -> &str;
    fn revision(&self) -> u32;

    fn author_name(&self) -> Option<&str> {
        None
    }

    fn to_fields(&self) -> serde_json::Result<RecordFields> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            other => Err(serde::ser::Error::custom(format!(
                "record serialized to a non-object value: {other}"
            ))),
        }
    }
}

impl OutputRecord for PaperRecord {
    const ROUTE: RecordRoute = RecordRoute::Paper;

    fn paper_id(&self) -> &str {
        &self.paper_id
    }

    fn revision(&self) -> u32 {
        self.revision
    }
}

impl OutputRecord for AuthorshipRecord {
    const ROUTE: RecordRoute = RecordRoute::Authorship;

    fn paper_id(&self) -> &str {
        &self.paper_id
    }

    fn revision(&self) -> u32 {
        self.revision
    }

    fn author_name(&self) -> Option<&str> {
        Some(&self.author_name)
    }
}

impl OutputRecord for CategoryMembershipRecord {
    const ROUTE: RecordRoute = RecordRoute::CategoryMembership;

    fn paper_id(&self) -> &str {
        &self.paper_id
    }

    fn revision(&self) -> u32 {
        self.revision
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn paper() -> PaperRecord {
        let ts = Utc.with_ymd_and_hms(2003, 7, 7, 17, 46, 40).unwrap();
        PaperRecord {
            paper_id: "hep-ex/0307015".to_string(),
            revision: 1,
            title: "Multi-Electron Production".to_string(),
            doi: String::new(),
            submission_date: ts.date_naive(),
            revision_date: ts.date_naive(),
            created_at: ts,
            updated_at: ts,
        }
    }

    #[test]
    fn test_paper_fields_use_wire_names() {
        let fields = paper().to_fields().unwrap();
        assert_eq!(fields["arxiv_id"], "hep-ex/0307015");
        assert_eq!(fields["arxiv_rev"], 1);
        assert_eq!(fields["doi_id"], "");
        assert_eq!(fields["submission_date"], "2003-07-07");
        assert_eq!(fields["created_at"], "2003-07-07T17:46:40Z");
    }

    #[test]
    fn test_paper_validation_limits() {
        assert!(paper().validate().is_ok());

        let mut long_title = paper();
        long_title.title = "x".repeat(1025);
        assert!(long_title.validate().is_err());

        let mut no_revision = paper();
        no_revision.revision = 0;
        assert!(no_revision.validate().is_err());
    }

    #[test]
    fn test_route_paths() {
        assert_eq!(RecordRoute::Paper.api_path(), "paper");
        assert_eq!(RecordRoute::Authorship.api_path(), "paper/author");
        assert_eq!(
            RecordRoute::CategoryMembership.api_path(),
            "category/membership"
        );
        assert_eq!(RecordRoute::CategoryMembership.to_string(), "CategoryMembership");
    }
}
