use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use paperline_core::MetadataEntry;
use serde_json::Value;
use tracing::{info, warn};

use crate::diagnostics::Diagnostics;
use crate::error::Result;
use crate::parsers::{JsonMetadataParser, MetadataParser};
use crate::sources::MetadataSource;

/// Lookups against a JSON-lines metadata snapshot indexed in memory by paper ID.
pub struct FileSource {
    path: Option<PathBuf>,
    entries: HashMap<String, Value>,
    parser: JsonMetadataParser,
}

impl FileSource {
    pub fn open(path: impl AsRef<Path>, parser: JsonMetadataParser) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let mut source = Self::from_reader(BufReader::new(file), parser)?;
        info!(path = %path.display(), papers = source.len(), "indexed metadata snapshot");
        source.path = Some(path.to_path_buf());
        Ok(source)
    }

    pub fn from_reader<R: BufRead>(reader: R, parser: JsonMetadataParser) -> Result<Self> {
        let mut entries = HashMap::new();

        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let value: Value = match serde_json::from_str(line) {
                Ok(value) => value,
                Err(e) => {
                    warn!(line = index + 1, error = %e, "skipping unparsable snapshot line");
                    continue;
                }
            };

            let Some(id) = value.get("id").and_then(Value::as_str).map(str::to_string) else {
                warn!(line = index + 1, "skipping snapshot line without a string id");
                continue;
            };

            entries.insert(id, value);
        }

        Ok(Self {
            path: None,
            entries,
            parser,
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, paper_id: &str) -> bool {
        self.entries.contains_key(paper_id)
    }
}

#[async_trait]
impl MetadataSource for FileSource {
    fn name(&self) -> &str {
        "snapshot"
    }

    async fn get_metadata(
        &self,
        paper_id: &str,
        diagnostics: &mut Diagnostics,
    ) -> Vec<MetadataEntry> {
        let Some(raw) = self.entries.get(paper_id) else {
            diagnostics.warn(
                Some(paper_id),
                format!("Paper {paper_id} not found in the metadata snapshot"),
            );
            return Vec::new();
        };

        match self.parser.parse_body(raw, diagnostics) {
            Ok(entries) => entries,
            Err(e) => {
                diagnostics.error(
                    Some(paper_id),
                    format!("Paper {paper_id} snapshot entry is invalid: {e}"),
                );
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::DiagnosticLevel;
    use std::io::{Cursor, Write};

    const SNAPSHOT: &str = r#"{"id": "0704.0001", "title": "Diphoton", "abstract": "Abs", "categories": "hep-ph", "doi": "10.1103/PhysRevD.76.013009", "versions": [{"version": "v1", "created": "Mon, 2 Apr 2007 19:18:42 GMT"}, {"version": "v2", "created": "Tue, 24 Jul 2007 20:10:27 GMT"}], "authors_parsed": [["Balázs", "C.", ""]]}

not json at all
{"title": "no id here"}
{"id": "0704.0002", "title": "Sparsity", "abstract": "Abs", "categories": "math.CO cs.CG", "doi": null, "versions": [{"version": "v1", "created": "Sat, 31 Mar 2007 02:26:18 GMT"}], "authors_parsed": [["Streinu", "Ileana", ""]]}
{"id": "0704.0003", "title": "Broken", "categories": "physics.gen-ph", "versions": [{"version": "v1", "created": "not a date"}]}
"#;

    fn source() -> FileSource {
        FileSource::from_reader(Cursor::new(SNAPSHOT), JsonMetadataParser::new().unwrap()).unwrap()
    }

    #[test]
    fn indexes_valid_lines_only() {
        let source = source();
        assert_eq!(source.len(), 3);
        assert!(source.contains("0704.0001"));
        assert!(!source.contains("no id here"));
        assert!(source.path().is_none());
    }

    #[tokio::test]
    async fn returns_every_revision() {
        let mut diagnostics = Diagnostics::new();
        let entries = source().get_metadata("0704.0001", &mut diagnostics).await;
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].revision, 2);
        assert!(diagnostics.is_empty());
    }

    #[tokio::test]
    async fn missing_paper_is_empty_not_error() {
        let mut diagnostics = Diagnostics::new();
        let entries = source().get_metadata("9999.0000", &mut diagnostics).await;
        assert!(entries.is_empty());
        assert_eq!(diagnostics.at_level(DiagnosticLevel::Warning).count(), 1);
    }

    #[tokio::test]
    async fn invalid_entry_is_empty_with_error() {
        let mut diagnostics = Diagnostics::new();
        let entries = source().get_metadata("0704.0003", &mut diagnostics).await;
        assert!(entries.is_empty());
        assert_eq!(diagnostics.at_level(DiagnosticLevel::Error).count(), 1);
    }

    #[test]
    fn opens_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SNAPSHOT.as_bytes()).unwrap();

        let source = FileSource::open(file.path(), JsonMetadataParser::new().unwrap()).unwrap();
        assert_eq!(source.len(), 3);
        assert_eq!(source.path(), Some(file.path()));
    }
}
