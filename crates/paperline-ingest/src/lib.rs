//! Paperline ingest: metadata parsing, source resolution, record dispatch
//! and PDF text extraction.

pub mod corpus;
pub mod dates;
pub mod diagnostics;
pub mod dispatch;
pub mod error;
pub mod http;
pub mod mapping;
pub mod parsers;
pub mod routine;
pub mod sources;
pub mod text;

pub use corpus::{TextReport, TextRoutine, collect_pdfs, extract_pdf_text};
pub use dates::DateExtractor;
pub use diagnostics::{Diagnostic, DiagnosticLevel, Diagnostics};
pub use dispatch::{DispatchMode, DispatchSummary, RecordDispatcher, RecordSink, RestSink};
pub use error::{DispatchError, IngestError, RecordIdentity, Result, SinkError};
pub use mapping::{MappedRecords, RecordMapper};
pub use parsers::{FeedMetadataParser, JsonMetadataParser, MetadataParser};
pub use routine::{MetadataRoutine, RoutineReport};
pub use sources::{FeedSource, FileSource, MetadataSource, SourceResolutionChain};
