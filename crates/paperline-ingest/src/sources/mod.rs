pub mod chain;
pub mod feed;
pub mod file;

pub use chain::SourceResolutionChain;
pub use feed::FeedSource;
pub use file::FileSource;

use async_trait::async_trait;
use paperline_core::{AppConfig, CoreError, MetadataEntry};

use crate::diagnostics::Diagnostics;
use crate::error::Result;
use crate::http::RateLimitedClient;
use crate::parsers::JsonMetadataParser;

/// Anything able to answer "all metadata entries for this paper".
///
/// Implementations never fail: retrieval or parse problems are recorded in
/// `diagnostics` and an empty list is returned, which the chain reads as
/// "not found here".
#[async_trait]
pub trait MetadataSource: Send + Sync {
    fn name(&self) -> &str;

    async fn get_metadata(&self, paper_id: &str, diagnostics: &mut Diagnostics)
    -> Vec<MetadataEntry>;
}

/// Builds a source from its URL: `file://` snapshots or `http(s)://` feed APIs.
pub fn from_url(url: &str, config: &AppConfig) -> Result<Box<dyn MetadataSource>> {
    let url = url.trim();

    if let Some(path) = url.strip_prefix("file://") {
        let parser = JsonMetadataParser::with_date_format(&config.dates.snapshot_format)?;
        return Ok(Box::new(FileSource::open(path, parser)?));
    }

    if url.starts_with("http://") || url.starts_with("https://") {
        let client = RateLimitedClient::from_config(&config.http)?;
        return Ok(Box::new(FeedSource::new(url, client)));
    }

    Err(CoreError::Config(format!("no metadata source for URL {url:?}")).into())
}
