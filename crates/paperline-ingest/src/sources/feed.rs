use std::time::Duration;

use async_trait::async_trait;
use paperline_core::MetadataEntry;
use paperline_core::config::ARXIV_EXPORT_API;

use crate::diagnostics::Diagnostics;
use crate::error::Result;
use crate::http::RateLimitedClient;
use crate::parsers::{FeedMetadataParser, MetadataParser};
use crate::sources::MetadataSource;

/// Live lookups against the arXiv export API.
pub struct FeedSource {
    client: RateLimitedClient,
    base_url: String,
    parser: FeedMetadataParser,
}

impl FeedSource {
    pub fn new(base_url: &str, client: RateLimitedClient) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            parser: FeedMetadataParser::new(),
        }
    }

    /// arXiv asks for at most one request every three seconds.
    pub fn arxiv() -> Result<Self> {
        Self::with_params(ARXIV_EXPORT_API, Duration::from_secs(3))
    }

    pub fn with_params(base_url: &str, min_interval: Duration) -> Result<Self> {
        let client = RateLimitedClient::new(min_interval, 3, "paperline/0.1")?;
        Ok(Self::new(base_url, client))
    }

    pub fn query_url(&self, paper_id: &str) -> String {
        let (path, query) = match self.base_url.split_once('?') {
            Some((path, query)) => (path.trim_end_matches('/'), Some(query)),
            None => (self.base_url.as_str(), None),
        };

        let endpoint = if path.ends_with("/query") {
            path.to_string()
        } else {
            format!("{path}/query")
        };

        match query {
            Some(query) if !query.is_empty() => format!("{endpoint}?{query}&id_list={paper_id}"),
            _ => format!("{endpoint}?id_list={paper_id}"),
        }
    }

    async fn fetch(&self, paper_id: &str, diagnostics: &mut Diagnostics) -> Result<Vec<MetadataEntry>> {
        let xml = self.client.get(&self.query_url(paper_id)).await?;
        self.parser.parse_body(&xml, diagnostics)
    }
}

#[async_trait]
impl MetadataSource for FeedSource {
    fn name(&self) -> &str {
        "feed"
    }

    async fn get_metadata(
        &self,
        paper_id: &str,
        diagnostics: &mut Diagnostics,
    ) -> Vec<MetadataEntry> {
        match self.fetch(paper_id, diagnostics).await {
            Ok(entries) => entries,
            Err(e) => {
                diagnostics.error(
                    Some(paper_id),
                    format!("Paper {paper_id} not retrieved from the feed API: {e}"),
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
    use mockito::Server;

    const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <entry>
    <id>http://arxiv.org/abs/1706.03762v5</id>
    <updated>2023-08-02T03:09:44Z</updated>
    <published>2017-06-12T17:57:34Z</published>
    <title>Attention Is All You Need</title>
    <summary>Abstract</summary>
    <author><name>Ashish Vaswani</name></author>
    <arxiv:primary_category xmlns:arxiv="http://arxiv.org/schemas/atom" term="cs.CL"/>
    <category term="cs.CL"/>
  </entry>
</feed>"#;

    fn source(base_url: &str) -> FeedSource {
        FeedSource::with_params(base_url, Duration::from_secs(0)).unwrap()
    }

    #[test]
    fn builds_query_urls() {
        assert_eq!(
            source("https://export.arxiv.org/api").query_url("hep-ex/0307015"),
            "https://export.arxiv.org/api/query?id_list=hep-ex/0307015"
        );
        assert_eq!(
            source("http://localhost:1234/query/").query_url("0704.0001"),
            "http://localhost:1234/query?id_list=0704.0001"
        );
        assert_eq!(
            source("http://localhost:1234/query?max_results=50").query_url("0704.0001"),
            "http://localhost:1234/query?max_results=50&id_list=0704.0001"
        );
    }

    #[tokio::test]
    async fn fetches_and_parses_entries() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/query?id_list=1706.03762")
            .with_status(200)
            .with_header("content-type", "application/atom+xml")
            .with_body(FEED)
            .create_async()
            .await;

        let mut diagnostics = Diagnostics::new();
        let entries = source(&server.url())
            .get_metadata("1706.03762", &mut diagnostics)
            .await;

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].title, "Attention Is All You Need");
        assert_eq!(entries[0].revision, 5);
        assert_eq!(entries[0].primary_category, "cs.CL");
    }

    #[tokio::test]
    async fn server_errors_become_empty_results() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/query?id_list=0704.9999")
            .with_status(503)
            .create_async()
            .await;

        let mut diagnostics = Diagnostics::new();
        let entries = source(&server.url())
            .get_metadata("0704.9999", &mut diagnostics)
            .await;

        assert!(entries.is_empty());
        assert_eq!(diagnostics.at_level(DiagnosticLevel::Error).count(), 1);
    }

    #[tokio::test]
    async fn malformed_feed_becomes_empty_result() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/query?id_list=0704.0001")
            .with_status(200)
            .with_body("<feed><entry>")
            .create_async()
            .await;

        let mut diagnostics = Diagnostics::new();
        let entries = source(&server.url())
            .get_metadata("0704.0001", &mut diagnostics)
            .await;

        assert!(entries.is_empty());
        assert_eq!(diagnostics.for_paper("0704.0001").count(), 1);
    }
}
