use std::time::Duration;

use anyhow::Context as _;
use async_trait::async_trait;
use reqwest::header::{ACCEPT, USER_AGENT};
use serde::Deserialize;
use url::Url;

pub const DEFAULT_LOOKUP_URL: &str = "https://openlibrary.org";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

const SEARCH_FIELDS: &str = "number_of_pages_median,first_publish_year";

/// Best match returned by a metadata lookup. Either field may be missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LookupMatch {
    pub pages: Option<u32>,
    pub first_publish_year: Option<i32>,
}

#[async_trait]
pub trait MetadataLookup: Send + Sync {
    /// `Ok(None)` means the service answered but had no match.
    async fn search(&self, title: &str, author: &str) -> anyhow::Result<Option<LookupMatch>>;
}

/// Used when enrichment is turned off; never touches the network.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledLookup;

#[async_trait]
impl MetadataLookup for DisabledLookup {
    async fn search(&self, _title: &str, _author: &str) -> anyhow::Result<Option<LookupMatch>> {
        Ok(None)
    }
}

/// Open Library `search.json` client.
#[derive(Debug, Clone)]
pub struct OpenLibraryLookup {
    client: reqwest::Client,
    endpoint: Url,
}

impl OpenLibraryLookup {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("build lookup http client")?;
        let endpoint = search_endpoint(base_url)?;
        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl MetadataLookup for OpenLibraryLookup {
    async fn search(&self, title: &str, author: &str) -> anyhow::Result<Option<LookupMatch>> {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("title", title)
            .append_pair("author", author)
            .append_pair("limit", "1")
            .append_pair("fields", SEARCH_FIELDS);

        let response = self
            .client
            .get(url.clone())
            .header(USER_AGENT, concat!("readtrack/", env!("CARGO_PKG_VERSION")))
            .header(ACCEPT, "application/json")
            .send()
            .await
            .with_context(|| format!("GET {url}"))?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("metadata lookup error ({status})");
        }

        let body: SearchResponse = response
            .json()
            .await
            .context("parse metadata lookup response")?;
        Ok(body.docs.into_iter().next().map(LookupMatch::from))
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    docs: Vec<SearchDoc>,
}

#[derive(Debug, Deserialize)]
struct SearchDoc {
    #[serde(default)]
    number_of_pages_median: Option<u32>,
    #[serde(default)]
    first_publish_year: Option<i32>,
}

impl From<SearchDoc> for LookupMatch {
    fn from(doc: SearchDoc) -> Self {
        Self {
            pages: doc.number_of_pages_median,
            first_publish_year: doc.first_publish_year,
        }
    }
}

fn search_endpoint(base_url: &str) -> anyhow::Result<Url> {
    let base_url = base_url.trim().trim_end_matches('/');
    let endpoint = format!("{base_url}/search.json");
    let url = Url::parse(&endpoint).with_context(|| format!("parse lookup url: {endpoint}"))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        anyhow::bail!("lookup url scheme must be http/https: {base_url}");
    }
    Ok(url)
}
