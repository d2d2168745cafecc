use async_trait::async_trait;
use serde::Deserialize;

use crate::error::{FinderError, Result};
use crate::rate_limit::RateLimitInfo;
use crate::workflow::decode_content;

/// One hit from the code search endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SearchResultItem {
    /// API locator of the blob holding the file content.
    pub git_url: String,
    pub html_url: String,
}

/// A single page of search results.
#[derive(Debug, Clone)]
pub enum SearchPage {
    Results {
        items: Vec<SearchResultItem>,
        rate_limit: RateLimitInfo,
    },
    /// The API refused to page any deeper into the result set.
    Exhausted,
}

/// Blob payload as returned by the git data API.
#[derive(Debug, Clone, Deserialize)]
pub struct Blob {
    pub content: String,
    #[serde(default)]
    pub encoding: Option<String>,
}

impl Blob {
    /// Raw file bytes. Only base64 payloads are supported; a missing
    /// `encoding` is taken to be base64.
    pub fn decode(&self) -> Result<Vec<u8>> {
        match self.encoding.as_deref() {
            None | Some("base64") => decode_content(&self.content),
            Some(other) => Err(FinderError::UnsupportedEncoding(other.to_string())),
        }
    }
}

/// The two API calls the finder depends on.
#[async_trait]
pub trait CodeSearchApi: Send + Sync {
    /// Fetch one page of code search results from a fully-formed URL.
    async fn search_page(&self, url: &str) -> Result<SearchPage>;

    /// Fetch the blob behind a search hit's `git_url`.
    async fn fetch_blob(&self, git_url: &str) -> Result<Blob>;
}
