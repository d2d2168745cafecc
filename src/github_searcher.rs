use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION, RETRY_AFTER};
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use std::env;
use tracing::{debug, error, warn};
use url::Url;

use crate::api::{Blob, CodeSearchApi, SearchPage, SearchResultItem};
use crate::error::{FinderError, Result};
use crate::rate_limit::RateLimitInfo;
use crate::Args;

/// Environment variables consulted for the API token, in order.
pub const TOKEN_VARS: [&str; 2] = ["GH_TOKEN", "GITHUB_TOKEN"];

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    total_count: u64,
    #[serde(default)]
    items: Vec<SearchResultItem>,
}

/// `CodeSearchApi` backed by the GitHub REST API.
pub struct GitHubSearcher {
    client: Client,
    token: String,
    api_url: String,
}

impl GitHubSearcher {
    /// Create a new GitHubSearcher instance
    pub fn new(args: &Args) -> Result<Self> {
        let token = resolve_token(args.token.as_deref(), |name| env::var(name).ok())?;

        let client = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(GitHubSearcher {
            client,
            token,
            api_url: args.api_url.trim_end_matches('/').to_string(),
        })
    }

    /// URL of the first code search page for `query`.
    pub fn search_url(&self, query: &str, per_page: u32) -> Result<String> {
        let base = format!("{}/search/code", self.api_url);
        let url = Url::parse_with_params(
            &base,
            &[("per_page", per_page.to_string().as_str()), ("q", query)],
        )?;
        Ok(url.into())
    }

    async fn get(&self, url: &str) -> Result<Response> {
        debug!("Requesting URL: {}", url);
        let response = self
            .client
            .get(url)
            .header(ACCEPT, "application/vnd.github+json")
            .header(AUTHORIZATION, format!("Bearer {}", self.token))
            .header("X-GitHub-Api-Version", "2022-11-28")
            .send()
            .await?;
        Ok(response)
    }
}

#[async_trait]
impl CodeSearchApi for GitHubSearcher {
    async fn search_page(&self, url: &str) -> Result<SearchPage> {
        let response = self.get(url).await?;

        // Search only exposes the first 1000 results
        if response.status() == StatusCode::UNPROCESSABLE_ENTITY {
            warn!("Reached search limit at {}", url);
            return Ok(SearchPage::Exhausted);
        }

        // Secondary rate limit: pace by Retry-After and stop paging
        if is_rate_limited(response.status()) && response.headers().contains_key(RETRY_AFTER) {
            warn!("Rate limited ({}) at {}", response.status(), url);
            let rate_limit = RateLimitInfo {
                next_url: None,
                ..RateLimitInfo::from_headers(response.headers())?
            };
            return Ok(SearchPage::Results {
                items: Vec::new(),
                rate_limit,
            });
        }

        if !response.status().is_success() {
            error!("Error: {} for {}", response.status(), url);
            return Err(FinderError::Status {
                status: response.status(),
                url: url.to_string(),
            });
        }

        let rate_limit = RateLimitInfo::from_headers(response.headers())?;
        let body = response.text().await?;
        let parsed: SearchResponse = serde_json::from_str(&body)?;
        debug!(
            "Page has {} items of {} total",
            parsed.items.len(),
            parsed.total_count
        );

        Ok(SearchPage::Results {
            items: parsed.items,
            rate_limit,
        })
    }

    async fn fetch_blob(&self, git_url: &str) -> Result<Blob> {
        let response = self.get(git_url).await?;

        if !response.status().is_success() {
            return Err(FinderError::Status {
                status: response.status(),
                url: git_url.to_string(),
            });
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

/// Guidance printed when no token could be found.
pub fn missing_token_help() -> String {
    format!(
        "ERROR:\n\tSet the {} environment variable, or pass --token, before running.\n\n\tYou can create a PAT (personal access token) on: https://github.com/settings/tokens\n\nExiting.",
        TOKEN_VARS.join(" (or ") + ")"
    )
}

fn is_rate_limited(status: StatusCode) -> bool {
    status == StatusCode::FORBIDDEN || status == StatusCode::TOO_MANY_REQUESTS
}

/// Pick the API token: explicit value first, then [`TOKEN_VARS`] in order.
/// Blank values count as absent.
pub fn resolve_token<F>(explicit: Option<&str>, lookup: F) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(token) = explicit.filter(|t| !t.trim().is_empty()) {
        return Ok(token.trim().to_string());
    }

    TOKEN_VARS
        .iter()
        .filter_map(|name| lookup(name))
        .map(|token| token.trim().to_string())
        .find(|token| !token.is_empty())
        .ok_or(FinderError::MissingToken)
}
