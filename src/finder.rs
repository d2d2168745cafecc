use chrono::Utc;
use futures::stream::{self, Stream, TryStreamExt};
use tokio::time::sleep;
use tracing::{debug, info};

use crate::api::{CodeSearchApi, SearchPage, SearchResultItem};
use crate::error::{FinderError, Result};
use crate::rate_limit::{pacing_delay, RateLimitInfo};
use crate::reporter::Reporter;
use crate::workflow::ParsedWorkflow;

/// Outcome of a full search-and-scan run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanReport {
    pub items_found: usize,
    /// `html_url` of the file, once per matching step.
    pub matches: Vec<String>,
}

struct PageCursor {
    next: Option<String>,
    fetched: u32,
}

/// Searches for workflow files and inspects each hit for `action` used with
/// `key` in its `with` block.
pub struct UsageFinder<A> {
    api: A,
    action: String,
    key: String,
    max_pages: Option<u32>,
    reporter: Reporter,
}

impl<A: CodeSearchApi> UsageFinder<A> {
    pub fn new(
        api: A,
        action: impl Into<String>,
        key: impl Into<String>,
        reporter: Reporter,
    ) -> Self {
        UsageFinder {
            api,
            action: action.into(),
            key: key.into(),
            max_pages: None,
            reporter,
        }
    }

    pub fn with_max_pages(mut self, max_pages: Option<u32>) -> Self {
        self.max_pages = max_pages;
        self
    }

    /// Collect every search hit starting at `first_url`, then scan each one.
    pub async fn run(&self, first_url: &str) -> Result<ScanReport> {
        let items = self.collect_items(first_url).await?;
        self.reporter.items_found(items.len());

        let matches = self.scan(&items).await?;
        self.reporter.finish(matches.len());

        Ok(ScanReport {
            items_found: items.len(),
            matches,
        })
    }

    /// All items across all pages, in API order. Duplicates are kept.
    pub async fn collect_items(&self, first_url: &str) -> Result<Vec<SearchResultItem>> {
        self.pages(first_url)
            .try_fold(Vec::new(), |mut items, page| async move {
                items.extend(page);
                Ok::<_, FinderError>(items)
            })
            .await
    }

    /// Lazily fetch result pages, pacing between requests and following
    /// `Link: rel="next"` until no next page remains.
    pub fn pages<'a>(
        &'a self,
        first_url: &str,
    ) -> impl Stream<Item = Result<Vec<SearchResultItem>>> + 'a {
        let cursor = PageCursor {
            next: Some(first_url.to_string()),
            fetched: 0,
        };

        stream::unfold(cursor, move |cursor| async move {
            let Some(url) = cursor.next else {
                return None;
            };
            self.reporter.page(&url);

            let (items, rate_limit) = match self.api.search_page(&url).await {
                Ok(SearchPage::Results { items, rate_limit }) => (items, rate_limit),
                Ok(SearchPage::Exhausted) => {
                    self.reporter.pagination_done();
                    return None;
                }
                Err(e) => {
                    let done = PageCursor {
                        next: None,
                        fetched: cursor.fetched,
                    };
                    return Some((Err(e), done));
                }
            };

            let fetched = cursor.fetched + 1;
            info!("Fetched page {} with {} items", fetched, items.len());
            self.reporter.rate_limit(&rate_limit);

            let capped = self.max_pages.is_some_and(|max| fetched >= max);
            if capped && rate_limit.next_url.is_some() {
                info!("Max page limit reached (limit: {})", fetched);
            }
            let rate_limit = RateLimitInfo {
                next_url: rate_limit.next_url.filter(|_| !capped),
                ..rate_limit
            };

            if let Some(delay) = pacing_delay(&rate_limit, Utc::now()) {
                self.reporter.sleeping(delay);
                sleep(delay).await;
            }

            if rate_limit.next_url.is_none() {
                self.reporter.pagination_done();
            }

            let next = PageCursor {
                next: rate_limit.next_url,
                fetched,
            };
            Some((Ok(items), next))
        })
    }

    /// Download and inspect each item, returning the matching `html_url`s.
    pub async fn scan(&self, items: &[SearchResultItem]) -> Result<Vec<String>> {
        let mut matches = Vec::new();

        for item in items {
            self.reporter.processing(&item.html_url);
            let blob = self.api.fetch_blob(&item.git_url).await?;
            let bytes = blob.decode()?;

            match ParsedWorkflow::parse(&bytes)? {
                Some(workflow) => {
                    for _ in 0..workflow.matching_steps(&self.action, &self.key) {
                        self.reporter.found(&item.html_url);
                        matches.push(item.html_url.clone());
                    }
                }
                None => debug!("Skipping {}: not a workflow mapping", item.html_url),
            }

            self.reporter.item_done();
        }

        Ok(matches)
    }
}
