//! # Action Usage Finder
//!
//! Searches GitHub code for workflow files that reference a given action,
//! downloads every hit and reports the steps that use the action together
//! with a particular `with:` input.
//!
//! ## Main Components
//!
//! - [`UsageFinder`]: paginates through search results, pacing requests by the
//!   API's rate-limit headers, then inspects each file
//! - [`GitHubSearcher`]: the [`CodeSearchApi`] implementation talking to GitHub
//! - [`ParsedWorkflow`]: a decoded workflow document and its step matcher
//! - [`Args`]: command line configuration
//!
//! ## Example
//!
//! ```no_run
//! use action_usage_finder_lib::{Args, GitHubSearcher, Reporter, UsageFinder};
//! use clap::Parser;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     let args = Args::parse();
//!
//!     let searcher = GitHubSearcher::new(&args)?;
//!     let first_url = searcher.search_url(&args.search_query(), args.per_page)?;
//!
//!     let finder = UsageFinder::new(searcher, &args.action, &args.key, Reporter::new(true));
//!     let report = finder.run(&first_url).await?;
//!     println!("{:?}", report.matches);
//!
//!     Ok(())
//! }
//! ```

mod api;
mod args;
mod error;
mod finder;
mod github_searcher;
mod rate_limit;
mod reporter;
mod workflow;

pub use crate::api::{Blob, CodeSearchApi, SearchPage, SearchResultItem};
pub use crate::args::Args;
pub use crate::error::{FinderError, Result};
pub use crate::finder::{ScanReport, UsageFinder};
pub use crate::github_searcher::{missing_token_help, resolve_token, GitHubSearcher, TOKEN_VARS};
pub use crate::rate_limit::{next_link, pacing_delay, RateLimitInfo};
pub use crate::reporter::Reporter;
pub use crate::workflow::{decode_content, ParsedWorkflow};
