use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use tracing::info;

use crate::rate_limit::RateLimitInfo;

/// Progress and match output.
///
/// Report lines go to stdout. The progress bar draws on stderr and is
/// suspended while a line is printed so the two never interleave.
pub struct Reporter {
    pb: ProgressBar,
}

impl Reporter {
    pub fn new(show_progress: bool) -> Self {
        let pb = if show_progress {
            let pb = ProgressBar::new_spinner();
            if let Ok(style) = ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {wide_msg}")
            {
                pb.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"));
            }
            pb.enable_steady_tick(Duration::from_millis(80));
            pb
        } else {
            ProgressBar::hidden()
        };

        Reporter { pb }
    }

    fn line(&self, text: String) {
        self.pb.suspend(|| println!("{}", text));
    }

    pub fn page(&self, url: &str) {
        self.pb.set_message("Searching");
        self.line(format!("Processing URL: {}", url));
    }

    pub fn rate_limit(&self, rate_limit: &RateLimitInfo) {
        self.line(rate_limit.to_string());
    }

    pub fn sleeping(&self, delay: Duration) {
        self.pb
            .set_message(format!("Rate limited - waiting {}s", delay.as_secs()));
        self.line(format!("Sleeping for {} seconds...", delay.as_secs()));
    }

    pub fn pagination_done(&self) {
        self.line("No next URL found; ending.".to_string());
    }

    /// Switch from the search spinner to a bar over the collected items.
    pub fn items_found(&self, count: usize) {
        info!("{} search results collected", count);
        self.line(format!("{} items found.", count));

        self.pb.disable_steady_tick();
        self.pb.set_length(count as u64);
        self.pb.set_position(0);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos:>7}/{len:7} {wide_msg}")
        {
            self.pb.set_style(style.progress_chars("=>-"));
        }
    }

    pub fn processing(&self, html_url: &str) {
        self.pb.set_message(html_url.to_string());
        self.line(format!("Processing: {}", html_url));
    }

    pub fn found(&self, html_url: &str) {
        self.line(format!("FOUND ONE -> {}", html_url));
    }

    pub fn item_done(&self) {
        self.pb.inc(1);
    }

    pub fn finish(&self, matches: usize) {
        self.pb.finish_and_clear();
        self.line(format!("{} matches found.", matches));
    }
}
