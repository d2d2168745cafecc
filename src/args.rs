use clap::Parser;

/// Finds GitHub workflow files that use an action together with a given input.
#[derive(Parser, Debug, Clone)]
#[clap(
    author,
    version,
    about,
    long_about = "Searches GitHub code for workflow files referencing an action, downloads each hit and reports the steps that pass a given `with:` key to that action."
)]
pub struct Args {
    /// Action reference to look for in a step's `uses` field.
    #[clap(
        short,
        long,
        default_value = "ChrisCarini/intellij-platform-plugin-verifier-action"
    )]
    pub action: String,

    /// Key that must be present in the step's `with` mapping.
    #[clap(short, long, default_value = "verifier-version")]
    pub key: String,

    /// Raw code search query. Derived from the action and key when omitted.
    #[clap(short, long)]
    pub query: Option<String>,

    /// Results per search page (GitHub caps this at 100).
    #[clap(long, default_value = "100", value_name = "NUM")]
    pub per_page: u32,

    /// Maximum number of search pages to retrieve.
    #[clap(short = 'p', long, value_name = "NUM")]
    pub max_pages: Option<u32>,

    /// GitHub API token. Falls back to GH_TOKEN, then GITHUB_TOKEN.
    #[clap(short, long)]
    pub token: Option<String>,

    /// Base URL of the GitHub REST API.
    #[clap(long, default_value = "https://api.github.com")]
    pub api_url: String,

    /// Hide the progress bar.
    #[clap(long)]
    pub no_progress: bool,
}

impl Args {
    /// The search query to run.
    ///
    /// Without an explicit `--query`, every quoted term has to appear in the
    /// file: the `with` key plus each segment of the action's path.
    pub fn search_query(&self) -> String {
        if let Some(query) = &self.query {
            return query.clone();
        }

        let mut terms = vec![format!("\"{}\"", self.key)];
        terms.extend(
            self.action
                .split('@')
                .next()
                .unwrap_or_default()
                .split('/')
                .filter(|segment| !segment.is_empty())
                .map(|segment| format!("\"{}\"", segment)),
        );
        terms.push("language:YAML".to_string());
        terms.join(" ")
    }
}
