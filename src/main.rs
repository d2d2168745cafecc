use action_usage_finder_lib::{
    missing_token_help, Args, FinderError, GitHubSearcher, Reporter, UsageFinder,
};
use clap::Parser;
use dotenv::dotenv;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    // Logs go to stderr; stdout carries the report
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    dotenv().ok();

    let args = Args::parse();

    match run(&args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(FinderError::MissingToken) => {
            println!("{}", missing_token_help());
            ExitCode::FAILURE
        }
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: &Args) -> Result<(), FinderError> {
    let searcher = GitHubSearcher::new(args)?;

    let query = args.search_query();
    info!("Starting search for: {}", query);
    let first_url = searcher.search_url(&query, args.per_page)?;

    let finder = UsageFinder::new(
        searcher,
        &args.action,
        &args.key,
        Reporter::new(!args.no_progress),
    )
    .with_max_pages(args.max_pages);

    let report = finder.run(&first_url).await?;
    info!(
        "Finished: {} matches in {} items",
        report.matches.len(),
        report.items_found
    );
    Ok(())
}
