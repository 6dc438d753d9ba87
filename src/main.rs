//! Wiki-History main entry point
//!
//! This is the command-line interface for loading the revision history of a
//! Wikipedia article and summarizing who edited it.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use wiki_history::config::{load_config, validate, Config};
use wiki_history::history::{
    AbortHandle, ApiClient, HistoryFetcher, PaginationDriver, PaginationOptions,
};
use wiki_history::stats::{print_statistics, StatisticsFetcher};
use wiki_history::{parse_wikipedia_url, DataSettings, EditorSummary, RevisionAggregate};

/// Wiki-History: revision history of a Wikipedia article
///
/// Paste the URL of an article; its revisions are loaded page by page
/// (newest first) and summarized per editor.
#[derive(Parser, Debug)]
#[command(name = "wiki-history")]
#[command(version)]
#[command(about = "Load and summarize the revision history of a Wikipedia article", long_about = None)]
struct Cli {
    /// Article URL, e.g. https://fr.wikipedia.org/wiki/Louvre
    #[arg(value_name = "URL")]
    url: String,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Maximum number of history pages to load
    #[arg(long)]
    max_pages: Option<u32>,

    /// Pause between page requests (milliseconds)
    #[arg(long, value_name = "MS")]
    delay: Option<u64>,

    /// Hide minor edits from the summary
    #[arg(long)]
    no_minors: bool,

    /// Hide revisions whose editor name is unknown
    #[arg(long)]
    no_unknown_editors: bool,

    /// Also fetch page statistics (edit, editor and revert counts)
    #[arg(long)]
    stats: bool,

    /// Number of editors to list
    #[arg(long, default_value_t = 10)]
    top: usize,

    /// Bearer token for authenticated requests
    #[arg(long, env = "WIKIMEDIA_ACCESS_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            load_config(path).with_context(|| {
                format!("Failed to load configuration from {}", path.display())
            })?
        }
        None => Config::default(),
    };
    apply_overrides(&cli, &mut config);
    validate(&config).context("Invalid command-line options")?;

    // Validation errors stop here, before any request is made
    let descriptor = parse_wikipedia_url(&cli.url)?;
    tracing::info!("Loading history of {}", descriptor);

    let api = ApiClient::new(&config)?.with_token(cli.token.clone());

    let abort = AbortHandle::new();
    let ctrl_c = abort.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupted, stopping after the current request");
            ctrl_c.abort();
        }
    });

    let mut aggregate = RevisionAggregate::new();
    let mut driver = PaginationDriver::new(
        HistoryFetcher::new(api.clone()),
        descriptor.clone(),
        PaginationOptions::from(&config.pagination),
        abort.signal(),
    );

    aggregate.set_loading(true);
    let outcome = loop {
        match driver.next_page(&mut aggregate).await {
            Ok(Some(event)) => {
                if !cli.quiet {
                    println!(
                        "Page {}: +{} revisions ({} total)",
                        event.page_number, event.report.accepted, event.total_revisions
                    );
                }
            }
            Ok(None) => break Ok(()),
            Err(e) => break Err(e),
        }
    };
    aggregate.set_loading(false);

    match outcome {
        Ok(()) => {}
        Err(e) if !e.is_user_facing() => {
            tracing::info!(
                "Stopped early; showing the {} revisions loaded so far",
                aggregate.len()
            );
        }
        Err(e) => {
            tracing::error!("Loading history failed: {}", e);
            if aggregate.is_empty() {
                return Err(e.into());
            }
        }
    }

    let settings = DataSettings::from(&config.filters);
    print_history(&aggregate, &settings, cli.top);

    if cli.stats && !abort.is_aborted() {
        println!();
        match StatisticsFetcher::new(api)
            .fetch_all(&descriptor, &abort.signal())
            .await
        {
            Ok(stats) => print_statistics(&stats),
            Err(e) if !e.is_user_facing() => tracing::info!("Statistics fetch interrupted"),
            Err(e) => return Err(e).context("Failed to fetch page statistics"),
        }
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("wiki_history=warn,warn"),
            1 => EnvFilter::new("wiki_history=info,warn"),
            2 => EnvFilter::new("wiki_history=debug,info"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Command-line flags win over the configuration file
fn apply_overrides(cli: &Cli, config: &mut Config) {
    if let Some(max_pages) = cli.max_pages {
        config.pagination.max_pages = max_pages;
    }
    if let Some(delay) = cli.delay {
        config.pagination.inter_page_delay = delay;
    }
    if cli.no_minors {
        config.filters.allow_minors = false;
    }
    if cli.no_unknown_editors {
        config.filters.allow_unknown_editors = false;
    }
}

/// Prints the loaded range and the most active editors
fn print_history(aggregate: &RevisionAggregate, settings: &DataSettings, top: usize) {
    let state = aggregate.state();
    println!("\n=== Revision History ===\n");

    let Some((oldest, newest)) = state.date_range() else {
        println!("No revisions found.");
        return;
    };

    let filtered = aggregate.filtered(settings);
    println!("Revisions loaded: {}", state.revisions.len());
    println!("Revisions shown:  {}", filtered.len());
    println!(
        "Period:           {} .. {}",
        oldest.format("%Y-%m-%d"),
        newest.format("%Y-%m-%d")
    );
    if state.has_more {
        println!("More history is available (raise --max-pages to load it)");
    }

    let summaries = aggregate.editor_summaries(settings);
    println!("\nTop editors ({} distinct):", summaries.len());
    for summary in summaries.iter().take(top) {
        println!("  {}", format_summary(summary));
    }
}

fn format_summary(summary: &EditorSummary) -> String {
    format!(
        "{:<30} {:>5} edits ({} minor), {:>8} bytes changed, since {}",
        summary.name.as_deref().unwrap_or("<hidden>"),
        summary.revision_count,
        summary.minor_count,
        summary.total_absolute_delta,
        summary.first_seen.format("%Y-%m-%d")
    )
}
