use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use price_scout::models::PriceComparison;
use price_scout::{AppConfig, ChromeRenderService, CompareRequest, CompareResponse, PriceComparator};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "price-scout", version, about = "Find a product's price at competing retailers")]
struct Cli {
    /// Config file to load instead of config/{default,RUN_MODE,local}
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,

    /// Debug logging for the engine (RUST_LOG still wins)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Search every other retailer for a product name
    Compare {
        #[arg(short, long)]
        query: String,
        /// Host the user is browsing; that retailer is skipped
        #[arg(long, default_value = "")]
        current_host: String,
    },
    /// Read a product page and compare it against the other retailers
    Page {
        url: String,
        /// Text to search for instead of the page's product title
        #[arg(long)]
        selection: Option<String>,
    },
    /// List the retailers a comparison would search
    Sites {
        #[arg(long, default_value = "")]
        current_host: String,
        #[arg(short, long, default_value = "")]
        query: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Table,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Initialize tracing; stdout is reserved for results
    let directive = if cli.verbose { "price_scout=debug" } else { "price_scout=info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(directive.parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = match &cli.config {
        Some(path) => AppConfig::from_file(path)?,
        None => AppConfig::from_env()?,
    };

    match cli.command {
        Command::Sites { current_host, query } => {
            let targets = price_scout::catalog::build_targets(&query, &current_host);
            match cli.format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&targets)?),
                OutputFormat::Table => {
                    for target in targets {
                        println!("{:<10} {}", target.site, target.search_url);
                    }
                }
            }
        }
        Command::Compare { query, current_host } => {
            let comparator = launch(&config).await?;
            let response = comparator
                .compare(&CompareRequest::new(query, current_host))
                .await;
            print_response(cli.format, &response, None)?;
        }
        Command::Page { url, selection } => {
            let comparator = launch(&config).await?;
            let page = comparator.compare_page(&url, selection.as_deref()).await?;
            info!("Resolved query '{}' on {}", page.query, page.current_host);
            print_response(cli.format, &page.comparison, Some(&page))?;
        }
    }

    Ok(())
}

async fn launch(config: &AppConfig) -> Result<PriceComparator<ChromeRenderService>> {
    info!("Starting headless browser...");
    let scraper = config.scraper.clone();
    let timings = config.timings.clone();
    let service = tokio::task::spawn_blocking(move || ChromeRenderService::new(scraper, &timings)).await??;
    Ok(PriceComparator::new(Arc::new(service), config.timings.clone()))
}

fn print_response(
    format: OutputFormat,
    response: &CompareResponse,
    page: Option<&price_scout::PageComparison>,
) -> Result<()> {
    let summary = PriceComparison::from_results(&response.results);

    match format {
        OutputFormat::Json => {
            let mut output = json!({
                "results": response.results,
                "summary": summary,
            });
            if let Some(page) = page {
                output["query"] = json!(page.query);
                output["currentHost"] = json!(page.current_host);
                output["currentPrice"] = json!(page.current_price);
            }
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Table => {
            if let Some(page) = page {
                println!("Query:   {}", page.query);
                println!("Current: {} ({})", page.current_price, page.current_host);
                println!();
            }
            println!("Comparison");
            for site in response.sites() {
                println!("  {:<10} {}", site, response.get(site).unwrap_or("-"));
            }
            if let Some(summary) = summary {
                println!();
                println!("Cheapest: {} at {}", summary.best.price, summary.best.site);
                if let (Some(savings), Some(pct)) = (summary.savings, summary.savings_percentage) {
                    println!("Spread:   ${} ({:.2}%)", savings, pct);
                }
            }
        }
    }

    Ok(())
}
