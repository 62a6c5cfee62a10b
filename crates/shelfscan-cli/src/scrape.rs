//! `shelfscan scrape`: extract, clean, then write every selected output.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, ValueEnum};
use shelfscan_core::AppConfig;
use shelfscan_scraper::{
    default_launcher, process, BackendKind, BackendSettings, Backends, BrowserOptions,
    HttpSettings, Orchestrator, RunReport, Selection, StorefrontClient,
};

use crate::export;

pub(crate) const DEFAULT_URL: &str = "https://justyol.com/en/collections/women-handbags";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Csv,
    Json,
    Db,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum Method {
    Auto,
    Api,
    Graphql,
    Network,
    Dom,
}

impl From<Method> for Selection {
    fn from(method: Method) -> Self {
        match method {
            Method::Auto => Selection::Auto,
            Method::Api => Selection::Forced(BackendKind::Api),
            Method::Graphql => Selection::Forced(BackendKind::Graphql),
            Method::Network => Selection::Forced(BackendKind::NetworkSniff),
            Method::Dom => Selection::Forced(BackendKind::Dom),
        }
    }
}

#[derive(Debug, Args)]
pub(crate) struct ScrapeArgs {
    /// Collection listing URL
    #[arg(long, default_value = DEFAULT_URL)]
    pub url: String,

    /// Maximum listing pages for the browser backends
    #[arg(long, default_value_t = 2, value_parser = clap::value_parser!(u32).range(1..))]
    pub pages: u32,

    /// Comma-separated outputs
    #[arg(long, value_enum, value_delimiter = ',', default_value = "csv,json")]
    pub output: Vec<OutputFormat>,

    /// SQLite database file (defaults to SHELFSCAN_DATABASE_URL)
    #[arg(long)]
    pub db: Option<String>,

    /// Backend to use; `auto` tries each in priority order
    #[arg(long, value_enum, default_value_t = Method::Auto)]
    pub method: Method,

    /// Directory for products.csv and products.json
    #[arg(long, default_value = ".")]
    pub out_dir: PathBuf,
}

/// `--db` accepts either a bare file path or a full `sqlite:` URL.
pub(crate) fn database_url(db: Option<&str>, config: &AppConfig) -> String {
    match db {
        Some(url) if url.starts_with("sqlite:") => url.to_owned(),
        Some(path) => format!("sqlite://{path}"),
        None => config.database_url.clone(),
    }
}

fn print_trail(report: &RunReport) {
    for attempt in &report.trail {
        println!(
            "  {:<8} {:>5} records  {}",
            attempt.backend, attempt.records, attempt.verdict
        );
    }
}

pub(crate) async fn run_scrape(config: &AppConfig, args: ScrapeArgs) -> anyhow::Result<()> {
    let client = StorefrontClient::new(HttpSettings::from(config))
        .map_err(|e| anyhow::anyhow!("failed to build storefront client: {e}"))?;
    let launcher = default_launcher(BrowserOptions::from(config));
    let backends = Backends::new(client, launcher, BackendSettings::from(config));
    let orchestrator = Orchestrator::new(config.scraper_accept_threshold);
    let selection = Selection::from(args.method);

    println!("scraping {} ({selection}, up to {} pages)", args.url, args.pages);
    let report = orchestrator
        .run(&backends, &args.url, args.pages, selection)
        .await
        .with_context(|| format!("{selection} backend failed for {}", args.url))?;
    print_trail(&report);

    let products = process(report.records, &args.url);
    if products.is_empty() {
        tracing::warn!(url = %args.url, "no products extracted");
        println!("no products found");
        return Ok(());
    }
    println!("extracted {} products", products.len());

    for format in &args.output {
        match format {
            OutputFormat::Csv => {
                let path = export::write_csv(&args.out_dir, &products)?;
                println!("wrote {}", path.display());
            }
            OutputFormat::Json => {
                let path = export::write_json(&args.out_dir, &products)?;
                println!("wrote {}", path.display());
            }
            OutputFormat::Db => {
                let url = database_url(args.db.as_deref(), config);
                let pool = shelfscan_db::connect_pool(&url, shelfscan_db::PoolConfig::default())
                    .await
                    .with_context(|| format!("could not open {url}"))?;
                shelfscan_db::run_migrations(&pool).await?;
                let inserted = shelfscan_db::insert_products(&pool, &products).await?;
                println!("inserted {inserted} rows into {url}");
            }
        }
    }

    Ok(())
}
