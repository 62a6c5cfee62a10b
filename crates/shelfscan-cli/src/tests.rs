use clap::Parser;

use super::*;
use crate::scrape::{database_url, Method, OutputFormat, DEFAULT_URL};

fn scrape_args(argv: &[&str]) -> ScrapeArgs {
    let mut full = vec!["shelfscan", "scrape"];
    full.extend_from_slice(argv);
    match Cli::try_parse_from(full).expect("expected valid cli args").command {
        Some(Commands::Scrape(args)) => args,
        other => panic!("expected scrape command, got {other:?}"),
    }
}

#[test]
fn no_command_is_none() {
    let cli = Cli::try_parse_from(["shelfscan"]).expect("expected valid cli args");
    assert!(cli.command.is_none());
}

#[test]
fn scrape_defaults() {
    let args = scrape_args(&[]);
    assert_eq!(args.url, DEFAULT_URL);
    assert_eq!(args.pages, 2);
    assert_eq!(args.output, vec![OutputFormat::Csv, OutputFormat::Json]);
    assert_eq!(args.method, Method::Auto);
    assert!(args.db.is_none());
    assert_eq!(args.out_dir, std::path::PathBuf::from("."));
}

#[test]
fn scrape_output_list_is_comma_separated() {
    let args = scrape_args(&["--output", "json,db"]);
    assert_eq!(args.output, vec![OutputFormat::Json, OutputFormat::Db]);
}

#[test]
fn scrape_method_maps_to_selection() {
    let args = scrape_args(&["--method", "network", "--pages", "5"]);
    assert_eq!(args.pages, 5);
    assert_eq!(
        shelfscan_scraper::Selection::from(args.method),
        shelfscan_scraper::Selection::Forced(shelfscan_scraper::BackendKind::NetworkSniff)
    );
}

#[test]
fn scrape_rejects_zero_pages() {
    assert!(Cli::try_parse_from(["shelfscan", "scrape", "--pages", "0"]).is_err());
}

#[test]
fn scrape_rejects_unknown_method() {
    assert!(Cli::try_parse_from(["shelfscan", "scrape", "--method", "selenium"]).is_err());
}

#[test]
fn parses_db_migrate_command() {
    let cli =
        Cli::try_parse_from(["shelfscan", "db", "migrate"]).expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Some(Commands::Db {
            command: DbCommands::Migrate
        })
    ));
}

#[test]
fn database_url_accepts_paths_and_urls() {
    let config = shelfscan_core::load_app_config_from_env().expect("defaults are valid");
    assert_eq!(
        database_url(Some("products.db"), &config),
        "sqlite://products.db"
    );
    assert_eq!(
        database_url(Some("sqlite::memory:"), &config),
        "sqlite::memory:"
    );
    assert_eq!(database_url(None, &config), config.database_url);
}
