mod export;
mod scrape;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::scrape::ScrapeArgs;

#[derive(Debug, Parser)]
#[command(name = "shelfscan")]
#[command(about = "Storefront product listing extraction")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Extract a listing and write it to the selected outputs
    Scrape(ScrapeArgs),
    /// Database maintenance
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Apply pending migrations
    Migrate,
    /// Check the database is reachable
    Ping,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = shelfscan_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();
    match cli.command {
        Some(Commands::Scrape(args)) => scrape::run_scrape(&config, args).await?,
        Some(Commands::Db { command }) => {
            let pool = shelfscan_db::connect_pool(
                &config.database_url,
                shelfscan_db::PoolConfig::default(),
            )
            .await?;
            match command {
                DbCommands::Migrate => {
                    let applied = shelfscan_db::run_migrations(&pool).await?;
                    println!("applied {applied} migration(s)");
                }
                DbCommands::Ping => {
                    shelfscan_db::health_check(&pool).await?;
                    println!("database ok");
                }
            }
        }
        None => println!("shelfscan: run `shelfscan scrape --help` to get started"),
    }

    Ok(())
}

#[cfg(test)]
mod tests;
