//! Revisio maintenance CLI
//!
//! Applies migrations and inspects stored drafts and versions.
//!
//! Usage:
//!   revisio migrate
//!   revisio drafts --entry <UUID> [--site <UUID>]
//!   revisio versions --entry <UUID> [--limit 10] [--include-current]

mod cli;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use revisio_kernel::config::Config;
use revisio_kernel::db;

/// Entry draft and version maintenance.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create or update the draft and version tables.
    Migrate,

    /// Check the database connection.
    Health,

    /// List the drafts of an entry.
    Drafts {
        /// Entry ID.
        #[arg(long)]
        entry: Uuid,

        /// Site ID (defaults to PRIMARY_SITE_ID).
        #[arg(long)]
        site: Option<Uuid>,
    },

    /// List the versions of an entry, newest first.
    Versions {
        /// Entry ID.
        #[arg(long)]
        entry: Uuid,

        /// Site ID (defaults to PRIMARY_SITE_ID).
        #[arg(long)]
        site: Option<Uuid>,

        /// Maximum number of versions to show.
        #[arg(long)]
        limit: Option<u32>,

        /// Include the newest version, which mirrors the live entry.
        #[arg(long)]
        include_current: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    init_tracing();

    let args = Args::parse();

    let config = Config::from_env().context("failed to load configuration")?;
    let pool = db::create_pool(&config).await?;
    info!("Database connection established");

    match args.command {
        Command::Migrate => cli::cmd_migrate(&pool).await,
        Command::Health => cli::cmd_health(&pool).await,
        Command::Drafts { entry, site } => {
            let site = site.unwrap_or(config.primary_site_id);
            cli::cmd_drafts(&pool, entry, site).await
        }
        Command::Versions {
            entry,
            site,
            limit,
            include_current,
        } => {
            let site = site.unwrap_or(config.primary_site_id);
            cli::cmd_versions(&pool, entry, site, limit, include_current).await
        }
    }
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
