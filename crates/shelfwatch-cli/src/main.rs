mod report;
mod scrape;

use clap::{Parser, Subcommand, ValueEnum};
use shelfwatch_core::{AppConfig, ExtractionMethod};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "shelfwatch")]
#[command(about = "Track the product catalogs of competitor brand websites")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Scrape brand sites and reconcile the product catalog
    Scrape {
        /// Scrape only this brand (case-insensitive)
        #[arg(long)]
        brand: Option<String>,
        /// Use this extraction method for every brand
        #[arg(long, value_enum)]
        method: Option<MethodArg>,
        /// Reuse the most recent stored screenshot instead of capturing a new one
        #[arg(long)]
        skip_screenshot: bool,
        /// Extract against an in-memory catalog; nothing is written and
        /// `DATABASE_URL` is not needed
        #[arg(long)]
        dry_run: bool,
    },
    /// List products first seen within the last N days
    New {
        /// Window in days (defaults to `SHELFWATCH_NEW_WINDOW_DAYS`)
        #[arg(long)]
        days: Option<u32>,
    },
    /// List catalog products
    Products {
        /// Only products of this brand
        #[arg(long)]
        brand: Option<String>,
    },
    /// Show recent scrape events
    History {
        /// Maximum number of events to show
        #[arg(long, default_value = "50")]
        limit: u32,
        /// Only events for this brand
        #[arg(long)]
        brand: Option<String>,
    },
    /// Show catalog totals and per-brand counts
    Stats,
    /// Backdate every product's first-seen date so nothing counts as new
    Baseline {
        /// Days to backdate by (defaults to `SHELFWATCH_BASELINE_OFFSET_DAYS`)
        #[arg(long)]
        days: Option<u32>,
    },
    /// Clear the new flag on every product
    MarkSeen,
    /// List configured brands
    Brands,
    /// Database management
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Apply pending migrations
    Migrate,
    /// Check database connectivity
    Ping,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum MethodArg {
    Markup,
    Vision,
}

impl From<MethodArg> for ExtractionMethod {
    fn from(arg: MethodArg) -> Self {
        match arg {
            MethodArg::Markup => ExtractionMethod::Markup,
            MethodArg::Vision => ExtractionMethod::Vision,
        }
    }
}

impl Commands {
    /// `brands` and `scrape --dry-run` run without `DATABASE_URL`.
    fn needs_database(&self) -> bool {
        !matches!(
            self,
            Commands::Brands | Commands::Scrape { dry_run: true, .. }
        )
    }
}

/// `RUST_LOG` wins over the configured level when set.
fn init_tracing(log_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

pub(crate) async fn connect(config: &AppConfig) -> anyhow::Result<sqlx::PgPool> {
    let pool = shelfwatch_db::connect_pool(
        &config.database_url,
        shelfwatch_db::PoolConfig::from_app_config(config),
    )
    .await
    .map_err(|e| anyhow::anyhow!("failed to connect to database: {e}"))?;
    Ok(pool)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("no command given; run `shelfwatch --help`");
        return Ok(());
    };

    let config = if command.needs_database() {
        shelfwatch_core::load_app_config_from_env()?
    } else {
        shelfwatch_core::load_offline_app_config_from_env()?
    };
    init_tracing(&config.log_level);
    tracing::debug!(env = %config.env, brands_path = %config.brands_path.display(), "configuration loaded");
    let today = chrono::Local::now().date_naive();

    match command {
        Commands::Scrape {
            brand,
            method,
            skip_screenshot,
            dry_run,
        } => {
            let options = scrape::ScrapeOptions {
                brand: brand.as_deref(),
                method: method.map(ExtractionMethod::from),
                skip_screenshot,
                dry_run,
            };
            scrape::run_scrape(&config, &options, today).await?;
        }
        Commands::New { days } => {
            let pool = connect(&config).await?;
            let since = report::days_before(today, days.unwrap_or(config.new_window_days))?;
            report::run_new(&pool, since).await?;
        }
        Commands::Products { brand } => {
            let pool = connect(&config).await?;
            let brands = scrape::load_brand_list(&config)?;
            report::run_products(&pool, &brands, brand.as_deref()).await?;
        }
        Commands::History { limit, brand } => {
            let pool = connect(&config).await?;
            let brands = scrape::load_brand_list(&config)?;
            report::run_history(&pool, &brands, i64::from(limit), brand.as_deref()).await?;
        }
        Commands::Stats => {
            let pool = connect(&config).await?;
            let since = report::days_before(today, config.new_window_days)?;
            report::run_stats(&pool, since).await?;
        }
        Commands::Baseline { days } => {
            let pool = connect(&config).await?;
            let baseline =
                report::days_before(today, days.unwrap_or(config.baseline_offset_days))?;
            report::run_baseline(&pool, baseline).await?;
        }
        Commands::MarkSeen => {
            let pool = connect(&config).await?;
            report::run_mark_seen(&pool).await?;
        }
        Commands::Brands => {
            let brands = scrape::load_brand_list(&config)?;
            report::run_brands(&brands);
        }
        Commands::Db { command } => {
            let pool = connect(&config).await?;
            match command {
                DbCommands::Migrate => {
                    let applied = shelfwatch_db::run_migrations(&pool).await?;
                    println!("applied {applied} migration(s)");
                }
                DbCommands::Ping => {
                    shelfwatch_db::ping(&pool).await?;
                    println!("database ok");
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests;
