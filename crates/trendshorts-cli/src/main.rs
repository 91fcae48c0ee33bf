mod cleanup;
mod collect;
mod report;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "trendshorts-cli")]
#[command(about = "Collect and report on trending short-form videos")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Database utilities
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
    /// Run one collection: render, extract, enrich, rank and persist
    Collect {
        /// Maximum candidates to keep from the page (defaults to TRENDSHORTS_COLLECT_MAX_CANDIDATES)
        #[arg(long)]
        limit: Option<usize>,
        /// Skip metadata enrichment
        #[arg(long)]
        no_enhance: bool,
        /// Enrich sequentially instead of through the worker pool
        #[arg(long)]
        no_parallel: bool,
        /// Worker pool size (defaults to TRENDSHORTS_ENRICH_WORKERS)
        #[arg(long)]
        workers: Option<usize>,
        /// Bucket date to file records under (YYYY-MM-DD, defaults to today UTC)
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Run the pipeline against an in-memory store without touching the database
        #[arg(long)]
        dry_run: bool,
    },
    /// Print the ranked list for a date with rank-change markers
    Report {
        /// Date to report (YYYY-MM-DD, defaults to the latest collected date)
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Maximum rows to print
        #[arg(long, default_value = "20")]
        limit: i64,
        /// Keep music-category records in the list
        #[arg(long)]
        include_music: bool,
        /// Days to look back for a previous rank
        #[arg(long, default_value = "7")]
        lookback_days: i32,
    },
    /// List recent collection runs
    Runs {
        /// Maximum runs to show
        #[arg(long, default_value = "10")]
        limit: i64,
    },
    /// Delete records older than the retention window
    Cleanup {
        /// Retention window in days (defaults to TRENDSHORTS_RETENTION_DAYS)
        #[arg(long)]
        days: Option<u32>,
        /// Count what would be deleted without deleting
        #[arg(long)]
        dry_run: bool,
        /// Keep daily stats rows
        #[arg(long)]
        keep_stats: bool,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Check database connectivity
    Ping,
    /// Apply pending migrations
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let config = trendshorts_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let Some(command) = cli.command else {
        println!("no command given; run with --help for usage");
        return Ok(());
    };

    match command {
        Commands::Db { command } => {
            let pool = connect(&config).await?;
            match command {
                DbCommands::Ping => {
                    trendshorts_db::health_check(&pool).await?;
                    println!("database ok");
                }
                DbCommands::Migrate => {
                    let applied = trendshorts_db::run_migrations(&pool).await?;
                    println!("migrations applied: {applied}");
                }
            }
        }
        Commands::Collect {
            limit,
            no_enhance,
            no_parallel,
            workers,
            date,
            dry_run,
        } => {
            let args = collect::CollectArgs {
                limit,
                enhance: !no_enhance,
                parallel: !no_parallel,
                workers,
                date,
            };
            if dry_run {
                collect::run_collect_dry(&config, args).await?;
            } else {
                let pool = connect(&config).await?;
                trendshorts_db::run_migrations(&pool).await?;
                collect::run_collect(&pool, &config, args).await?;
            }
        }
        Commands::Report {
            date,
            limit,
            include_music,
            lookback_days,
        } => {
            let pool = connect(&config).await?;
            report::run_report(&pool, date, limit, include_music, lookback_days).await?;
        }
        Commands::Runs { limit } => {
            let pool = connect(&config).await?;
            report::run_runs(&pool, limit).await?;
        }
        Commands::Cleanup {
            days,
            dry_run,
            keep_stats,
        } => {
            let pool = connect(&config).await?;
            let days = days.unwrap_or(config.retention_days);
            cleanup::run_cleanup(&pool, days, dry_run, keep_stats).await?;
        }
    }

    Ok(())
}

async fn connect(config: &trendshorts_core::AppConfig) -> anyhow::Result<sqlx::PgPool> {
    let pool = trendshorts_db::connect_pool_from_config(config).await?;
    Ok(pool)
}
