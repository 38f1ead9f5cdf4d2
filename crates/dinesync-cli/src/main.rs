use clap::{Parser, Subcommand};

mod commands;

#[derive(Debug, Parser)]
#[command(name = "dinesync")]
#[command(about = "Place-data cache and refresh engine for the restaurant directory")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Refresh one batch of due place records.
    RunBatch {
        /// Maximum records to refresh this run.
        #[arg(long)]
        batch_size: Option<i64>,
        /// Select records last refreshed more than this many days ago,
        /// ignoring their scheduled next refresh.
        #[arg(long)]
        days_threshold: Option<i64>,
        /// List what would be refreshed without calling the provider or
        /// writing anything.
        #[arg(long)]
        dry_run: bool,
    },
    /// Show the cached record and current open/closed status.
    Status { restaurant_id: i64 },
    /// Load restaurants to track from a JSON file.
    Seed { file: std::path::PathBuf },
    /// Make a record immediately due, bypassing its backoff.
    ForceRefresh { restaurant_id: i64 },
    /// Show recent refresh runs.
    Runs {
        #[arg(long, default_value_t = 10)]
        limit: i64,
    },
    /// Run pending database migrations.
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = dinesync_core::load_app_config()?;
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .init();

    let cli = Cli::parse();

    let pool = dinesync_db::connect_pool(
        &config.database_url,
        dinesync_db::PoolConfig {
            max_connections: config.db_max_connections,
            min_connections: config.db_min_connections,
            acquire_timeout_secs: config.db_acquire_timeout_secs,
        },
    )
    .await?;

    match cli.command {
        Commands::RunBatch {
            batch_size,
            days_threshold,
            dry_run,
        } => commands::run_batch(&pool, &config, batch_size, days_threshold, dry_run).await,
        Commands::Status { restaurant_id } => commands::show_status(&pool, restaurant_id).await,
        Commands::Seed { file } => commands::seed(&pool, &file).await,
        Commands::ForceRefresh { restaurant_id } => {
            commands::force_refresh(&pool, restaurant_id).await
        }
        Commands::Runs { limit } => commands::list_runs(&pool, limit).await,
        Commands::Migrate => commands::migrate(&pool).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn run_batch_parses_overrides() {
        let cli = Cli::parse_from([
            "dinesync",
            "run-batch",
            "--batch-size",
            "5",
            "--days-threshold",
            "60",
            "--dry-run",
        ]);
        match cli.command {
            Commands::RunBatch {
                batch_size,
                days_threshold,
                dry_run,
            } => {
                assert_eq!(batch_size, Some(5));
                assert_eq!(days_threshold, Some(60));
                assert!(dry_run);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn status_takes_a_restaurant_id() {
        let cli = Cli::parse_from(["dinesync", "status", "42"]);
        assert!(matches!(
            cli.command,
            Commands::Status { restaurant_id: 42 }
        ));
    }
}
