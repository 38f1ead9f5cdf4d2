//! Command handlers for the CLI.
//!
//! These are called from `main` after the config and database pool are
//! established. Per-record failures are classified and written back by the
//! scheduler; only configuration and database problems surface here.

use std::path::Path;

use chrono::Utc;
use serde::Deserialize;
use sqlx::PgPool;

use dinesync_core::AppConfig;
use dinesync_db::SeedEntry;
use dinesync_places::PlacesClient;
use dinesync_sync::{BatchConfig, PgPlaceStore};

/// Refresh one batch of due records, recording the run in `refresh_runs`.
pub(crate) async fn run_batch(
    pool: &PgPool,
    config: &AppConfig,
    batch_size: Option<i64>,
    days_threshold: Option<i64>,
    dry_run: bool,
) -> anyhow::Result<()> {
    let api_key = config
        .places_api_key
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("DINESYNC_PLACES_API_KEY is not set"))?;
    let client = PlacesClient::with_base_url(
        api_key,
        config.places_timeout_secs,
        &config.places_base_url,
    )
    .map_err(|e| anyhow::anyhow!("failed to build places client: {e}"))?;

    let mut batch = BatchConfig::from_app_config(config);
    if let Some(size) = batch_size {
        batch.batch_size = size;
    }
    batch.days_threshold = days_threshold;
    batch.dry_run = dry_run;

    let store = PgPlaceStore::new(pool.clone());
    let run = dinesync_db::create_refresh_run(pool, "cli", dry_run).await?;
    dinesync_db::start_refresh_run(pool, run.id).await?;

    let report = match dinesync_sync::run_batch(&store, &client, &batch, Utc::now()).await {
        Ok(report) => report,
        Err(e) => {
            dinesync_db::fail_refresh_run(pool, run.id, &e.to_string()).await?;
            return Err(e.into());
        }
    };
    dinesync_db::complete_refresh_run(pool, run.id, &report.run_counts()).await?;

    if dry_run {
        println!("dry-run: {} records due for refresh", report.selected);
        return Ok(());
    }

    println!(
        "refreshed {}/{} records: {} not found, {} parse failures, {} rate limited, \
         {} transport failures, {} skipped, {} upstream calls",
        report.updated,
        report.selected,
        report.not_found,
        report.parse_failed,
        report.rate_limited,
        report.transport_failed,
        report.skipped,
        report.upstream_calls,
    );
    if report.quota_exceeded {
        println!("daily quota exhausted before the batch completed");
    }
    Ok(())
}

/// Print the cached record and its open/closed status right now.
pub(crate) async fn show_status(pool: &PgPool, restaurant_id: i64) -> anyhow::Result<()> {
    let store = PgPlaceStore::new(pool.clone());
    let Some(record) = dinesync_sync::cached_place(&store, restaurant_id).await? else {
        anyhow::bail!("no cached record for restaurant {restaurant_id}");
    };
    let status = dinesync_sync::place_status(&store, restaurant_id, Utc::now()).await?;

    println!("{} (restaurant {})", record.name, record.restaurant_id);
    if let Some(address) = &record.address {
        println!("  address: {address}");
    }
    if let Some(phone) = &record.phone {
        println!("  phone:   {phone}");
    }
    if let Some(website) = &record.website {
        println!("  website: {website}");
    }
    if let Some(rating) = record.rating {
        println!("  rating:  {rating}");
    }
    println!("  active:  {}", record.is_active);
    if let Some(updated) = record.last_updated {
        println!("  last refreshed: {updated}");
    }
    println!("  status:  {}", status.reason);
    if let Some(change) = status.next_change {
        println!("  changes at: {}", change.with_timezone(&record.tz()));
    }
    Ok(())
}

/// One entry in the seed file.
#[derive(Debug, Deserialize)]
struct SeedFileEntry {
    restaurant_id: i64,
    name: String,
    search_address: String,
    #[serde(default)]
    timezone: Option<String>,
}

/// Load restaurants to track from a JSON array file.
pub(crate) async fn seed(pool: &PgPool, file: &Path) -> anyhow::Result<()> {
    let raw = std::fs::read_to_string(file)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", file.display()))?;
    let parsed: Vec<SeedFileEntry> = serde_json::from_str(&raw)
        .map_err(|e| anyhow::anyhow!("failed to parse {}: {e}", file.display()))?;

    let entries: Vec<SeedEntry> = parsed
        .into_iter()
        .map(|e| SeedEntry {
            restaurant_id: e.restaurant_id,
            name: e.name,
            search_address: e.search_address,
            timezone: e.timezone,
        })
        .collect();

    let count = dinesync_db::seed_place_records(pool, &entries).await?;
    println!("seeded {count} place records");
    Ok(())
}

/// Clear a record's `next_update` so the next batch picks it up immediately.
pub(crate) async fn force_refresh(pool: &PgPool, restaurant_id: i64) -> anyhow::Result<()> {
    dinesync_db::force_refresh(pool, restaurant_id)
        .await
        .map_err(|e| match e {
            dinesync_db::DbError::NotFound => {
                anyhow::anyhow!("no active record for restaurant {restaurant_id}")
            }
            other => other.into(),
        })?;
    println!("restaurant {restaurant_id} is now due for refresh");
    Ok(())
}

/// Print recent refresh runs, newest first.
pub(crate) async fn list_runs(pool: &PgPool, limit: i64) -> anyhow::Result<()> {
    let runs = dinesync_db::list_refresh_runs(pool, limit).await?;
    if runs.is_empty() {
        println!("no refresh runs recorded");
        return Ok(());
    }
    for run in runs {
        let when = run.started_at.map_or_else(
            || run.created_at.to_rfc3339(),
            |t| t.to_rfc3339(),
        );
        println!(
            "{} {} {}{}: {}/{} updated, {} calls{}",
            when,
            run.public_id,
            run.status,
            if run.dry_run { " (dry-run)" } else { "" },
            run.updated,
            run.selected,
            run.upstream_calls,
            if run.quota_exceeded {
                ", quota exhausted"
            } else {
                ""
            },
        );
        if let Some(message) = &run.error_message {
            println!("    error: {message}");
        }
    }
    Ok(())
}

/// Apply pending migrations.
pub(crate) async fn migrate(pool: &PgPool) -> anyhow::Result<()> {
    dinesync_db::run_migrations(pool).await?;
    println!("migrations applied");
    Ok(())
}
