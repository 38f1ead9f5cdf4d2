//! Bulk seeding of place records from the listing store.

use sqlx::PgPool;

use crate::DbError;

/// One restaurant to track, as exported from the listing store.
#[derive(Debug, Clone)]
pub struct SeedEntry {
    pub restaurant_id: i64,
    pub name: String,
    pub search_address: String,
    /// IANA zone derived from the restaurant's region.
    pub timezone: Option<String>,
}

/// Upserts place records for the given restaurants.
///
/// Returns the number of entries processed. All upserts run inside a single
/// transaction; if any operation fails the entire batch is rolled back.
/// Existing records keep their cached fields and scheduling state; only the
/// search keys and timezone are refreshed.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any database operation fails.
pub async fn seed_place_records(pool: &PgPool, entries: &[SeedEntry]) -> Result<usize, DbError> {
    let mut tx = pool.begin().await?;
    let mut count = 0usize;

    for entry in entries {
        sqlx::query(
            "INSERT INTO place_records (restaurant_id, name, search_address, timezone) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (restaurant_id) DO UPDATE SET \
                 name = EXCLUDED.name, \
                 search_address = EXCLUDED.search_address, \
                 timezone = COALESCE(EXCLUDED.timezone, place_records.timezone), \
                 updated_at = NOW()",
        )
        .bind(entry.restaurant_id)
        .bind(&entry.name)
        .bind(&entry.search_address)
        .bind(&entry.timezone)
        .execute(&mut *tx)
        .await?;

        count += 1;
    }

    tx.commit().await?;
    Ok(count)
}
