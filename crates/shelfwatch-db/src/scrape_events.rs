//! Database operations for the append-only `scrape_events` ledger.

use chrono::{DateTime, Utc};
use shelfwatch_core::{ExtractionMethod, ScrapeEvent, ScrapeStatus};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

/// A row from the `scrape_events` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ScrapeEventRow {
    pub id: i64,
    pub run_id: Option<Uuid>,
    pub brand: String,
    pub scraped_at: DateTime<Utc>,
    pub products_found: i32,
    pub new_products: i32,
    /// One of `success`, `partial`, `skipped`, `error` (enforced by a CHECK).
    pub status: String,
    pub error: Option<String>,
    pub method: String,
}

impl ScrapeEventRow {
    /// Parse the stored status text.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::InvalidStatus`] for a value outside the known set.
    pub fn status(&self) -> Result<ScrapeStatus, DbError> {
        self.status
            .parse()
            .map_err(|_| DbError::InvalidStatus(self.status.clone()))
    }

    /// Stored extraction method; unknown values read as the default.
    #[must_use]
    pub fn method(&self) -> ExtractionMethod {
        self.method.parse().unwrap_or_default()
    }
}

/// Appends one event to the ledger. Rows are never updated afterwards.
///
/// Returns the internal `id` of the new row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn insert_scrape_event(pool: &PgPool, event: &ScrapeEvent) -> Result<i64, DbError> {
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO scrape_events \
             (run_id, brand, scraped_at, products_found, new_products, status, error, method) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
         RETURNING id",
    )
    .bind(event.run_id)
    .bind(&event.brand)
    .bind(event.timestamp)
    .bind(event.products_found)
    .bind(event.new_products)
    .bind(event.status.as_str())
    .bind(&event.error)
    .bind(event.method.as_str())
    .fetch_one(pool)
    .await?;

    Ok(id)
}

/// Lists the most recent events, newest first, optionally for one brand.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_scrape_history(
    pool: &PgPool,
    limit: i64,
    brand: Option<&str>,
) -> Result<Vec<ScrapeEventRow>, DbError> {
    let rows = sqlx::query_as::<_, ScrapeEventRow>(
        "SELECT id, run_id, brand, scraped_at, products_found, new_products, \
                status, error, method \
         FROM scrape_events \
         WHERE ($2::text IS NULL OR brand = $2) \
         ORDER BY scraped_at DESC, id DESC \
         LIMIT $1",
    )
    .bind(limit)
    .bind(brand)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Lists the events written by one full run, in write order.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_run_events(pool: &PgPool, run_id: Uuid) -> Result<Vec<ScrapeEventRow>, DbError> {
    let rows = sqlx::query_as::<_, ScrapeEventRow>(
        "SELECT id, run_id, brand, scraped_at, products_found, new_products, \
                status, error, method \
         FROM scrape_events \
         WHERE run_id = $1 \
         ORDER BY id",
    )
    .bind(run_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
