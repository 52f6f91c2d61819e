//! Database operations for the `products` table.

use chrono::{DateTime, NaiveDate, Utc};
use shelfwatch_core::{KnownProduct, NewProduct, SightingUpdate};
use sqlx::{PgConnection, PgPool};

use crate::DbError;

const PRODUCT_COLUMNS: &str = "id, brand, name, name_key, url, image_url, category, \
                               first_seen, last_seen, is_new, created_at, updated_at";

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `products` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductRow {
    pub id: i64,
    pub brand: String,
    /// Display name as first seen.
    pub name: String,
    /// Whitespace-collapsed, lowercased `name`; unique per brand.
    pub name_key: String,
    pub url: Option<String>,
    pub image_url: Option<String>,
    pub category: Option<String>,
    pub first_seen: NaiveDate,
    pub last_seen: NaiveDate,
    pub is_new: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProductRow {
    /// The attributes reconciliation needs from a stored row.
    #[must_use]
    pub fn known(&self) -> KnownProduct {
        KnownProduct {
            url: self.url.clone(),
            image_url: self.image_url.clone(),
            category: self.category.clone(),
            first_seen: self.first_seen,
            last_seen: self.last_seen,
        }
    }
}

/// Product count for one brand, as reported by [`catalog_stats`].
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct BrandProductCount {
    pub brand: String,
    pub products: i64,
}

/// Catalog summary figures.
#[derive(Debug, Clone)]
pub struct CatalogStats {
    pub total_products: i64,
    /// Products first seen on or after the `since` date passed to [`catalog_stats`].
    pub new_products: i64,
    /// Ordered by product count descending, then brand.
    pub brands: Vec<BrandProductCount>,
    pub last_scrape_at: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// Reconciliation writes (run inside the caller's transaction)
// ---------------------------------------------------------------------------

/// Fetches the row for `(brand, name_key)` and locks it until the enclosing
/// transaction ends.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn find_product_for_update(
    conn: &mut PgConnection,
    brand: &str,
    name_key: &str,
) -> Result<Option<ProductRow>, DbError> {
    let row = sqlx::query_as::<_, ProductRow>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products \
         WHERE brand = $1 AND name_key = $2 \
         FOR UPDATE"
    ))
    .bind(brand)
    .bind(name_key)
    .fetch_optional(conn)
    .await?;

    Ok(row)
}

/// Inserts a newly discovered product with `is_new = TRUE`.
///
/// Returns the internal `id` of the new row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails, including a unique
/// violation on `(brand, name_key)`.
pub async fn insert_product(conn: &mut PgConnection, product: &NewProduct) -> Result<i64, DbError> {
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO products \
             (brand, name, name_key, url, image_url, category, first_seen, last_seen, is_new) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, TRUE) \
         RETURNING id",
    )
    .bind(&product.brand)
    .bind(&product.name)
    .bind(&product.name_key)
    .bind(&product.url)
    .bind(&product.image_url)
    .bind(&product.category)
    .bind(product.first_seen)
    .bind(product.last_seen)
    .fetch_one(conn)
    .await?;

    Ok(id)
}

/// Applies a repeat sighting to an existing row. `first_seen` and `is_new`
/// are left untouched.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn update_sighting(
    conn: &mut PgConnection,
    id: i64,
    update: &SightingUpdate,
) -> Result<(), DbError> {
    sqlx::query(
        "UPDATE products \
         SET url = $1, image_url = $2, category = $3, last_seen = $4, updated_at = NOW() \
         WHERE id = $5",
    )
    .bind(&update.url)
    .bind(&update.image_url)
    .bind(&update.category)
    .bind(update.last_seen)
    .bind(id)
    .execute(conn)
    .await?;

    Ok(())
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

/// Lists products first seen on or after `since`, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_new_products(pool: &PgPool, since: NaiveDate) -> Result<Vec<ProductRow>, DbError> {
    let rows = sqlx::query_as::<_, ProductRow>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products \
         WHERE first_seen >= $1 \
         ORDER BY first_seen DESC, brand, name"
    ))
    .bind(since)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Lists every product, grouped by brand.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_all_products(pool: &PgPool) -> Result<Vec<ProductRow>, DbError> {
    let rows = sqlx::query_as::<_, ProductRow>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY brand, name"
    ))
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Lists the products of one brand, most recently seen first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_products_by_brand(
    pool: &PgPool,
    brand: &str,
) -> Result<Vec<ProductRow>, DbError> {
    let rows = sqlx::query_as::<_, ProductRow>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products \
         WHERE brand = $1 \
         ORDER BY last_seen DESC, name"
    ))
    .bind(brand)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Summarises the catalog: totals, products first seen since `since`,
/// per-brand counts and the time of the latest scrape event.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any query fails.
pub async fn catalog_stats(pool: &PgPool, since: NaiveDate) -> Result<CatalogStats, DbError> {
    let (total_products, new_products) = sqlx::query_as::<_, (i64, i64)>(
        "SELECT COUNT(*), COUNT(*) FILTER (WHERE first_seen >= $1) FROM products",
    )
    .bind(since)
    .fetch_one(pool)
    .await?;

    let brands = sqlx::query_as::<_, BrandProductCount>(
        "SELECT brand, COUNT(*) AS products FROM products \
         GROUP BY brand \
         ORDER BY products DESC, brand",
    )
    .fetch_all(pool)
    .await?;

    let last_scrape_at = sqlx::query_scalar::<_, Option<DateTime<Utc>>>(
        "SELECT MAX(scraped_at) FROM scrape_events",
    )
    .fetch_one(pool)
    .await?;

    Ok(CatalogStats {
        total_products,
        new_products,
        brands,
        last_scrape_at,
    })
}

// ---------------------------------------------------------------------------
// Maintenance
// ---------------------------------------------------------------------------

/// Rewrites every `first_seen` to `baseline`, or to the row's `last_seen`
/// when that is earlier, so existing products drop out of the "new" window.
///
/// Returns the number of rows updated.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn reset_baseline(pool: &PgPool, baseline: NaiveDate) -> Result<u64, DbError> {
    let result = sqlx::query(
        "UPDATE products \
         SET first_seen = LEAST($1::date, last_seen), updated_at = NOW()",
    )
    .bind(baseline)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

/// Clears `is_new` on every flagged product.
///
/// Returns the number of rows updated.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn mark_products_seen(pool: &PgPool) -> Result<u64, DbError> {
    let result = sqlx::query(
        "UPDATE products SET is_new = FALSE, updated_at = NOW() WHERE is_new",
    )
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}
