//! [`CatalogStore`] backed by Postgres.

use async_trait::async_trait;
use chrono::NaiveDate;
use shelfwatch_core::{
    distinct_candidates, plan_sighting, CatalogError, CatalogStore, ProductCandidate,
    ReconcileOutcome, ScrapeEvent, Sighting,
};
use sqlx::PgPool;

use crate::products::{find_product_for_update, insert_product, update_sighting};
use crate::scrape_events::insert_scrape_event;
use crate::DbError;

/// Postgres catalog. Each `reconcile` call is one transaction holding a
/// per-brand advisory lock, so two runs for the same brand never interleave.
#[derive(Debug, Clone)]
pub struct PgCatalog {
    pool: PgPool,
}

impl PgCatalog {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn reconcile_in_tx(
        &self,
        brand: &str,
        candidates: &[ProductCandidate],
        today: NaiveDate,
    ) -> Result<ReconcileOutcome, DbError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
            .bind(brand)
            .execute(&mut *tx)
            .await?;

        let mut outcome = ReconcileOutcome::default();
        for candidate in distinct_candidates(candidates) {
            let existing = find_product_for_update(&mut tx, brand, &candidate.key()).await?;
            let sighting = plan_sighting(
                existing.as_ref().map(crate::ProductRow::known).as_ref(),
                brand,
                candidate,
                today,
            );

            match &sighting {
                Sighting::New(product) => {
                    insert_product(&mut tx, product).await?;
                    tracing::debug!(brand = %brand, product = %product.name, "inserted product");
                }
                Sighting::Seen(update) => {
                    if let Some(row) = &existing {
                        update_sighting(&mut tx, row.id, update).await?;
                    }
                }
            }
            outcome.record(&sighting);
        }

        tx.commit().await?;
        Ok(outcome)
    }
}

#[async_trait]
impl CatalogStore for PgCatalog {
    async fn reconcile(
        &self,
        brand: &str,
        candidates: &[ProductCandidate],
        today: NaiveDate,
    ) -> Result<ReconcileOutcome, CatalogError> {
        self.reconcile_in_tx(brand, candidates, today)
            .await
            .map_err(CatalogError::store)
    }

    async fn record_scrape_event(&self, event: &ScrapeEvent) -> Result<(), CatalogError> {
        insert_scrape_event(&self.pool, event)
            .await
            .map(|_| ())
            .map_err(CatalogError::store)
    }
}
