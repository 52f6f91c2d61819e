//! Scrape orchestration: drive brands through an extraction strategy and the
//! catalog, one brand and one URL at a time, and record one scrape event per
//! brand.

use std::time::Duration;

use chrono::{NaiveDate, Utc};
use shelfwatch_core::{
    distinct_candidates, BrandConfig, BrandsFile, CatalogError, CatalogStore, CoreError,
    ExtractionMethod, ProductCandidate, ScrapeEvent, ScrapeStatus,
};
use thiserror::Error;
use uuid::Uuid;

use crate::extract::ExtractionStrategy;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("failed to record scrape event for {brand}: {source}")]
    Ledger {
        brand: String,
        #[source]
        source: CatalogError,
    },
}

/// The strategies available to a run and how one is chosen per brand.
pub struct Strategies<'a> {
    pub markup: &'a dyn ExtractionStrategy,
    pub vision: &'a dyn ExtractionStrategy,
    /// When set, every brand uses this method regardless of its configuration.
    pub method_override: Option<ExtractionMethod>,
}

impl Strategies<'_> {
    #[must_use]
    pub fn for_brand(&self, brand: &BrandConfig) -> &dyn ExtractionStrategy {
        match self.method_override.unwrap_or(brand.method) {
            ExtractionMethod::Markup => self.markup,
            ExtractionMethod::Vision => self.vision,
        }
    }
}

/// Result of one brand's scrape.
#[derive(Debug, Clone)]
pub struct BrandOutcome {
    pub event: ScrapeEvent,
    /// Names of the catalog entries this scrape created.
    pub new_names: Vec<String>,
}

/// Result of [`Orchestrator::run_all`].
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub run_id: Uuid,
    /// Per-brand outcomes, most products found first.
    pub brands: Vec<BrandOutcome>,
    pub total_found: i64,
    pub total_new: i64,
}

impl RunSummary {
    fn new(run_id: Uuid, mut brands: Vec<BrandOutcome>) -> Self {
        brands.sort_by(|a, b| b.event.products_found.cmp(&a.event.products_found));
        let total_found = brands
            .iter()
            .map(|b| i64::from(b.event.products_found))
            .sum();
        let total_new = brands.iter().map(|b| i64::from(b.event.new_products)).sum();
        Self {
            run_id,
            brands,
            total_found,
            total_new,
        }
    }
}

pub struct Orchestrator<'a> {
    catalog: &'a dyn CatalogStore,
    url_pause: Duration,
    brand_pause: Duration,
}

impl<'a> Orchestrator<'a> {
    /// `url_pause` follows every URL visited; `brand_pause` separates brands
    /// in a full run.
    #[must_use]
    pub fn new(catalog: &'a dyn CatalogStore, url_pause: Duration, brand_pause: Duration) -> Self {
        Self {
            catalog,
            url_pause,
            brand_pause,
        }
    }

    /// Scrape one brand and record its event.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Ledger`] if the event could not be written.
    /// Scrape failures themselves are reported through the event's status.
    pub async fn run_brand(
        &self,
        brand: &BrandConfig,
        strategy: &dyn ExtractionStrategy,
        today: NaiveDate,
        run_id: Option<Uuid>,
    ) -> Result<BrandOutcome, PipelineError> {
        let outcome = self.scrape_brand(brand, strategy, today, run_id).await;
        self.record(&outcome.event).await?;
        Ok(outcome)
    }

    /// Scrape the brand called `name` (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Core`] for an unknown brand, or
    /// [`PipelineError::Ledger`] if the event could not be written.
    pub async fn run_named(
        &self,
        brands: &BrandsFile,
        name: &str,
        strategies: &Strategies<'_>,
        today: NaiveDate,
    ) -> Result<BrandOutcome, PipelineError> {
        let brand = brands.require(name)?;
        self.run_brand(brand, strategies.for_brand(brand), today, None)
            .await
    }

    /// Scrape every brand in configured order.
    ///
    /// A brand whose event cannot be recorded is logged and still reported in
    /// the summary; the run carries on.
    pub async fn run_all(
        &self,
        brands: &[BrandConfig],
        strategies: &Strategies<'_>,
        today: NaiveDate,
    ) -> RunSummary {
        let run_id = Uuid::new_v4();
        tracing::info!(%run_id, brands = brands.len(), "starting scrape run");

        let mut outcomes = Vec::with_capacity(brands.len());
        for (i, brand) in brands.iter().enumerate() {
            if i > 0 {
                pause(self.brand_pause).await;
            }
            let outcome = self
                .scrape_brand(brand, strategies.for_brand(brand), today, Some(run_id))
                .await;
            if let Err(e) = self.record(&outcome.event).await {
                tracing::error!(brand = %brand.name, error = %e, "scrape event not recorded");
            }
            outcomes.push(outcome);
        }

        let summary = RunSummary::new(run_id, outcomes);
        tracing::info!(
            %run_id,
            total_found = summary.total_found,
            total_new = summary.total_new,
            "scrape run complete"
        );
        summary
    }

    async fn record(&self, event: &ScrapeEvent) -> Result<(), PipelineError> {
        self.catalog
            .record_scrape_event(event)
            .await
            .map_err(|source| PipelineError::Ledger {
                brand: event.brand.clone(),
                source,
            })
    }

    async fn scrape_brand(
        &self,
        brand: &BrandConfig,
        strategy: &dyn ExtractionStrategy,
        today: NaiveDate,
        run_id: Option<Uuid>,
    ) -> BrandOutcome {
        let method = strategy.method();

        if brand.urls.is_empty() {
            let reason = brand.skip_reason();
            tracing::info!(brand = %brand.name, reason = %reason, "skipped");
            return BrandOutcome {
                event: ScrapeEvent::skipped(run_id, &brand.name, method, &reason),
                new_names: Vec::new(),
            };
        }

        let mut event = ScrapeEvent {
            run_id,
            brand: brand.name.clone(),
            timestamp: Utc::now(),
            products_found: 0,
            new_products: 0,
            status: ScrapeStatus::Error,
            error: None,
            method,
        };

        if let Err(e) = strategy.preflight() {
            tracing::error!(brand = %brand.name, %method, error = %e, "extraction strategy unavailable");
            event.error = Some(e.to_string());
            return BrandOutcome {
                event,
                new_names: Vec::new(),
            };
        }

        let mut candidates: Vec<ProductCandidate> = Vec::new();
        let mut notes: Vec<String> = Vec::new();

        for url in &brand.urls {
            match strategy.acquire(brand, url, today).await {
                Ok(capture) => {
                    let found = strategy.extract(&capture, brand).await;
                    tracing::info!(brand = %brand.name, url = %url, found = found.len(), "page extracted");
                    candidates.extend(found);
                }
                Err(e) => {
                    tracing::warn!(brand = %brand.name, url = %url, error = %e, "page failed");
                    notes.push(format!("Failed to fetch {url}: {e}"));
                }
            }
            pause(self.url_pause).await;
        }

        let unique: Vec<ProductCandidate> = distinct_candidates(&candidates)
            .into_iter()
            .cloned()
            .collect();
        event.products_found = count(unique.len());
        event.status = ScrapeStatus::from_url_failures(notes.len(), brand.urls.len());

        let mut new_names = Vec::new();
        if event.status != ScrapeStatus::Error {
            match self.catalog.reconcile(&brand.name, &unique, today).await {
                Ok(outcome) => {
                    event.new_products = count(outcome.new);
                    for name in &outcome.new_names {
                        tracing::info!(brand = %brand.name, product = %name, "new product");
                    }
                    new_names = outcome.new_names;
                }
                Err(e) => {
                    tracing::error!(brand = %brand.name, error = %e, "reconciliation failed");
                    event.status = ScrapeStatus::Error;
                    notes.push(format!("Reconciliation failed: {e}"));
                }
            }
        }

        if !notes.is_empty() {
            event.error = Some(notes.join("; "));
        }
        event.timestamp = Utc::now();

        tracing::info!(
            brand = %brand.name,
            status = %event.status,
            found = event.products_found,
            new = event.new_products,
            "brand scraped"
        );

        BrandOutcome { event, new_names }
    }
}

fn count(n: usize) -> i32 {
    i32::try_from(n).unwrap_or(i32::MAX)
}

async fn pause(duration: Duration) {
    if !duration.is_zero() {
        tokio::time::sleep(duration).await;
    }
}

#[cfg(test)]
#[path = "../pipeline_test.rs"]
mod tests;
