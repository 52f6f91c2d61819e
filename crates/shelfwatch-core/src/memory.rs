//! In-process [`CatalogStore`] used for dry runs and tests.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::catalog::{
    distinct_candidates, plan_sighting, CatalogError, CatalogStore, KnownProduct,
    ReconcileOutcome, Sighting,
};
use crate::products::{ProductCandidate, ScrapeEvent};

/// A catalogued product as held by [`MemoryCatalog`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredProduct {
    pub brand: String,
    pub name: String,
    pub url: Option<String>,
    pub image_url: Option<String>,
    pub category: Option<String>,
    pub first_seen: NaiveDate,
    pub last_seen: NaiveDate,
    pub is_new: bool,
}

impl StoredProduct {
    fn known(&self) -> KnownProduct {
        KnownProduct {
            url: self.url.clone(),
            image_url: self.image_url.clone(),
            category: self.category.clone(),
            first_seen: self.first_seen,
            last_seen: self.last_seen,
        }
    }
}

#[derive(Debug, Default)]
struct State {
    // Keyed by (brand, name key); insertion order kept separately.
    products: HashMap<(String, String), StoredProduct>,
    order: Vec<(String, String)>,
    events: Vec<ScrapeEvent>,
}

/// Catalog held in memory. The whole reconcile call runs under one lock, which
/// gives the same atomicity and per-brand serialization as the database store.
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    state: Mutex<State>,
}

impl MemoryCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Look up a product by brand and name, case-insensitively on the name.
    #[must_use]
    pub fn product(&self, brand: &str, name: &str) -> Option<StoredProduct> {
        let key = (brand.to_string(), crate::product_key(name));
        self.lock().products.get(&key).cloned()
    }

    /// Every product, in creation order.
    #[must_use]
    pub fn products(&self) -> Vec<StoredProduct> {
        let state = self.lock();
        state
            .order
            .iter()
            .filter_map(|key| state.products.get(key).cloned())
            .collect()
    }

    /// Every recorded scrape event, oldest first.
    #[must_use]
    pub fn events(&self) -> Vec<ScrapeEvent> {
        self.lock().events.clone()
    }

    /// Clear `is_new` on every product. Returns the number of rows changed.
    pub fn mark_all_seen(&self) -> usize {
        let mut state = self.lock();
        let mut changed = 0;
        for product in state.products.values_mut().filter(|p| p.is_new) {
            product.is_new = false;
            changed += 1;
        }
        changed
    }
}

#[async_trait]
impl CatalogStore for MemoryCatalog {
    async fn reconcile(
        &self,
        brand: &str,
        candidates: &[ProductCandidate],
        today: NaiveDate,
    ) -> Result<ReconcileOutcome, CatalogError> {
        let mut state = self.lock();
        let mut outcome = ReconcileOutcome::default();

        for candidate in distinct_candidates(candidates) {
            let key = (brand.to_string(), candidate.key());
            let existing = state.products.get(&key).map(StoredProduct::known);
            let sighting = plan_sighting(existing.as_ref(), brand, candidate, today);
            outcome.record(&sighting);

            match sighting {
                Sighting::New(product) => {
                    state.order.push(key.clone());
                    state.products.insert(
                        key,
                        StoredProduct {
                            brand: product.brand,
                            name: product.name,
                            url: product.url,
                            image_url: product.image_url,
                            category: product.category,
                            first_seen: product.first_seen,
                            last_seen: product.last_seen,
                            is_new: true,
                        },
                    );
                }
                Sighting::Seen(update) => {
                    if let Some(stored) = state.products.get_mut(&key) {
                        stored.url = update.url;
                        stored.image_url = update.image_url;
                        stored.category = update.category;
                        stored.last_seen = update.last_seen;
                    }
                }
            }
        }

        Ok(outcome)
    }

    async fn record_scrape_event(&self, event: &ScrapeEvent) -> Result<(), CatalogError> {
        self.lock().events.push(event.clone());
        Ok(())
    }
}
