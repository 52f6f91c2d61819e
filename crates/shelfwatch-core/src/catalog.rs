//! Catalog reconciliation: the rules for merging one run's candidates into
//! the durable product ledger, and the store seam that applies them.

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;

use crate::products::{ProductCandidate, ScrapeEvent};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog store failure: {0}")]
    Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl CatalogError {
    pub fn store(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Store(Box::new(err))
    }
}

/// The mutable state of an already-catalogued product, as read by the store
/// before applying a sighting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnownProduct {
    pub url: Option<String>,
    pub image_url: Option<String>,
    pub category: Option<String>,
    pub first_seen: NaiveDate,
    pub last_seen: NaiveDate,
}

/// A product to insert. Stores always insert with `is_new = true`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduct {
    pub brand: String,
    pub name: String,
    pub name_key: String,
    pub url: Option<String>,
    pub image_url: Option<String>,
    pub category: Option<String>,
    pub first_seen: NaiveDate,
    pub last_seen: NaiveDate,
}

/// The fields a repeat sighting rewrites. `first_seen` and `is_new` are
/// never part of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SightingUpdate {
    pub url: Option<String>,
    pub image_url: Option<String>,
    pub category: Option<String>,
    pub last_seen: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sighting {
    New(NewProduct),
    Seen(SightingUpdate),
}

/// Decide what one candidate does to the catalog.
///
/// A candidate with no existing row becomes a [`NewProduct`] first and last
/// seen `today`. Otherwise optional attributes are coalesced (a present value
/// replaces, an absent one keeps what is stored) and `last_seen` moves to
/// `today` unless the stored date is already later.
#[must_use]
pub fn plan_sighting(
    existing: Option<&KnownProduct>,
    brand: &str,
    candidate: &ProductCandidate,
    today: NaiveDate,
) -> Sighting {
    match existing {
        None => Sighting::New(NewProduct {
            brand: brand.to_string(),
            name: candidate.name.split_whitespace().collect::<Vec<_>>().join(" "),
            name_key: candidate.key(),
            url: candidate.url.clone(),
            image_url: candidate.image_url.clone(),
            category: candidate.category.clone(),
            first_seen: today,
            last_seen: today,
        }),
        Some(known) => Sighting::Seen(SightingUpdate {
            url: candidate.url.clone().or_else(|| known.url.clone()),
            image_url: candidate
                .image_url
                .clone()
                .or_else(|| known.image_url.clone()),
            category: candidate
                .category
                .clone()
                .or_else(|| known.category.clone()),
            last_seen: known.last_seen.max(today),
        }),
    }
}

/// Drop candidates whose key repeats an earlier one, or is empty.
/// Encounter order is kept.
#[must_use]
pub fn distinct_candidates(candidates: &[ProductCandidate]) -> Vec<&ProductCandidate> {
    let mut seen = HashSet::new();
    candidates
        .iter()
        .filter(|c| {
            let key = c.key();
            !key.is_empty() && seen.insert(key)
        })
        .collect()
}

/// Result of reconciling one brand's candidates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileOutcome {
    /// Distinct candidates processed.
    pub total: usize,
    /// Candidates that created a catalog entry.
    pub new: usize,
    /// Names of the created entries, in encounter order.
    pub new_names: Vec<String>,
}

impl ReconcileOutcome {
    /// Count one applied sighting.
    pub fn record(&mut self, sighting: &Sighting) {
        self.total += 1;
        if let Sighting::New(product) = sighting {
            self.new += 1;
            self.new_names.push(product.name.clone());
        }
    }
}

/// Persistence seam for the orchestrator.
///
/// Implementations apply [`plan_sighting`] to every distinct candidate of one
/// call atomically, and serialize concurrent calls for the same brand.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn reconcile(
        &self,
        brand: &str,
        candidates: &[ProductCandidate],
        today: NaiveDate,
    ) -> Result<ReconcileOutcome, CatalogError>;

    /// Append one entry to the scrape history ledger.
    async fn record_scrape_event(&self, event: &ScrapeEvent) -> Result<(), CatalogError>;
}
