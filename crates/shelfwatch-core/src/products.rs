use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Something an extraction strategy believes is a product, seen on one page
/// during one run. Not yet reconciled against the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductCandidate {
    pub name: String,
    pub url: Option<String>,
    pub image_url: Option<String>,
    pub category: Option<String>,
}

impl ProductCandidate {
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: None,
            image_url: None,
            category: None,
        }
    }

    /// Catalog identity of this candidate within its brand.
    #[must_use]
    pub fn key(&self) -> String {
        product_key(&self.name)
    }
}

/// Case-insensitive identity key for a product name.
///
/// Whitespace runs collapse to a single space and the result is lowercased,
/// so `"Tomato  Ketchup"` and `"tomato ketchup"` share a key.
#[must_use]
pub fn product_key(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// How a brand's pages are turned into candidates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionMethod {
    #[default]
    Markup,
    Vision,
}

impl ExtractionMethod {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ExtractionMethod::Markup => "markup",
            ExtractionMethod::Vision => "vision",
        }
    }
}

impl std::fmt::Display for ExtractionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ExtractionMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "markup" => Ok(ExtractionMethod::Markup),
            "vision" => Ok(ExtractionMethod::Vision),
            other => Err(format!("unknown extraction method: {other}")),
        }
    }
}

/// Outcome of one orchestration attempt for one brand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScrapeStatus {
    Success,
    Partial,
    Skipped,
    Error,
}

impl ScrapeStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ScrapeStatus::Success => "success",
            ScrapeStatus::Partial => "partial",
            ScrapeStatus::Skipped => "skipped",
            ScrapeStatus::Error => "error",
        }
    }

    /// Classify a brand run from its URL failure tally.
    ///
    /// `skipped` is never produced here; it is reserved for brands without URLs.
    #[must_use]
    pub fn from_url_failures(failed: usize, attempted: usize) -> Self {
        if failed == 0 {
            ScrapeStatus::Success
        } else if failed < attempted {
            ScrapeStatus::Partial
        } else {
            ScrapeStatus::Error
        }
    }
}

impl std::fmt::Display for ScrapeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ScrapeStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "success" => Ok(ScrapeStatus::Success),
            "partial" => Ok(ScrapeStatus::Partial),
            "skipped" => Ok(ScrapeStatus::Skipped),
            "error" => Ok(ScrapeStatus::Error),
            other => Err(format!("unknown scrape status: {other}")),
        }
    }
}

/// One audit record for the scrape history ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapeEvent {
    /// Groups the events written by a single full run; `None` for ad-hoc runs.
    pub run_id: Option<Uuid>,
    pub brand: String,
    pub timestamp: DateTime<Utc>,
    /// Candidates that survived cross-URL de-duplication.
    pub products_found: i32,
    /// Candidates that created a new catalog entry.
    pub new_products: i32,
    pub status: ScrapeStatus,
    pub error: Option<String>,
    pub method: ExtractionMethod,
}

impl ScrapeEvent {
    /// A `skipped` event for a brand with no URLs to visit.
    #[must_use]
    pub fn skipped(
        run_id: Option<Uuid>,
        brand: &str,
        method: ExtractionMethod,
        reason: &str,
    ) -> Self {
        Self {
            run_id,
            brand: brand.to_string(),
            timestamp: Utc::now(),
            products_found: 0,
            new_products: 0,
            status: ScrapeStatus::Skipped,
            error: Some(reason.to_string()),
            method,
        }
    }
}
