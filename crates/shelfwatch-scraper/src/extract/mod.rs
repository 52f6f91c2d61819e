//! Extraction strategies: turn one page of a brand's site into product
//! candidates.
//!
//! A strategy does its work in two steps. [`ExtractionStrategy::acquire`]
//! talks to the outside world (fetch the markup, or capture a screenshot and
//! ask the vision model about it) and may fail; the orchestrator records that
//! failure against the URL.
//! [`ExtractionStrategy::extract`] never fails: unusable input yields no
//! candidates.

mod json;
pub mod markup;
pub mod vision;

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::NaiveDate;
use shelfwatch_core::{BrandConfig, ExtractionMethod, ProductCandidate};

use crate::error::ScraperError;

pub use markup::{extract_products, MarkupStrategy};
pub use vision::{parse_vision_response, VisionStrategy, EXTRACTION_PROMPT};

/// What [`ExtractionStrategy::acquire`] brought back from one URL.
#[derive(Debug, Clone)]
pub enum PageCapture {
    Html { html: String, base_url: String },
    /// The vision model's raw answer about the screenshot stored at `screenshot`.
    VisionReply { screenshot: PathBuf, text: String },
}

#[async_trait]
pub trait ExtractionStrategy: Send + Sync {
    fn method(&self) -> ExtractionMethod;

    /// Check the strategy can run at all before any URL is visited.
    ///
    /// # Errors
    ///
    /// Returns the reason the strategy is unusable, e.g. a missing credential.
    fn preflight(&self) -> Result<(), ScraperError> {
        Ok(())
    }

    /// Fetch or capture `url` for `brand`.
    ///
    /// # Errors
    ///
    /// Any transport failure for this URL.
    async fn acquire(
        &self,
        brand: &BrandConfig,
        url: &str,
        today: NaiveDate,
    ) -> Result<PageCapture, ScraperError>;

    /// Candidates found in `capture`, in encounter order.
    async fn extract(&self, capture: &PageCapture, brand: &BrandConfig) -> Vec<ProductCandidate>;
}
