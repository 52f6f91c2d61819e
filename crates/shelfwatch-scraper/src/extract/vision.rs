//! Screenshot-plus-vision-model extraction.

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::NaiveDate;
use shelfwatch_core::{product_key, BrandConfig, ExtractionMethod, ProductCandidate};

use super::json::first_json_array;
use super::{ExtractionStrategy, PageCapture};
use crate::error::ScraperError;
use crate::normalize::normalize;
use crate::screenshot::{Screenshot, ScreenshotService};
use crate::vision::VisionClient;

/// Instruction sent with every screenshot, after a `Brand: <name>` line.
pub const EXTRACTION_PROMPT: &str = r#"Analyze this screenshot of a food/condiment company's product page.

Extract ALL product names visible on this page. Focus on:
- Mayonnaise, ketchup, mustard, sauces, dressings, dips
- Ready-made salads (Russian salad, tzatziki, etc.)
- Any other packaged food products

For each product, provide:
1. Product name (in the original language shown)
2. Category (sauce/dip/salad/condiment/other)

IMPORTANT:
- Only list actual products, NOT navigation items, menus, or page sections
- Include product variants (e.g., "Mayonnaise Light 500g", "Mayonnaise Classic 250g")
- If you see product packaging or labels, include those products

Return your response as a JSON array:
[
  {"name": "Product Name", "category": "sauce"},
  {"name": "Another Product", "category": "dip"}
]

If no products are visible, return an empty array: []
"#;

/// Captures each URL as a screenshot and asks a vision model which products
/// it shows.
pub struct VisionStrategy {
    screenshots: ScreenshotService,
    client: Option<VisionClient>,
    reuse_screenshots: bool,
}

impl VisionStrategy {
    /// `client` is `None` when no API key is configured; the strategy then
    /// fails its preflight check.
    #[must_use]
    pub fn new(screenshots: ScreenshotService, client: Option<VisionClient>) -> Self {
        Self {
            screenshots,
            client,
            reuse_screenshots: false,
        }
    }

    /// Use the newest stored screenshot of each URL instead of capturing.
    #[must_use]
    pub fn reuse_screenshots(mut self, reuse: bool) -> Self {
        self.reuse_screenshots = reuse;
        self
    }
}

#[async_trait]
impl ExtractionStrategy for VisionStrategy {
    fn method(&self) -> ExtractionMethod {
        ExtractionMethod::Vision
    }

    fn preflight(&self) -> Result<(), ScraperError> {
        if self.client.is_none() {
            return Err(ScraperError::MissingCredential("ANTHROPIC_API_KEY"));
        }
        Ok(())
    }

    async fn acquire(
        &self,
        brand: &BrandConfig,
        url: &str,
        today: NaiveDate,
    ) -> Result<PageCapture, ScraperError> {
        let client = self
            .client
            .as_ref()
            .ok_or(ScraperError::MissingCredential("ANTHROPIC_API_KEY"))?;
        let shot = self.screenshot(brand, url, today).await?;

        let instruction = format!("Brand: {}\n\n{EXTRACTION_PROMPT}", brand.name);
        let text = client
            .describe(&shot.bytes, shot.media_type(), &instruction)
            .await?;

        Ok(PageCapture::VisionReply {
            screenshot: shot.path,
            text,
        })
    }

    async fn extract(&self, capture: &PageCapture, brand: &BrandConfig) -> Vec<ProductCandidate> {
        let PageCapture::VisionReply { screenshot, text } = capture else {
            return Vec::new();
        };

        let products = parse_vision_response(text);
        if products.is_empty() {
            tracing::warn!(
                brand = %brand.name,
                path = %screenshot.display(),
                "vision response contained no usable products"
            );
        }
        products
    }
}

impl VisionStrategy {
    async fn screenshot(
        &self,
        brand: &BrandConfig,
        url: &str,
        today: NaiveDate,
    ) -> Result<Screenshot, ScraperError> {
        let slug = brand.slug();

        if self.reuse_screenshots {
            let path = self
                .screenshots
                .latest(&slug, url)
                .await?
                .ok_or_else(|| ScraperError::NoScreenshot {
                    brand: brand.name.clone(),
                    url: url.to_string(),
                })?;
            tracing::info!(brand = %brand.name, path = %path.display(), "reusing stored screenshot");
            return Screenshot::load(&path).await;
        }

        self.screenshots.capture(&slug, url, today).await
    }
}

/// Candidates from a vision model's answer: the first well-formed JSON array
/// of `{name, category}` objects in `text`.
///
/// Names are whitespace-normalized and de-duplicated case-insensitively;
/// they are not run through the product-name heuristics. Anything
/// unparseable yields an empty list.
#[must_use]
pub fn parse_vision_response(text: &str) -> Vec<ProductCandidate> {
    let Some(values) = first_json_array(text) else {
        return Vec::new();
    };

    let mut seen = HashSet::new();
    values
        .iter()
        .filter_map(|value| {
            let name = normalize(value.get("name")?.as_str()?);
            if name.is_empty() || !seen.insert(product_key(&name)) {
                return None;
            }
            let category = value
                .get("category")
                .and_then(serde_json::Value::as_str)
                .map(normalize)
                .filter(|c| !c.is_empty());
            Some(ProductCandidate {
                name,
                url: None,
                image_url: None,
                category,
            })
        })
        .collect()
}
