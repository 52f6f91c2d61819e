//! CSS-selector extraction over fetched HTML.

use std::collections::HashSet;
use std::sync::LazyLock;

use async_trait::async_trait;
use chrono::NaiveDate;
use scraper::{ElementRef, Html, Selector};
use shelfwatch_core::{product_key, BrandConfig, ExtractionMethod, ProductCandidate, SelectorSet};
use url::Url;

use super::{ExtractionStrategy, PageCapture};
use crate::error::ScraperError;
use crate::fetch::PageFetcher;
use crate::normalize::{clean_product_name, normalize};

/// Most containers considered per page; beyond this a selector is matching
/// page furniture.
pub const MAX_CONTAINERS: usize = 100;

/// Characters of container text searched when no name selector matches.
const TEXT_FALLBACK_CHARS: usize = 150;

/// Tried in order when the brand's container selector matches nothing.
const FALLBACK_CONTAINERS: &[&str] = &["article", ".product", ".item", "[class*=\"product\"]"];

const IMAGE_ATTRS: &[&str] = &["src", "data-src", "data-lazy-src"];
const FALLBACK_IMAGE_ATTRS: &[&str] = &["src", "data-src"];

static FALLBACK_SELECTORS: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    FALLBACK_CONTAINERS
        .iter()
        .map(|s| Selector::parse(s).expect("valid fallback container selector"))
        .collect()
});
static ANY_LINK: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("valid link selector"));
static ANY_IMAGE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("img").expect("valid image selector"));

/// Fetches pages over HTTP (or headless Chromium) and parses them with the
/// brand's selectors.
pub struct MarkupStrategy {
    fetcher: PageFetcher,
}

impl MarkupStrategy {
    #[must_use]
    pub fn new(fetcher: PageFetcher) -> Self {
        Self { fetcher }
    }
}

#[async_trait]
impl ExtractionStrategy for MarkupStrategy {
    fn method(&self) -> ExtractionMethod {
        ExtractionMethod::Markup
    }

    async fn acquire(
        &self,
        brand: &BrandConfig,
        url: &str,
        _today: NaiveDate,
    ) -> Result<PageCapture, ScraperError> {
        let html = self.fetcher.fetch(url, brand.needs_js, &brand.headers).await?;
        Ok(PageCapture::Html {
            html,
            base_url: url.to_string(),
        })
    }

    async fn extract(&self, capture: &PageCapture, brand: &BrandConfig) -> Vec<ProductCandidate> {
        match capture {
            PageCapture::Html { html, base_url } => {
                extract_products(html, base_url, &brand.selectors)
            }
            PageCapture::VisionReply { .. } => Vec::new(),
        }
    }
}

/// Parse `html` into candidates using `selectors`, resolving links and image
/// sources against `base_url`.
///
/// Containers come from `selectors.product`, or from the first fallback
/// selector that matches when that finds nothing. Containers without a valid
/// name, or whose name repeats an earlier one case-insensitively, are skipped.
#[must_use]
pub fn extract_products(html: &str, base_url: &str, selectors: &SelectorSet) -> Vec<ProductCandidate> {
    let document = Html::parse_document(html);
    let base = Url::parse(base_url).ok();

    let name_selectors = compile_all(&selectors.name);
    let link_selectors = compile_all(&selectors.link);
    let image_selectors = compile_all(&selectors.image);

    let containers = select_containers(&document, &selectors.product);

    let mut seen = HashSet::new();
    let mut products = Vec::new();

    for container in containers.into_iter().take(MAX_CONTAINERS) {
        let Some(name) = container_name(container, &name_selectors) else {
            continue;
        };
        if !seen.insert(product_key(&name)) {
            continue;
        }

        products.push(ProductCandidate {
            name,
            url: container_link(container, &link_selectors, base.as_ref()),
            image_url: container_image(container, &image_selectors, base.as_ref()),
            category: None,
        });
    }

    products
}

fn compile_all(raw: &[String]) -> Vec<Selector> {
    raw.iter()
        .filter(|s| !s.trim().is_empty())
        .filter_map(|s| match Selector::parse(s) {
            Ok(selector) => Some(selector),
            Err(e) => {
                tracing::warn!(selector = %s, error = %e, "ignoring invalid CSS selector");
                None
            }
        })
        .collect()
}

fn select_containers<'a>(document: &'a Html, product_selector: &str) -> Vec<ElementRef<'a>> {
    if let Some(selector) = compile_all(&[product_selector.to_string()]).first() {
        let found: Vec<_> = document.select(selector).collect();
        if !found.is_empty() {
            return found;
        }
    }

    for (raw, selector) in FALLBACK_CONTAINERS.iter().zip(FALLBACK_SELECTORS.iter()) {
        let found: Vec<_> = document.select(selector).collect();
        if !found.is_empty() {
            tracing::debug!(
                product_selector,
                fallback = %raw,
                count = found.len(),
                "container selector matched nothing; using fallback"
            );
            return found;
        }
    }

    Vec::new()
}

fn container_name(container: ElementRef<'_>, name_selectors: &[Selector]) -> Option<String> {
    let from_selectors = name_selectors.iter().find_map(|selector| {
        let element = container.select(selector).next()?;
        clean_product_name(&element.text().collect::<String>())
    });
    if from_selectors.is_some() {
        return from_selectors;
    }

    // The window is taken over raw text, indentation included.
    let head: String = container
        .text()
        .flat_map(str::chars)
        .take(TEXT_FALLBACK_CHARS)
        .collect();
    normalize(&head)
        .split(['|', '·', '•'])
        .find_map(clean_product_name)
}

fn container_link(
    container: ElementRef<'_>,
    link_selectors: &[Selector],
    base: Option<&Url>,
) -> Option<String> {
    link_selectors
        .iter()
        .find_map(|selector| {
            let element = container.select(selector).next()?;
            usable_href(element.value().attr("href")?)
        })
        .or_else(|| {
            container
                .select(&ANY_LINK)
                .next()
                .and_then(|a| usable_href(a.value().attr("href")?))
        })
        .and_then(|href| resolve(base, href))
}

fn container_image(
    container: ElementRef<'_>,
    image_selectors: &[Selector],
    base: Option<&Url>,
) -> Option<String> {
    image_selectors
        .iter()
        .find_map(|selector| {
            let element = container.select(selector).next()?;
            first_attr(element, IMAGE_ATTRS)
        })
        .or_else(|| {
            container
                .select(&ANY_IMAGE)
                .next()
                .and_then(|img| first_attr(img, FALLBACK_IMAGE_ATTRS))
        })
        .and_then(|src| resolve(base, src))
}

fn usable_href(href: &str) -> Option<&str> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') || href.starts_with("javascript:") {
        None
    } else {
        Some(href)
    }
}

fn first_attr<'a>(element: ElementRef<'a>, attrs: &[&str]) -> Option<&'a str> {
    attrs
        .iter()
        .filter_map(|attr| element.value().attr(attr))
        .map(str::trim)
        .find(|v| !v.is_empty())
}

fn resolve(base: Option<&Url>, href: &str) -> Option<String> {
    match base {
        Some(base) => base.join(href).ok().map(String::from),
        None => Url::parse(href).ok().map(String::from),
    }
}

#[cfg(test)]
#[path = "markup_test.rs"]
mod tests;
