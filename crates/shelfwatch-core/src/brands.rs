use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::products::ExtractionMethod;
use crate::{ConfigError, CoreError};

/// Declared reason a brand has nothing to scrape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BrandStatus {
    Maintenance,
    NoWebsite,
}

impl std::fmt::Display for BrandStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BrandStatus::Maintenance => write!(f, "maintenance"),
            BrandStatus::NoWebsite => write!(f, "no_website"),
        }
    }
}

/// CSS selectors for the markup extractor.
///
/// `name`, `link` and `image` are ordered: the first selector that yields a
/// usable value wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectorSet {
    /// Selector for one product container.
    #[serde(default)]
    pub product: String,
    #[serde(default)]
    pub name: Vec<String>,
    #[serde(default)]
    pub link: Vec<String>,
    #[serde(default)]
    pub image: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrandConfig {
    pub name: String,
    /// Pages to visit in order. Empty means the brand is skipped.
    #[serde(default)]
    pub urls: Vec<String>,
    #[serde(default)]
    pub selectors: SelectorSet,
    /// The page only renders its catalog after running scripts.
    #[serde(default)]
    pub needs_js: bool,
    /// Extra request headers, merged over the fetcher defaults.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub status: Option<BrandStatus>,
    #[serde(default)]
    pub method: ExtractionMethod,
    #[serde(default)]
    pub notes: Option<String>,
}

impl BrandConfig {
    /// Generate a filesystem-safe slug from the brand name.
    #[must_use]
    pub fn slug(&self) -> String {
        self.name
            .to_lowercase()
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' {
                    c
                } else if c == ' ' {
                    '-'
                } else {
                    '\0'
                }
            })
            .filter(|&c| c != '\0')
            .collect::<String>()
            .split('-')
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("-")
    }

    /// Text recorded on the `skipped` event when the brand has no URLs.
    #[must_use]
    pub fn skip_reason(&self) -> String {
        self.status
            .map_or_else(|| "no_url".to_string(), |s| s.to_string())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BrandsFile {
    pub brands: Vec<BrandConfig>,
}

impl BrandsFile {
    /// Look up a brand by name, case-insensitively.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&BrandConfig> {
        let wanted = name.trim().to_lowercase();
        self.brands.iter().find(|b| b.name.to_lowercase() == wanted)
    }

    /// Like [`BrandsFile::get`], but an unknown name is an error listing the
    /// configured brands.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnknownBrand`] when no brand matches.
    pub fn require(&self, name: &str) -> Result<&BrandConfig, CoreError> {
        self.get(name).ok_or_else(|| CoreError::UnknownBrand {
            name: name.to_string(),
            available: self
                .brands
                .iter()
                .map(|b| b.name.as_str())
                .collect::<Vec<_>>()
                .join(", "),
        })
    }
}

/// Load and validate the brands configuration from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_brands(path: &Path) -> Result<BrandsFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::BrandsFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let brands_file: BrandsFile =
        serde_yaml::from_str(&content).map_err(ConfigError::BrandsFileParse)?;

    validate_brands(&brands_file)?;

    Ok(brands_file)
}

/// Parse and validate a brands configuration supplied inline as JSON, in the
/// same `{"brands": [...]}` shape as the YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the JSON cannot be parsed or fails validation.
pub fn load_brands_from_json(raw: &str) -> Result<BrandsFile, ConfigError> {
    let brands_file: BrandsFile = serde_json::from_str(raw)?;
    validate_brands(&brands_file)?;
    Ok(brands_file)
}

fn validate_brands(brands_file: &BrandsFile) -> Result<(), ConfigError> {
    let mut seen_names = HashSet::new();
    let mut seen_slugs = HashSet::new();

    for brand in &brands_file.brands {
        if brand.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "brand name must be non-empty".to_string(),
            ));
        }

        let lower_name = brand.name.to_lowercase();
        if !seen_names.insert(lower_name) {
            return Err(ConfigError::Validation(format!(
                "duplicate brand name: '{}'",
                brand.name
            )));
        }

        let slug = brand.slug();
        if !slug.is_empty() && !seen_slugs.insert(slug.clone()) {
            return Err(ConfigError::Validation(format!(
                "duplicate brand slug: '{}' (from brand '{}')",
                slug, brand.name
            )));
        }

        for raw in &brand.urls {
            let parsed = url::Url::parse(raw).map_err(|e| {
                ConfigError::Validation(format!(
                    "brand '{}' has invalid url '{raw}': {e}",
                    brand.name
                ))
            })?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(ConfigError::Validation(format!(
                    "brand '{}' url '{raw}' must use http or https",
                    brand.name
                )));
            }
        }

        if brand.method == ExtractionMethod::Markup
            && !brand.urls.is_empty()
            && brand.selectors.product.trim().is_empty()
        {
            return Err(ConfigError::Validation(format!(
                "brand '{}' uses markup extraction but has no product selector",
                brand.name
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
#[path = "brands_test.rs"]
mod tests;
