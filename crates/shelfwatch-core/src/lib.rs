pub mod app_config;
pub mod brands;
pub mod catalog;
pub mod config;
pub mod memory;
pub mod products;

use thiserror::Error;

pub use app_config::{AppConfig, Environment};
pub use brands::{
    load_brands, load_brands_from_json, BrandConfig, BrandStatus, BrandsFile, SelectorSet,
};
pub use catalog::{
    distinct_candidates, plan_sighting, CatalogError, CatalogStore, KnownProduct, NewProduct,
    ReconcileOutcome, Sighting, SightingUpdate,
};
pub use config::{load_app_config, load_app_config_from_env, load_offline_app_config_from_env};
pub use memory::{MemoryCatalog, StoredProduct};
pub use products::{
    product_key, ExtractionMethod, ProductCandidate, ScrapeEvent, ScrapeStatus,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read brands file {path}: {source}")]
    BrandsFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse brands file: {0}")]
    BrandsFileParse(#[from] serde_yaml::Error),

    #[error("failed to parse inline brands JSON: {0}")]
    BrandsJsonParse(#[from] serde_json::Error),

    #[error("brands validation failed: {0}")]
    Validation(String),
}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("unknown brand '{name}' (available: {available})")]
    UnknownBrand { name: String, available: String },
}
