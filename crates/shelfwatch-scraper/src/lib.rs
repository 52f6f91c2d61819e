pub mod error;
pub mod extract;
pub mod fetch;
pub mod normalize;
pub mod pipeline;
pub(crate) mod rate_limit;
pub mod screenshot;
pub mod vision;

pub use error::ScraperError;
pub use extract::{
    extract_products, parse_vision_response, ExtractionStrategy, MarkupStrategy, PageCapture,
    VisionStrategy,
};
pub use fetch::PageFetcher;
pub use normalize::{clean_product_name, is_valid_product_name, normalize};
pub use pipeline::{BrandOutcome, Orchestrator, PipelineError, RunSummary, Strategies};
pub use screenshot::{Screenshot, ScreenshotService};
pub use vision::VisionClient;
