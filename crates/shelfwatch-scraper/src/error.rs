use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("rate limited by {url} (retry after {retry_after_secs}s)")]
    RateLimited { url: String, retry_after_secs: u64 },

    #[error("page not found: {url}")]
    NotFound { url: String },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("invalid request header \"{name}\": {reason}")]
    InvalidHeader { name: String, reason: String },

    #[error("browser failed on {url}: {reason}")]
    Browser { url: String, reason: String },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{0} is not set")]
    MissingCredential(&'static str),

    #[error("no stored screenshot for {brand} at {url}")]
    NoScreenshot { brand: String, url: String },

    #[error("vision response had no text content")]
    EmptyVisionResponse,
}
