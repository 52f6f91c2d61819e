use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    /// Empty when loaded for a command that never touches the database.
    pub database_url: String,
    pub env: Environment,
    pub log_level: String,
    pub brands_path: PathBuf,
    /// Inline JSON brand map; takes precedence over `brands_path` when set.
    pub brands_json: Option<String>,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    /// Pause after every URL, in milliseconds.
    pub url_delay_ms: u64,
    /// Pause between brands in a full run, in milliseconds.
    pub brand_delay_ms: u64,
    pub max_retries: u32,
    pub retry_backoff_base_secs: u64,
    /// Chromium-compatible binary used for script rendering and local screenshots.
    pub browser_bin: String,
    pub screenshot_dir: PathBuf,
    pub screenshot_api_key: Option<String>,
    pub anthropic_api_key: Option<String>,
    pub vision_model: String,
    pub vision_api_url: String,
    /// Trailing window used by the "new products" report.
    pub new_window_days: u32,
    /// How far `first_seen` is backdated by a baseline reset.
    pub baseline_offset_days: u32,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field("brands_path", &self.brands_path)
            .field("brands_json", &self.brands_json.as_ref().map(|_| "[inline]"))
            .field("database_url", &"[redacted]")
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("url_delay_ms", &self.url_delay_ms)
            .field("brand_delay_ms", &self.brand_delay_ms)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_base_secs", &self.retry_backoff_base_secs)
            .field("browser_bin", &self.browser_bin)
            .field("screenshot_dir", &self.screenshot_dir)
            .field(
                "screenshot_api_key",
                &self.screenshot_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field(
                "anthropic_api_key",
                &self.anthropic_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("vision_model", &self.vision_model)
            .field("vision_api_url", &self.vision_api_url)
            .field("new_window_days", &self.new_window_days)
            .field("baseline_offset_days", &self.baseline_offset_days)
            .finish()
    }
}
