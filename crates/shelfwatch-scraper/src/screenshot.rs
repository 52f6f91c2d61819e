//! Full-page screenshot capture for the vision extractor.
//!
//! Uses the ScreenshotOne API when an access key is configured and falls back
//! to a local headless Chromium. Captures are kept on disk as
//! `<brand-slug>_<url-hash>_<YYYYMMDD>.png` so a later run can reuse them.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::NaiveDate;
use reqwest::Client;
use sha2::{Digest, Sha256};

use crate::error::ScraperError;
use crate::rate_limit::retry_with_backoff;

pub const SCREENSHOTONE_API_URL: &str = "https://api.screenshotone.com";

const VIEWPORT_WIDTH: u32 = 1280;
const VIEWPORT_HEIGHT: u32 = 2000;
/// Seconds the capture service waits for scripts before shooting.
const RENDER_DELAY_SECS: u32 = 3;

/// A stored capture.
#[derive(Debug, Clone)]
pub struct Screenshot {
    pub path: PathBuf,
    pub bytes: Vec<u8>,
}

impl Screenshot {
    /// Read a previously stored capture.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Io`] if the file cannot be read.
    pub async fn load(path: &Path) -> Result<Self, ScraperError> {
        let bytes = tokio::fs::read(path).await.map_err(|e| io_error(path, e))?;
        Ok(Self {
            path: path.to_path_buf(),
            bytes,
        })
    }

    #[must_use]
    pub fn media_type(&self) -> &'static str {
        match self.path.extension().and_then(|e| e.to_str()) {
            Some("jpg" | "jpeg") => "image/jpeg",
            _ => "image/png",
        }
    }
}

pub struct ScreenshotService {
    client: Client,
    dir: PathBuf,
    api_key: Option<String>,
    api_url: String,
    browser_bin: String,
    timeout_secs: u64,
    max_retries: u32,
    backoff_base_secs: u64,
}

impl ScreenshotService {
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the HTTP client cannot be built.
    pub fn new(
        dir: PathBuf,
        api_key: Option<String>,
        browser_bin: &str,
        timeout_secs: u64,
    ) -> Result<Self, ScraperError> {
        // Full-page renders are slow; give the capture API twice the page timeout.
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs.saturating_mul(2)))
            .build()?;
        Ok(Self {
            client,
            dir,
            api_key,
            api_url: SCREENSHOTONE_API_URL.to_string(),
            browser_bin: browser_bin.to_string(),
            timeout_secs,
            max_retries: 0,
            backoff_base_secs: 0,
        })
    }

    /// Point the service at a different capture API host.
    #[must_use]
    pub fn with_api_url(mut self, api_url: &str) -> Self {
        self.api_url = api_url.trim_end_matches('/').to_string();
        self
    }

    #[must_use]
    pub fn with_retries(mut self, max_retries: u32, backoff_base_secs: u64) -> Self {
        self.max_retries = max_retries;
        self.backoff_base_secs = backoff_base_secs;
        self
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Capture `url` for the brand with slug `slug` and store it under today's name.
    ///
    /// # Errors
    ///
    /// Returns an error when the directory cannot be created, or when both the
    /// API (if configured) and the local browser fail.
    pub async fn capture(
        &self,
        slug: &str,
        url: &str,
        today: NaiveDate,
    ) -> Result<Screenshot, ScraperError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| io_error(&self.dir, e))?;
        let path = self.dir.join(screenshot_filename(slug, url, today));

        if let Some(key) = &self.api_key {
            match self.capture_with_api(key, url).await {
                Ok(bytes) => {
                    tokio::fs::write(&path, &bytes)
                        .await
                        .map_err(|e| io_error(&path, e))?;
                    tracing::info!(url, path = %path.display(), "screenshot saved");
                    return Ok(Screenshot { path, bytes });
                }
                Err(e) => {
                    tracing::warn!(url, error = %e, "screenshot API failed; falling back to local browser");
                }
            }
        }

        self.capture_with_browser(url, &path).await?;
        let shot = Screenshot::load(&path).await?;
        tracing::info!(url, path = %path.display(), "screenshot saved");
        Ok(shot)
    }

    /// The most recent stored capture of `url` for `slug`, if any.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Io`] if the directory exists but cannot be read.
    pub async fn latest(&self, slug: &str, url: &str) -> Result<Option<PathBuf>, ScraperError> {
        latest_screenshot(&self.dir, slug, url).await
    }

    async fn capture_with_api(&self, key: &str, url: &str) -> Result<Vec<u8>, ScraperError> {
        let endpoint = format!("{}/take", self.api_url);
        let width = VIEWPORT_WIDTH.to_string();
        let height = VIEWPORT_HEIGHT.to_string();
        let delay = RENDER_DELAY_SECS.to_string();

        retry_with_backoff(self.max_retries, self.backoff_base_secs, || {
            let query = [
                ("access_key", key),
                ("url", url),
                ("viewport_width", width.as_str()),
                ("viewport_height", height.as_str()),
                ("full_page", "true"),
                ("format", "png"),
                ("block_ads", "true"),
                ("block_cookie_banners", "true"),
                ("delay", delay.as_str()),
            ];
            let endpoint = endpoint.clone();
            async move {
                let response = self.client.get(&endpoint).query(&query).send().await?;
                let status = response.status();
                if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                    return Err(ScraperError::RateLimited {
                        url: endpoint,
                        retry_after_secs: 0,
                    });
                }
                if !status.is_success() {
                    return Err(ScraperError::UnexpectedStatus {
                        status: status.as_u16(),
                        url: endpoint,
                    });
                }
                Ok(response.bytes().await?.to_vec())
            }
        })
        .await
    }

    async fn capture_with_browser(&self, url: &str, path: &Path) -> Result<(), ScraperError> {
        let output = tokio::time::timeout(
            Duration::from_secs(self.timeout_secs.saturating_mul(2)),
            tokio::process::Command::new(&self.browser_bin)
                .args([
                    "--headless",
                    "--disable-gpu",
                    "--no-sandbox",
                    "--hide-scrollbars",
                    "--lang=el-GR",
                ])
                .arg(format!("--window-size={VIEWPORT_WIDTH},{VIEWPORT_HEIGHT}"))
                .arg(format!("--virtual-time-budget={}", RENDER_DELAY_SECS * 1000))
                .arg(format!("--screenshot={}", path.display()))
                .arg(url)
                .kill_on_drop(true)
                .output(),
        )
        .await
        .map_err(|_| ScraperError::Browser {
            url: url.to_owned(),
            reason: "screenshot timed out".to_string(),
        })?
        .map_err(|e| ScraperError::Browser {
            url: url.to_owned(),
            reason: format!("could not start {}: {e}", self.browser_bin),
        })?;

        if !output.status.success() {
            return Err(ScraperError::Browser {
                url: url.to_owned(),
                reason: format!(
                    "exited with {}: {}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }
        Ok(())
    }
}

/// `<slug>_<first 8 hex chars of sha256(url)>_<YYYYMMDD>.png`
#[must_use]
pub fn screenshot_filename(slug: &str, url: &str, date: NaiveDate) -> String {
    format!(
        "{slug}_{}_{}.png",
        url_hash(url),
        date.format("%Y%m%d")
    )
}

fn url_hash(url: &str) -> String {
    let digest = format!("{:x}", Sha256::digest(url.as_bytes()));
    digest[..8].to_string()
}

/// Latest stored capture of `url` for `slug` in `dir`, judged by the date
/// suffix. A missing directory counts as empty.
///
/// # Errors
///
/// Returns [`ScraperError::Io`] if `dir` exists but cannot be listed.
pub async fn latest_screenshot(
    dir: &Path,
    slug: &str,
    url: &str,
) -> Result<Option<PathBuf>, ScraperError> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(io_error(dir, e)),
    };

    let prefix = format!("{slug}_{}_", url_hash(url));
    let mut latest: Option<(String, PathBuf)> = None;
    while let Some(entry) = entries.next_entry().await.map_err(|e| io_error(dir, e))? {
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        let Some(date) = name
            .strip_prefix(&prefix)
            .and_then(|rest| rest.strip_suffix(".png"))
        else {
            continue;
        };
        if latest.as_ref().is_none_or(|(best, _)| date > best.as_str()) {
            latest = Some((date.to_string(), entry.path()));
        }
    }

    Ok(latest.map(|(_, path)| path))
}

fn io_error(path: &Path, source: std::io::Error) -> ScraperError {
    ScraperError::Io {
        path: path.display().to_string(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
    }

    #[test]
    fn filename_has_slug_hash_and_date() {
        let name = screenshot_filename("condito", "https://conditofoods.com/shop/", day(9));
        assert!(name.starts_with("condito_"));
        assert!(name.ends_with("_20260309.png"));
        let hash = &name["condito_".len().."condito_".len() + 8];
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn filename_hash_depends_on_url() {
        let a = screenshot_filename("heinz", "https://heinz.example/a", day(9));
        let b = screenshot_filename("heinz", "https://heinz.example/b", day(9));
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn latest_picks_newest_date_for_the_same_url() {
        let dir = tempfile::tempdir().unwrap();
        let url = "https://heinz.example/products";
        for d in [3, 12, 7] {
            std::fs::write(dir.path().join(screenshot_filename("heinz", url, day(d))), b"png")
                .unwrap();
        }
        // Another URL and another brand must be ignored.
        std::fs::write(
            dir.path()
                .join(screenshot_filename("heinz", "https://heinz.example/other", day(20))),
            b"png",
        )
        .unwrap();
        std::fs::write(
            dir.path().join(screenshot_filename("heinz-uk", url, day(25))),
            b"png",
        )
        .unwrap();

        let latest = latest_screenshot(dir.path(), "heinz", url)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            latest.file_name().unwrap().to_str().unwrap(),
            screenshot_filename("heinz", url, day(12))
        );
    }

    #[tokio::test]
    async fn latest_in_missing_dir_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(latest_screenshot(&missing, "heinz", "https://heinz.example")
            .await
            .unwrap()
            .is_none());
    }

    #[test]
    fn media_type_follows_extension() {
        let png = Screenshot {
            path: PathBuf::from("a.png"),
            bytes: vec![],
        };
        let jpg = Screenshot {
            path: PathBuf::from("a.jpeg"),
            bytes: vec![],
        };
        assert_eq!(png.media_type(), "image/png");
        assert_eq!(jpg.media_type(), "image/jpeg");
    }
}
