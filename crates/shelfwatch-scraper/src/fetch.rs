//! Page transport: plain HTTP for static catalogs, a headless Chromium
//! `--dump-dom` for pages that only render their products after scripts run.

use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;

use crate::error::ScraperError;
use crate::rate_limit::retry_with_backoff;

const DEFAULT_ACCEPT: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8";
const DEFAULT_ACCEPT_LANGUAGE: &str = "el-GR,el;q=0.9,en;q=0.8";

/// Milliseconds of virtual time Chromium gets to run page scripts before the
/// DOM is dumped.
const RENDER_BUDGET_MS: u32 = 3000;

/// Fetches page markup, honouring a brand's `needs_js` flag and extra headers.
///
/// Transient HTTP failures (429, network errors, 5xx) are retried with
/// exponential backoff. Browser rendering is not retried.
pub struct PageFetcher {
    client: Client,
    user_agent: String,
    browser_bin: String,
    timeout_secs: u64,
    max_retries: u32,
    backoff_base_secs: u64,
}

impl PageFetcher {
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(
        timeout_secs: u64,
        user_agent: &str,
        browser_bin: &str,
        max_retries: u32,
        backoff_base_secs: u64,
    ) -> Result<Self, ScraperError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            user_agent: user_agent.to_string(),
            browser_bin: browser_bin.to_string(),
            timeout_secs,
            max_retries,
            backoff_base_secs,
        })
    }

    /// Return the markup of `url`.
    ///
    /// # Errors
    ///
    /// Any transport failure: HTTP status, network, invalid header, or a
    /// browser that could not be started, timed out or exited unsuccessfully.
    pub async fn fetch(
        &self,
        url: &str,
        needs_js: bool,
        headers: &BTreeMap<String, String>,
    ) -> Result<String, ScraperError> {
        if needs_js {
            self.render(url).await
        } else {
            self.fetch_static(url, headers).await
        }
    }

    async fn fetch_static(
        &self,
        url: &str,
        headers: &BTreeMap<String, String>,
    ) -> Result<String, ScraperError> {
        let headers = request_headers(headers)?;

        retry_with_backoff(self.max_retries, self.backoff_base_secs, || {
            let headers = headers.clone();
            async move {
                let response = self.client.get(url).headers(headers).send().await?;
                let status = response.status();

                if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                    let retry_after_secs = response
                        .headers()
                        .get(reqwest::header::RETRY_AFTER)
                        .and_then(|v| v.to_str().ok())
                        .and_then(|s| s.parse::<u64>().ok())
                        .unwrap_or(60);
                    return Err(ScraperError::RateLimited {
                        url: url.to_owned(),
                        retry_after_secs,
                    });
                }
                if status == reqwest::StatusCode::NOT_FOUND {
                    return Err(ScraperError::NotFound {
                        url: url.to_owned(),
                    });
                }
                if !status.is_success() {
                    return Err(ScraperError::UnexpectedStatus {
                        status: status.as_u16(),
                        url: url.to_owned(),
                    });
                }

                Ok(response.text().await?)
            }
        })
        .await
    }

    /// Render `url` in headless Chromium and return the resulting DOM.
    async fn render(&self, url: &str) -> Result<String, ScraperError> {
        let output = tokio::time::timeout(
            Duration::from_secs(self.timeout_secs),
            tokio::process::Command::new(&self.browser_bin)
                .args(["--headless", "--disable-gpu", "--no-sandbox", "--lang=el-GR"])
                .arg(format!("--user-agent={}", self.user_agent))
                .arg(format!("--virtual-time-budget={RENDER_BUDGET_MS}"))
                .arg("--dump-dom")
                .arg(url)
                .kill_on_drop(true)
                .output(),
        )
        .await
        .map_err(|_| ScraperError::Browser {
            url: url.to_owned(),
            reason: format!("timed out after {}s", self.timeout_secs),
        })?
        .map_err(|e| ScraperError::Browser {
            url: url.to_owned(),
            reason: format!("could not start {}: {e}", self.browser_bin),
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ScraperError::Browser {
                url: url.to_owned(),
                reason: format!("exited with {}: {}", output.status, stderr.trim()),
            });
        }

        let dom = String::from_utf8_lossy(&output.stdout).into_owned();
        if dom.trim().is_empty() {
            return Err(ScraperError::Browser {
                url: url.to_owned(),
                reason: "empty DOM".to_string(),
            });
        }
        Ok(dom)
    }
}

/// Browser-like defaults with the brand's headers laid over them.
fn request_headers(extra: &BTreeMap<String, String>) -> Result<HeaderMap, ScraperError> {
    let mut headers = HeaderMap::new();
    headers.insert(reqwest::header::ACCEPT, HeaderValue::from_static(DEFAULT_ACCEPT));
    headers.insert(
        reqwest::header::ACCEPT_LANGUAGE,
        HeaderValue::from_static(DEFAULT_ACCEPT_LANGUAGE),
    );

    for (name, value) in extra {
        let header_name =
            HeaderName::from_bytes(name.as_bytes()).map_err(|e| ScraperError::InvalidHeader {
                name: name.clone(),
                reason: e.to_string(),
            })?;
        let header_value =
            HeaderValue::from_str(value).map_err(|e| ScraperError::InvalidHeader {
                name: name.clone(),
                reason: e.to_string(),
            })?;
        headers.insert(header_name, header_value);
    }

    Ok(headers)
}
