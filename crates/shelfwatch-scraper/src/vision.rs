//! Anthropic Messages API client for image description.

use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::ScraperError;
use crate::rate_limit::retry_with_backoff;

const ANTHROPIC_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 2000;

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: [Message<'a>; 1],
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: [ContentBlock<'a>; 2],
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum ContentBlock<'a> {
    Image { source: ImageSource<'a> },
    Text { text: &'a str },
}

#[derive(Serialize)]
struct ImageSource<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    media_type: &'a str,
    data: String,
}

#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ResponseBlock>,
}

#[derive(Deserialize)]
struct ResponseBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

/// Sends one image plus an instruction to a vision-capable model and returns
/// the model's free-text answer.
pub struct VisionClient {
    client: Client,
    api_key: String,
    model: String,
    api_url: String,
    max_retries: u32,
    backoff_base_secs: u64,
}

impl VisionClient {
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the HTTP client cannot be built.
    pub fn new(
        api_key: &str,
        model: &str,
        api_url: &str,
        timeout_secs: u64,
        max_retries: u32,
        backoff_base_secs: u64,
    ) -> Result<Self, ScraperError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            client,
            api_key: api_key.to_string(),
            model: model.to_string(),
            api_url: api_url.trim_end_matches('/').to_string(),
            max_retries,
            backoff_base_secs,
        })
    }

    /// Ask the model about `image`.
    ///
    /// # Errors
    ///
    /// Returns a transport or status error, [`ScraperError::Deserialize`] for
    /// an unreadable body, or [`ScraperError::EmptyVisionResponse`] when the
    /// answer has no text block.
    pub async fn describe(
        &self,
        image: &[u8],
        media_type: &str,
        instruction: &str,
    ) -> Result<String, ScraperError> {
        let url = format!("{}/v1/messages", self.api_url);
        let request = MessagesRequest {
            model: &self.model,
            max_tokens: MAX_TOKENS,
            messages: [Message {
                role: "user",
                content: [
                    ContentBlock::Image {
                        source: ImageSource {
                            kind: "base64",
                            media_type,
                            data: STANDARD.encode(image),
                        },
                    },
                    ContentBlock::Text { text: instruction },
                ],
            }],
        };

        let body = retry_with_backoff(self.max_retries, self.backoff_base_secs, || {
            let url = url.clone();
            let request = &request;
            async move {
                let response = self
                    .client
                    .post(&url)
                    .header("x-api-key", &self.api_key)
                    .header("anthropic-version", ANTHROPIC_VERSION)
                    .json(request)
                    .send()
                    .await?;
                let status = response.status();
                if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                    let retry_after_secs = response
                        .headers()
                        .get(reqwest::header::RETRY_AFTER)
                        .and_then(|v| v.to_str().ok())
                        .and_then(|s| s.parse::<u64>().ok())
                        .unwrap_or(60);
                    return Err(ScraperError::RateLimited {
                        url,
                        retry_after_secs,
                    });
                }
                if !status.is_success() {
                    return Err(ScraperError::UnexpectedStatus {
                        status: status.as_u16(),
                        url,
                    });
                }
                Ok(response.text().await?)
            }
        })
        .await?;

        let parsed: MessagesResponse =
            serde_json::from_str(&body).map_err(|e| ScraperError::Deserialize {
                context: "vision response".to_string(),
                source: e,
            })?;

        let text = parsed
            .content
            .into_iter()
            .filter(|block| block.kind == "text")
            .filter_map(|block| block.text)
            .collect::<Vec<_>>()
            .join("\n");

        if text.trim().is_empty() {
            return Err(ScraperError::EmptyVisionResponse);
        }
        Ok(text)
    }
}
