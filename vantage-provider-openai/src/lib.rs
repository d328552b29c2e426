//! OpenAI-compatible chat-completions [`Provider`] for vantage.
//!
//! Speaks the Chat Completions wire format, so any compatible endpoint
//! works by overriding the base URL.
//!
//! Reference: <https://platform.openai.com/docs/api-reference/chat>

#![deny(missing_docs)]

pub(crate) mod mapping;

use std::future::Future;
use vantage_core::{Provider, ProviderError, ProviderRequest, ProviderResponse};

/// Default model used when the request carries none.
const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// OpenAI-compatible HTTP provider.
pub struct OpenAiProvider {
    api_key: String,
    base_url: String,
    default_model: String,
    client: reqwest::Client,
}

impl OpenAiProvider {
    /// Create a provider for `api.openai.com` with the given key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: "https://api.openai.com".to_owned(),
            default_model: DEFAULT_MODEL.to_owned(),
            client: reqwest::Client::new(),
        }
    }

    /// Override the base URL (compatible endpoints, local gateways).
    /// A trailing slash is stripped.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        let mut url = base_url.into();
        while url.ends_with('/') {
            url.pop();
        }
        self.base_url = url;
        self
    }

    /// Override the default model.
    pub fn default_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = model.into();
        self
    }

    fn completions_url(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url)
    }
}

/// Map an HTTP status code to a [`ProviderError`].
fn map_http_status(status: reqwest::StatusCode, body: &str) -> ProviderError {
    match status.as_u16() {
        401 | 403 => ProviderError::AuthFailed(body.to_string()),
        429 => ProviderError::RateLimited,
        _ => ProviderError::RequestFailed(format!("status {}: {body}", status.as_u16())),
    }
}

impl Provider for OpenAiProvider {
    fn complete(
        &self,
        request: ProviderRequest,
    ) -> impl Future<Output = Result<ProviderResponse, ProviderError>> + Send {
        let url = self.completions_url();
        let api_key = self.api_key.clone();
        let default_model = self.default_model.clone();
        let http_client = self.client.clone();

        async move {
            let body = mapping::to_api_request(&request, &default_model);

            tracing::debug!(url = %url, model = %body["model"], "sending completion request");

            let response = http_client
                .post(&url)
                .header("authorization", format!("Bearer {api_key}"))
                .header("content-type", "application/json")
                .json(&body)
                .send()
                .await
                .map_err(|e| ProviderError::Other(Box::new(e)))?;

            let status = response.status();
            let response_text = response
                .text()
                .await
                .map_err(|e| ProviderError::Other(Box::new(e)))?;

            if !status.is_success() {
                return Err(map_http_status(status, &response_text));
            }

            let json: serde_json::Value = serde_json::from_str(&response_text)
                .map_err(|e| ProviderError::InvalidResponse(format!("invalid JSON: {e}")))?;

            mapping::parse_response(&json, &default_model)
        }
    }
}
