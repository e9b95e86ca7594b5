use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use super::error::TranslationError;
use super::interface::{TranslateRequest, TranslationApi};
use crate::config_store::TranslationConfig;

/// Longest slice of an error body kept in a diagnostic message.
const MAX_ERROR_BODY_CHARS: usize = 200;

/// Translation API reached over HTTP with bearer authentication.
#[derive(Debug, Clone)]
pub struct HttpTranslationApi {
    client: Client,
    target_language: String,
}

impl HttpTranslationApi {
    pub fn new(target_language: impl Into<String>, timeout: Duration) -> reqwest::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, target_language))
    }

    pub fn with_client(client: Client, target_language: impl Into<String>) -> Self {
        Self {
            client,
            target_language: target_language.into(),
        }
    }

    fn authorized(&self, builder: RequestBuilder, config: &TranslationConfig) -> RequestBuilder {
        builder.bearer_auth(&config.key)
    }

    /// Turn a non-2xx status into an error carrying a slice of the body.
    async fn check_status(response: Response) -> Result<Response, TranslationError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(TranslationError::Http {
            status: status.as_u16(),
            body: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
        })
    }

    /// Read a 2xx JSON body. A body that does not parse is a format error, not
    /// a network one, since `field` cannot be in it.
    async fn json_body(response: Response, field: &'static str) -> Result<Value, TranslationError> {
        let text = Self::check_status(response).await?.text().await?;
        serde_json::from_str(&text).map_err(|e| {
            debug!(error = %e, "Response body is not JSON");
            TranslationError::ResponseFormat(field)
        })
    }
}

#[async_trait]
impl TranslationApi for HttpTranslationApi {
    async fn translate(
        &self,
        text: &str,
        config: &TranslationConfig,
    ) -> Result<String, TranslationError> {
        let request = TranslateRequest {
            text: format!("{}\n{}", config.prompt, text),
            target_language: self.target_language.clone(),
            model: config.model().map(|m| m.to_string()),
        };

        debug!(url = %config.url, model = ?request.model, "Sending translation request");
        let response = self
            .authorized(self.client.post(&config.url), config)
            .json(&request)
            .send()
            .await?;
        let body = Self::json_body(response, "translated_text").await?;

        body.get("translated_text")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
            .ok_or(TranslationError::ResponseFormat("translated_text"))
    }

    async fn list_models(&self, config: &TranslationConfig) -> Result<Vec<String>, TranslationError> {
        let url = format!("{}/v1/models", config.url.trim_end_matches('/'));
        debug!(url = %url, "Listing models");

        let response = self.authorized(self.client.get(&url), config).send().await?;
        let body = Self::json_body(response, "data").await?;

        let models = body
            .get("data")
            .and_then(|v| v.as_array())
            .ok_or(TranslationError::ResponseFormat("data"))?;
        Ok(models
            .iter()
            .filter_map(|m| m.get("id").and_then(|id| id.as_str()))
            .map(|id| id.to_string())
            .collect())
    }
}
