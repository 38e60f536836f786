use crate::adapters::http::{build_client, read_json, transport_error};
use crate::config::toml_config::TranslationConfig;
use crate::domain::model::ScanStage;
use crate::domain::ports::Translator;
use crate::utils::error::{Result, ScanError};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct TranslateResponse {
    data: TranslateData,
}

#[derive(Debug, Deserialize)]
struct TranslateData {
    #[serde(default)]
    translations: Vec<Translation>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Translation {
    translated_text: String,
    detected_source_language: Option<String>,
}

/// Client for a Translate v2 style endpoint.
pub struct HttpTranslator {
    client: Client,
    endpoint: String,
    api_key: String,
    timeout: Duration,
}

impl HttpTranslator {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            timeout,
        })
    }

    pub fn from_config(config: &TranslationConfig) -> Result<Self> {
        Self::new(&config.endpoint, &config.api_key, config.timeout())
    }
}

#[async_trait]
impl Translator for HttpTranslator {
    async fn translate(&self, text: &str, target_language: &str) -> Result<String> {
        if text.trim().is_empty() {
            return Ok(text.to_string());
        }

        // format=text keeps the service from HTML-escaping quotes and ampersands
        let payload = json!({ "q": text, "target": target_language, "format": "text" });

        tracing::debug!("Making translation request to: {}", self.endpoint);
        let response = self
            .client
            .post(&self.endpoint)
            .query(&[("key", self.api_key.as_str())])
            .json(&payload)
            .send()
            .await
            .map_err(|e| transport_error(e, ScanStage::Translating, self.timeout))?;

        let parsed: TranslateResponse =
            read_json(response, ScanStage::Translating, self.timeout).await?;

        let translation = parsed
            .data
            .translations
            .into_iter()
            .next()
            .ok_or_else(|| ScanError::Service {
                code: 200,
                message: "translation response contained no translations".to_string(),
            })?;

        if let Some(source) = &translation.detected_source_language {
            tracing::debug!("Detected label language: {}", source);
        }

        Ok(translation.translated_text)
    }
}
