use crate::adapters::http::{build_client, read_json, transport_error};
use crate::config::toml_config::OcrConfig;
use crate::domain::model::{ImageHandle, ScanStage};
use crate::domain::ports::TextExtractor;
use crate::utils::error::{Result, ScanError};
use async_trait::async_trait;
use base64::Engine as _;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct AnnotateResponse {
    #[serde(default)]
    responses: Vec<AnnotateImageResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnnotateImageResponse {
    full_text_annotation: Option<FullTextAnnotation>,
    error: Option<RemoteStatus>,
}

#[derive(Debug, Deserialize)]
struct FullTextAnnotation {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct RemoteStatus {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
}

/// Text detection over an `images:annotate` style endpoint.
pub struct VisionTextExtractor {
    client: Client,
    endpoint: String,
    api_key: String,
    timeout: Duration,
}

impl VisionTextExtractor {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            timeout,
        })
    }

    pub fn from_config(config: &OcrConfig) -> Result<Self> {
        Self::new(&config.endpoint, &config.api_key, config.timeout())
    }
}

#[async_trait]
impl TextExtractor for VisionTextExtractor {
    async fn extract_text(&self, image: &ImageHandle) -> Result<String> {
        let content = base64::engine::general_purpose::STANDARD.encode(&image.bytes);
        let payload = json!({
            "requests": [{
                "image": { "content": content },
                "features": [{ "type": "TEXT_DETECTION" }],
            }]
        });

        tracing::debug!(
            "Making OCR request to: {} ({} base64 chars)",
            self.endpoint,
            content.len()
        );
        let response = self
            .client
            .post(&self.endpoint)
            .query(&[("key", self.api_key.as_str())])
            .json(&payload)
            .send()
            .await
            .map_err(|e| transport_error(e, ScanStage::Extracting, self.timeout))?;

        tracing::debug!("OCR response status: {}", response.status());
        let parsed: AnnotateResponse =
            read_json(response, ScanStage::Extracting, self.timeout).await?;

        let Some(first) = parsed.responses.into_iter().next() else {
            return Ok(String::new());
        };

        if let Some(status) = first.error {
            return Err(ScanError::Service {
                code: u16::try_from(status.code).unwrap_or(0),
                message: status.message,
            });
        }

        Ok(first
            .full_text_annotation
            .map(|annotation| annotation.text)
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn image() -> ImageHandle {
        ImageHandle::new("label.jpg", b"jpeg-bytes".to_vec())
    }

    #[tokio::test]
    async fn test_extracts_full_text_annotation() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/v1/images:annotate")
                .query_param("key", "vision-key")
                .body_contains("TEXT_DETECTION")
                .body_contains("anBlZy1ieXRlcw==");
            then.status(200).json_body(serde_json::json!({
                "responses": [{
                    "textAnnotations": [{ "description": "ignored" }],
                    "fullTextAnnotation": { "text": "Contains: Peanuts, Soy Lecithin" }
                }]
            }));
        });

        let extractor = VisionTextExtractor::new(
            server.url("/v1/images:annotate"),
            "vision-key",
            Duration::from_secs(5),
        )
        .unwrap();

        let text = extractor.extract_text(&image()).await.unwrap();
        mock.assert();
        assert_eq!(text, "Contains: Peanuts, Soy Lecithin");
    }

    #[tokio::test]
    async fn test_no_text_detected_is_empty() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/annotate");
            then.status(200).json_body(serde_json::json!({ "responses": [{}] }));
        });

        let extractor =
            VisionTextExtractor::new(server.url("/annotate"), "k", Duration::from_secs(5)).unwrap();
        assert_eq!(extractor.extract_text(&image()).await.unwrap(), "");
    }

    #[tokio::test]
    async fn test_http_error_carries_status_and_message() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/annotate");
            then.status(403).json_body(serde_json::json!({
                "error": { "code": 403, "message": "API key not valid", "status": "PERMISSION_DENIED" }
            }));
        });

        let extractor =
            VisionTextExtractor::new(server.url("/annotate"), "bad", Duration::from_secs(5)).unwrap();
        match extractor.extract_text(&image()).await {
            Err(ScanError::Service { code, message }) => {
                assert_eq!(code, 403);
                assert_eq!(message, "API key not valid");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_per_image_error_is_service_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/annotate");
            then.status(200).json_body(serde_json::json!({
                "responses": [{ "error": { "code": 3, "message": "Bad image data." } }]
            }));
        });

        let extractor =
            VisionTextExtractor::new(server.url("/annotate"), "k", Duration::from_secs(5)).unwrap();
        assert!(matches!(
            extractor.extract_text(&image()).await,
            Err(ScanError::Service { code: 3, .. })
        ));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_network_error() {
        let extractor = VisionTextExtractor::new(
            "http://127.0.0.1:1/annotate",
            "SECRET-VISION-KEY",
            Duration::from_secs(5),
        )
        .unwrap();
        let err = extractor.extract_text(&image()).await.unwrap_err();
        assert!(matches!(err, ScanError::Network { .. }));

        // The key travels in the query string and must not leak into logs.
        assert!(!err.to_string().contains("SECRET-VISION-KEY"));
        assert!(!format!("{:?}", err).contains("SECRET-VISION-KEY"));
    }
}
