use crate::domain::model::ScanStage;
use crate::utils::error::{Result, ScanError};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

pub(crate) fn build_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| ScanError::ConfigValidationError {
            field: "http_client".to_string(),
            message: e.to_string(),
        })
}

pub(crate) fn transport_error(err: reqwest::Error, stage: ScanStage, timeout: Duration) -> ScanError {
    if err.is_timeout() {
        ScanError::Timeout {
            stage,
            timeout,
        }
    } else {
        ScanError::network(err)
    }
}

/// Turns a non-2xx response into a service error, preferring the JSON
/// `error.message` the Google APIs return over the raw body.
pub(crate) async fn service_error(response: Response) -> ScanError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();

    let message = match serde_json::from_str::<ErrorEnvelope>(&body) {
        Ok(envelope) if !envelope.error.message.is_empty() => envelope.error.message,
        _ if !body.trim().is_empty() => body.trim().to_string(),
        _ => status
            .canonical_reason()
            .unwrap_or("unknown error")
            .to_string(),
    };

    ScanError::Service {
        code: status.as_u16(),
        message,
    }
}

pub(crate) async fn read_json<T: DeserializeOwned>(
    response: Response,
    stage: ScanStage,
    timeout: Duration,
) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        return Err(service_error(response).await);
    }

    let body = response
        .bytes()
        .await
        .map_err(|e| transport_error(e, stage, timeout))?;

    serde_json::from_slice(&body).map_err(|e| ScanError::Service {
        code: status.as_u16(),
        message: format!("unexpected response body: {}", e),
    })
}
