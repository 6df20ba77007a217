use std::time::Duration;

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use log::{info, error};
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;

use crate::models::ErrorResponse;

#[derive(Debug, Error)]
pub enum KeyRegistryError {
    #[error("No key registry is configured")]
    NotConfigured,

    #[error("Invalid key id: {0}")]
    InvalidKeyId(String),

    #[error("Unknown key: {0}")]
    UnknownKey(String),

    #[error("Key registry timed out: {0}")]
    Timeout(String),

    #[error("Key registry unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid key registry response: {0}")]
    InvalidResponse(String),
}

impl ResponseError for KeyRegistryError {
    fn status_code(&self) -> StatusCode {
        match self {
            KeyRegistryError::NotConfigured => StatusCode::SERVICE_UNAVAILABLE,
            KeyRegistryError::InvalidKeyId(_) => StatusCode::BAD_REQUEST,
            KeyRegistryError::UnknownKey(_) => StatusCode::NOT_FOUND,
            KeyRegistryError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            KeyRegistryError::Unavailable(_) | KeyRegistryError::InvalidResponse(_) => StatusCode::BAD_GATEWAY,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorResponse {
            code: "KEY_REGISTRY_ERROR".to_string(),
            message: self.to_string(),
            details: None,
        })
    }
}

#[derive(Deserialize)]
struct RegistryKey {
    public_key: String,
}

/// Client for an external registry of verifier public keys.
///
/// Requests carry a hard timeout and are never retried.
#[derive(Clone)]
pub struct KeyRegistryClient {
    base_url: String,
    client: Client,
}

impl KeyRegistryClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, KeyRegistryError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| KeyRegistryError::Unavailable(e.to_string()))?;

        let base_url = base_url.trim_end_matches('/').to_string();
        info!("Key registry client using {} with {:?} timeout", base_url, timeout);
        Ok(Self { base_url, client })
    }

    fn key_url(&self, key_id: &str) -> Result<String, KeyRegistryError> {
        let valid = !key_id.is_empty()
            && key_id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.');
        if !valid || key_id.starts_with('.') {
            return Err(KeyRegistryError::InvalidKeyId(key_id.to_string()));
        }
        Ok(format!("{}/keys/{}", self.base_url, key_id))
    }

    /// Fetches the base64 public key registered under `key_id`.
    pub async fn fetch_public_key(&self, key_id: &str) -> Result<String, KeyRegistryError> {
        let url = self.key_url(key_id)?;
        info!("Fetching public key {} from registry", key_id);

        let response = self.client.get(&url).send().await.map_err(|e| {
            error!("Key registry request for {} failed: {:?}", key_id, e);
            if e.is_timeout() {
                KeyRegistryError::Timeout(e.to_string())
            } else {
                KeyRegistryError::Unavailable(e.to_string())
            }
        })?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(KeyRegistryError::UnknownKey(key_id.to_string()));
        }
        if !response.status().is_success() {
            let message = format!("HTTP {}", response.status());
            error!("Key registry returned {} for key {}", message, key_id);
            return Err(KeyRegistryError::Unavailable(message));
        }

        let key = response.json::<RegistryKey>().await.map_err(|e| {
            if e.is_timeout() {
                KeyRegistryError::Timeout(e.to_string())
            } else {
                KeyRegistryError::InvalidResponse(e.to_string())
            }
        })?;
        Ok(key.public_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> KeyRegistryClient {
        KeyRegistryClient::new("http://registry.internal/", Duration::from_millis(250)).unwrap()
    }

    #[test]
    fn test_key_url_strips_trailing_slash() {
        assert_eq!(client().key_url("auditor-2024.v1").unwrap(), "http://registry.internal/keys/auditor-2024.v1");
    }

    #[test]
    fn test_key_url_rejects_path_tricks() {
        for key_id in ["", "../admin", "a/b", ".hidden", "key?x=1"] {
            assert!(matches!(client().key_url(key_id), Err(KeyRegistryError::InvalidKeyId(_))));
        }
    }

    #[tokio::test]
    async fn test_unreachable_registry_fails_without_retry() {
        // Port 9 (discard) on localhost is closed in test environments.
        let client = KeyRegistryClient::new("http://127.0.0.1:9", Duration::from_millis(500)).unwrap();
        let err = client.fetch_public_key("k1").await.unwrap_err();
        assert!(matches!(err, KeyRegistryError::Unavailable(_) | KeyRegistryError::Timeout(_)));
    }

    #[test]
    fn test_error_status_codes() {
        assert_eq!(KeyRegistryError::Timeout("t".into()).status_code(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(KeyRegistryError::UnknownKey("k".into()).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(KeyRegistryError::NotConfigured.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
