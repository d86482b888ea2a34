use async_trait::async_trait;
use std::time::Duration;

use crate::domain::{DomainError, ProviderErrorKind};

/// Status and decoded body of a JSON call. Non-2xx statuses are not errors
/// at this level; the caller classifies them.
#[derive(Debug, Clone)]
pub struct JsonResponse {
    pub status: u16,
    pub body: serde_json::Value,
}

impl JsonResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Trait for HTTP client operations (for mocking)
#[async_trait]
pub trait HttpClientTrait: Send + Sync + std::fmt::Debug {
    async fn post_json(
        &self,
        url: &str,
        headers: Vec<(&str, &str)>,
        body: &serde_json::Value,
    ) -> Result<JsonResponse, DomainError>;
}

#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
}

impl HttpClient {
    pub fn with_timeout(timeout: Duration) -> Result<Self, DomainError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DomainError::configuration(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl HttpClientTrait for HttpClient {
    async fn post_json(
        &self,
        url: &str,
        headers: Vec<(&str, &str)>,
        body: &serde_json::Value,
    ) -> Result<JsonResponse, DomainError> {
        let mut request = self.client.post(url);

        for (key, value) in headers {
            request = request.header(key, value);
        }

        let response = request.json(body).send().await.map_err(|e| {
            let detail = if e.is_timeout() {
                format!("Request timed out: {}", e)
            } else {
                format!("Request failed: {}", e)
            };
            DomainError::provider(ProviderErrorKind::Generic, detail)
        })?;

        let status = response.status().as_u16();
        let text = response.text().await.map_err(|e| {
            DomainError::provider(
                ProviderErrorKind::Generic,
                format!("Failed to read response: {}", e),
            )
        })?;

        // Error pages are not always JSON; keep the raw text for the log
        let body = serde_json::from_str(&text).unwrap_or(serde_json::Value::String(text));

        Ok(JsonResponse { status, body })
    }
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::RwLock;

    #[derive(Debug, Default)]
    pub struct MockHttpClient {
        responses: RwLock<HashMap<String, JsonResponse>>,
        errors: RwLock<HashMap<String, String>>,
        bodies: RwLock<Vec<serde_json::Value>>,
    }

    impl MockHttpClient {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_response(self, url: impl Into<String>, response: serde_json::Value) -> Self {
            self.with_status(url, 200, response)
        }

        pub fn with_status(
            self,
            url: impl Into<String>,
            status: u16,
            body: serde_json::Value,
        ) -> Self {
            self.responses
                .write()
                .unwrap()
                .insert(url.into(), JsonResponse { status, body });
            self
        }

        pub fn with_error(self, url: impl Into<String>, error: impl Into<String>) -> Self {
            self.errors.write().unwrap().insert(url.into(), error.into());
            self
        }

        pub fn sent_bodies(&self) -> Vec<serde_json::Value> {
            self.bodies.read().unwrap().clone()
        }
    }

    #[async_trait]
    impl HttpClientTrait for MockHttpClient {
        async fn post_json(
            &self,
            url: &str,
            _headers: Vec<(&str, &str)>,
            body: &serde_json::Value,
        ) -> Result<JsonResponse, DomainError> {
            self.bodies.write().unwrap().push(body.clone());

            if let Some(error) = self.errors.read().unwrap().get(url) {
                return Err(DomainError::provider(ProviderErrorKind::Generic, error.clone()));
            }

            self.responses.read().unwrap().get(url).cloned().ok_or_else(|| {
                DomainError::provider(
                    ProviderErrorKind::Generic,
                    format!("No mock response for {}", url),
                )
            })
        }
    }
}
