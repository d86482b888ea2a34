use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::http_client::{HttpClientTrait, JsonResponse};
use crate::domain::llm::{FinishReason, Message, MessageRole, Usage};
use crate::domain::{DomainError, LlmProvider, LlmRequest, LlmResponse, ProviderErrorKind};

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com";

/// OpenAI API provider
#[derive(Debug)]
pub struct OpenAiProvider<C: HttpClientTrait> {
    client: C,
    auth_header: String,
    base_url: String,
}

impl<C: HttpClientTrait> OpenAiProvider<C> {
    pub fn new(client: C, api_key: impl Into<String>) -> Self {
        Self::with_base_url(client, api_key, DEFAULT_OPENAI_BASE_URL)
    }

    pub fn with_base_url(
        client: C,
        api_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            client,
            auth_header: format!("Bearer {}", api_key.into()),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn chat_completions_url(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url)
    }

    fn build_request(&self, model: &str, request: &LlmRequest) -> serde_json::Value {
        let messages: Vec<OpenAiMessage> =
            request.messages.iter().map(OpenAiMessage::from_domain).collect();

        let mut body = serde_json::json!({
            "model": model,
            "messages": messages,
        });

        if let Some(temp) = request.temperature {
            body["temperature"] = serde_json::json!(temp);
        }

        if let Some(max_tokens) = request.max_tokens {
            body["max_tokens"] = serde_json::json!(max_tokens);
        }

        if let Some(top_p) = request.top_p {
            body["top_p"] = serde_json::json!(top_p);
        }

        body
    }

    fn headers(&self) -> Vec<(&str, &str)> {
        vec![
            ("Authorization", self.auth_header.as_str()),
            ("Content-Type", "application/json"),
        ]
    }

    fn parse_response(&self, json: serde_json::Value) -> Result<LlmResponse, DomainError> {
        let response: OpenAiResponse = serde_json::from_value(json).map_err(|e| {
            DomainError::provider(
                ProviderErrorKind::Generic,
                format!("Failed to parse response: {}", e),
            )
        })?;

        let choice = response.choices.into_iter().next().ok_or_else(|| {
            DomainError::provider(ProviderErrorKind::Generic, "No choices in response")
        })?;

        let message = Message::assistant(choice.message.content.unwrap_or_default());
        let mut llm_response = LlmResponse::new(response.id, response.model, message);

        if let Some(reason) = choice.finish_reason {
            llm_response = llm_response.with_finish_reason(parse_finish_reason(&reason));
        }

        if let Some(usage) = response.usage {
            llm_response =
                llm_response.with_usage(Usage::new(usage.prompt_tokens, usage.completion_tokens));
        }

        Ok(llm_response)
    }
}

#[async_trait]
impl<C: HttpClientTrait> LlmProvider for OpenAiProvider<C> {
    async fn chat(&self, model: &str, request: LlmRequest) -> Result<LlmResponse, DomainError> {
        let url = self.chat_completions_url();
        let body = self.build_request(model, &request);
        let response = self.client.post_json(&url, self.headers(), &body).await?;

        if !response.is_success() {
            let kind = classify_openai_error(&response);
            warn!(status = response.status, kind = ?kind, "OpenAI request failed");
            return Err(DomainError::provider(
                kind,
                format!("HTTP {}: {}", response.status, response.body),
            ));
        }

        self.parse_response(response.body)
    }

    fn provider_name(&self) -> &'static str {
        "openai"
    }
}

/// Map a failed response to a provider error kind, by `error.code` first and
/// HTTP status second
pub fn classify_openai_error(response: &JsonResponse) -> ProviderErrorKind {
    let code = response
        .body
        .get("error")
        .and_then(|e| e.get("code"))
        .and_then(|c| c.as_str());

    match (code, response.status) {
        (Some("insufficient_quota"), _) => ProviderErrorKind::QuotaExceeded,
        (Some("rate_limit_exceeded"), _) => ProviderErrorKind::RateLimited,
        (Some("invalid_api_key"), _) => ProviderErrorKind::InvalidCredential,
        (_, 429) => ProviderErrorKind::QuotaExceeded,
        (_, 401) => ProviderErrorKind::InvalidCredential,
        _ => ProviderErrorKind::Generic,
    }
}

fn parse_finish_reason(reason: &str) -> FinishReason {
    match reason {
        "length" => FinishReason::Length,
        "content_filter" => FinishReason::ContentFilter,
        _ => FinishReason::Stop,
    }
}

// OpenAI API types

#[derive(Debug, Serialize)]
struct OpenAiMessage<'a> {
    role: &'static str,
    content: &'a str,
}

impl<'a> OpenAiMessage<'a> {
    fn from_domain(message: &'a Message) -> Self {
        let role = match message.role {
            MessageRole::System => "system",
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        };

        Self {
            role,
            content: &message.content,
        }
    }
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    id: String,
    model: String,
    choices: Vec<OpenAiChoice>,
    usage: Option<OpenAiUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::llm::http_client::mock::MockHttpClient;
    use crate::infrastructure::llm::HttpClient;
    use std::time::Duration;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const TEST_URL: &str = "https://api.openai.com/v1/chat/completions";

    fn completion(content: &str) -> serde_json::Value {
        serde_json::json!({
            "id": "chatcmpl-123",
            "model": "gpt-4o-mini",
            "choices": [{
                "message": { "role": "assistant", "content": content },
                "finish_reason": "stop"
            }],
            "usage": { "prompt_tokens": 40, "completion_tokens": 25, "total_tokens": 65 }
        })
    }

    fn request() -> LlmRequest {
        LlmRequest::builder()
            .system("Respond in English.")
            .user("Polish this draft")
            .temperature(0.7)
            .top_p(0.9)
            .max_tokens(200)
            .build()
    }

    fn error_body(code: &str) -> serde_json::Value {
        serde_json::json!({ "error": { "message": "nope", "type": "x", "code": code } })
    }

    #[tokio::test]
    async fn test_chat_parses_completion() {
        let client = MockHttpClient::new().with_response(TEST_URL, completion("Dear Professor"));
        let provider = OpenAiProvider::new(client, "test-key");

        let response = provider.chat("gpt-4o-mini", request()).await.unwrap();

        assert_eq!(response.content(), "Dear Professor");
        assert_eq!(response.finish_reason, Some(FinishReason::Stop));
        assert_eq!(response.total_tokens(), 65);
    }

    #[tokio::test]
    async fn test_request_body_carries_sampling_parameters() {
        let client = MockHttpClient::new().with_response(TEST_URL, completion("ok"));
        let provider = OpenAiProvider::new(client, "test-key");
        provider.chat("gpt-4o-mini", request()).await.unwrap();

        let body = &provider.client.sent_bodies()[0];
        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["max_tokens"], 200);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "Polish this draft");
        assert!((body["temperature"].as_f64().unwrap() - 0.7).abs() < 1e-6);
        assert!((body["top_p"].as_f64().unwrap() - 0.9).abs() < 1e-6);
    }

    #[test]
    fn test_classification() {
        let cases = [
            (429, error_body("insufficient_quota"), ProviderErrorKind::QuotaExceeded),
            (429, error_body("rate_limit_exceeded"), ProviderErrorKind::RateLimited),
            (401, error_body("invalid_api_key"), ProviderErrorKind::InvalidCredential),
            (429, serde_json::Value::Null, ProviderErrorKind::QuotaExceeded),
            (401, serde_json::Value::Null, ProviderErrorKind::InvalidCredential),
            (500, error_body("server_error"), ProviderErrorKind::Generic),
            (502, serde_json::json!("Bad Gateway"), ProviderErrorKind::Generic),
        ];

        for (status, body, expected) in cases {
            assert_eq!(
                classify_openai_error(&JsonResponse { status, body }),
                expected,
                "status {}",
                status
            );
        }
    }

    #[tokio::test]
    async fn test_transport_error_is_generic() {
        let client = MockHttpClient::new().with_error(TEST_URL, "connection refused");
        let provider = OpenAiProvider::new(client, "test-key");

        match provider.chat("gpt-4o-mini", request()).await {
            Err(DomainError::Provider { kind, .. }) => assert_eq!(kind, ProviderErrorKind::Generic),
            other => panic!("expected provider error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_wiremock_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion("Hello")))
            .expect(1)
            .mount(&server)
            .await;

        let client = HttpClient::with_timeout(Duration::from_secs(5)).unwrap();
        let provider = OpenAiProvider::with_base_url(client, "sk-test", server.uri());

        let response = provider.chat("gpt-4o-mini", request()).await.unwrap();
        assert_eq!(response.content(), "Hello");
    }

    #[tokio::test]
    async fn test_wiremock_quota_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(429).set_body_json(error_body("insufficient_quota")))
            .mount(&server)
            .await;

        let client = HttpClient::with_timeout(Duration::from_secs(5)).unwrap();
        let provider = OpenAiProvider::with_base_url(client, "sk-test", server.uri());

        match provider.chat("gpt-4o-mini", request()).await {
            Err(DomainError::Provider { kind, .. }) => {
                assert_eq!(kind, ProviderErrorKind::QuotaExceeded)
            }
            other => panic!("expected provider error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_wiremock_timeout_is_generic() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(completion("late"))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let client = HttpClient::with_timeout(Duration::from_millis(50)).unwrap();
        let provider = OpenAiProvider::with_base_url(client, "sk-test", server.uri());

        match provider.chat("gpt-4o-mini", request()).await {
            Err(DomainError::Provider { kind, .. }) => assert_eq!(kind, ProviderErrorKind::Generic),
            other => panic!("expected provider error, got {:?}", other),
        }
    }
}
