use async_trait::async_trait;
use std::fmt::Debug;

use super::{LlmRequest, LlmResponse};
use crate::domain::DomainError;

/// A chat-completion backend
#[async_trait]
pub trait LlmProvider: Send + Sync + Debug {
    async fn chat(&self, model: &str, request: LlmRequest) -> Result<LlmResponse, DomainError>;

    fn provider_name(&self) -> &'static str;
}

#[cfg(test)]
pub mod mock {
    use std::sync::Mutex;

    use super::*;
    use crate::domain::error::ProviderErrorKind;
    use crate::domain::llm::{Message, Usage};

    #[derive(Debug)]
    pub struct MockLlmProvider {
        response: Option<LlmResponse>,
        error: Option<(ProviderErrorKind, String)>,
        requests: Mutex<Vec<LlmRequest>>,
    }

    impl MockLlmProvider {
        pub fn new() -> Self {
            Self {
                response: None,
                error: None,
                requests: Mutex::new(Vec::new()),
            }
        }

        /// Reply with `content` and a fixed token count
        pub fn replying(content: &str, total_tokens: u32) -> Self {
            Self::new().with_response(
                LlmResponse::new("mock-1", "mock-model", Message::assistant(content))
                    .with_usage(Usage::new(total_tokens / 2, total_tokens - total_tokens / 2)),
            )
        }

        pub fn with_response(mut self, response: LlmResponse) -> Self {
            self.response = Some(response);
            self
        }

        pub fn with_error(mut self, kind: ProviderErrorKind, message: impl Into<String>) -> Self {
            self.error = Some((kind, message.into()));
            self
        }

        pub fn requests(&self) -> Vec<LlmRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl LlmProvider for MockLlmProvider {
        async fn chat(
            &self,
            _model: &str,
            request: LlmRequest,
        ) -> Result<LlmResponse, DomainError> {
            self.requests.lock().unwrap().push(request);

            if let Some((kind, ref message)) = self.error {
                return Err(DomainError::provider(kind, message.clone()));
            }

            self.response
                .clone()
                .ok_or_else(|| DomainError::internal("No mock response configured"))
        }

        fn provider_name(&self) -> &'static str {
            "mock"
        }
    }
}
