//! OpenAI chat-completions client

mod http_client;
mod openai;

pub use http_client::{HttpClient, HttpClientTrait, JsonResponse};
pub use openai::{classify_openai_error, OpenAiProvider, DEFAULT_OPENAI_BASE_URL};
