//! Domain layer - entities, policies and repository traits

pub mod archive;
pub mod billing;
pub mod calendar;
pub mod error;
pub mod generation;
pub mod listing;
pub mod llm;
pub mod note;
pub mod rate_limit;
pub mod sanitize;
pub mod session;
pub mod template;
pub mod tier;
pub mod usage;
pub mod user;

pub use error::{DomainError, ProviderErrorKind};
pub use llm::{LlmProvider, LlmRequest, LlmResponse, Message};
pub use tier::{LimitsTable, Tier, TierLimits};
pub use user::{User, UserId};
