//! Infrastructure layer - storage backends, external services and application services

pub mod archive;
pub mod auth;
pub mod generation;
pub mod llm;
pub mod logging;
pub mod note;
pub mod observability;
pub mod rate_limit;
pub mod session;
pub mod storage;
pub mod template;
pub mod usage;
pub mod user;
