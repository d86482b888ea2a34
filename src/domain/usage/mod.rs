//! Usage tracking domain

mod record;
mod repository;

pub use record::{evaluate_usage_limit, UsageCheck, UsageRecord};
pub use repository::UsageRepository;
