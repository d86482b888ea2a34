//! Template domain: reusable email patterns and their creation quota

mod entity;
mod policy;
mod repository;

pub use entity::{Template, TemplateUpdate};
pub use policy::{can_create_template, TemplateDecision, TemplateQuota, TemplateTier};
pub use repository::TemplateRepository;

/// Conflict message when an archive has already been promoted
pub const ALREADY_CONVERTED: &str = "This archive has already been converted to a template";
