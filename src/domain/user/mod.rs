//! User domain
//!
//! User entities carrying billing state, validation, and the repository trait.

mod entity;
mod repository;
mod validation;

pub use entity::{User, UserId};
pub use repository::UserRepository;
pub use validation::{
    normalize_email, validate_email, validate_password, validate_username, UserValidationError,
};

/// Message used whenever a credit charge would overdraw the balance
pub const INSUFFICIENT_CREDITS: &str = "Insufficient credits";
