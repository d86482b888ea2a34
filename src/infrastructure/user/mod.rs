//! User persistence, password hashing and profile operations

mod password;
mod postgres_repository;
mod repository;
mod service;

pub use password::{Argon2Hasher, PasswordHasher};
pub use postgres_repository::PostgresUserRepository;
pub use repository::InMemoryUserRepository;
pub use service::{UpdateProfileRequest, UsageSummary, UserProfile, UserService};
