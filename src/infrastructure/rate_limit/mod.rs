//! Guest rate-limit stores

mod in_memory;
mod redis;

pub use in_memory::InMemoryRateLimitStore;
pub use self::redis::RedisRateLimitStore;
