//! Response envelopes and request extractors

pub mod error;
pub mod json;
pub mod response;

pub use error::{ApiError, ApiErrorBody, ErrorCode};
pub use json::Json;
pub use response::{ApiResponse, Created};
