pub mod auth;

pub use auth::{ApiKeyInfo, ErrorResponse, require_api_key_from_headers};
