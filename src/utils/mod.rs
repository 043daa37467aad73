// Utility functions

use sha2::{Digest, Sha256};

pub mod url;

/// Hash an API key for storage
pub fn hash_api_key(key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    hex::encode(hasher.finalize())
}

/// Generate a new API key
#[allow(dead_code)]
pub fn generate_api_key() -> (String, String) {
    let key = format!("stk_{}", uuid::Uuid::new_v4().to_string().replace("-", ""));
    let prefix = key[..12].to_string();
    (key, prefix)
}

/// Hash scanned content for dedup and audit without retaining the raw text
pub fn hash_content(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}
