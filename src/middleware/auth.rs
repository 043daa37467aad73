use axum::{
    Json,
    http::{HeaderMap, StatusCode},
};
use serde::Serialize;
use sqlx::PgPool;

use crate::utils::hash_api_key;

#[derive(Debug, Clone)]
pub struct ApiKeyInfo {
    pub id: uuid::Uuid,
    pub plan: String,
}

#[derive(Serialize, Clone)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: code.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

async fn validate_api_key(pool: &PgPool, api_key: &str) -> Result<ApiKeyInfo, String> {
    let key_hash = hash_api_key(api_key);

    let result = sqlx::query(
        r#"
        SELECT ak.id, ak.plan
        FROM api_keys ak
        WHERE ak.key_hash = $1
          AND (ak.expires_at IS NULL OR ak.expires_at > NOW())
          AND ak.revoked_at IS NULL
        "#,
    )
    .bind(&key_hash)
    .fetch_optional(pool)
    .await;

    match result {
        Ok(Some(row)) => {
            use sqlx::Row;
            Ok(ApiKeyInfo {
                id: row.get("id"),
                plan: row
                    .get::<Option<String>, _>("plan")
                    .unwrap_or_else(|| "free".to_string()),
            })
        }
        Ok(None) => Err("Invalid API key".to_string()),
        Err(e) => Err(format!("Database error: {}", e)),
    }
}

/// Authenticate a request via the `x-api-key` header (or a Bearer
/// token). Every scan endpoint requires this; card endpoints are public.
pub async fn require_api_key_from_headers(
    db: &PgPool,
    headers: &HeaderMap,
) -> Result<ApiKeyInfo, (StatusCode, Json<ErrorResponse>)> {
    let api_key = headers
        .get("x-api-key")
        .and_then(|v| v.to_str().ok())
        .or_else(|| {
            headers
                .get(axum::http::header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.strip_prefix("Bearer "))
        });

    let Some(api_key) = api_key else {
        return Err((
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse::new("API key required", "MISSING_API_KEY")),
        ));
    };

    validate_api_key(db, api_key).await.map_err(|e| {
        (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse::new(e, "INVALID_API_KEY")),
        )
    })
}
