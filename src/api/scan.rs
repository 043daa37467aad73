use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
};
use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use super::AppState;
use crate::middleware::{ErrorResponse, require_api_key_from_headers};
use crate::models::taxonomy::{Channel, ContentType, ScanCategory};
use crate::services::ServiceError;
use crate::services::scan_service::{ScanResult, TextScanInput};

// ============================================
// Constants
// ============================================

/// Maximum decoded image size
const MAX_IMAGE_SIZE_BYTES: usize = 10 * 1024 * 1024;

const SUPPORTED_IMAGE_TYPES: [&str; 4] = ["image/jpeg", "image/png", "image/webp", "image/gif"];

// ============================================
// Request Types
// ============================================

#[derive(Debug, Deserialize, Validate)]
pub struct ScanRequest {
    /// Content to scan, capped at 10k chars
    #[validate(length(min = 1, max = 10000))]
    pub content: String,
    #[serde(default)]
    pub channel: Option<Channel>,
    #[serde(default)]
    pub category: ScanCategory,
    #[serde(default = "default_locale")]
    pub locale: String,
}

#[derive(Debug, Deserialize)]
pub struct ImageScanRequest {
    /// Base64-encoded image bytes
    pub image_base64: String,
    #[serde(default = "default_image_type")]
    pub content_type: String,
    #[serde(default)]
    pub channel: Option<Channel>,
    #[serde(default)]
    pub category: ScanCategory,
    #[serde(default = "default_locale")]
    pub locale: String,
}

fn default_locale() -> String {
    "en".to_string()
}
fn default_image_type() -> String {
    "image/jpeg".to_string()
}

// ============================================
// Handlers
// ============================================

/// Scan text content for scam indicators
///
/// **Auth: API Key Required**
pub async fn create_scan(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<ScanRequest>,
) -> Result<Json<ScanResult>, (StatusCode, Json<ErrorResponse>)> {
    let api_key = require_api_key_from_headers(&state.db, &headers).await?;

    req.validate().map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            Json(
                ErrorResponse::new("Invalid scan request", "VALIDATION_FAILED")
                    .with_details(e.to_string()),
            ),
        )
    })?;

    tracing::info!(api_key_id = %api_key.id, content_len = req.content.len(), "text scan started");

    let result = state
        .scans
        .scan_text(TextScanInput {
            content: req.content,
            content_type: ContentType::Text,
            channel: req.channel,
            category: req.category,
            locale: req.locale,
            api_key_id: api_key.id,
        })
        .await
        .map_err(service_error)?;

    Ok(Json(result))
}

/// Scan an image for scam indicators (OCR + analysis)
///
/// **Auth: API Key Required**
pub async fn create_image_scan(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<ImageScanRequest>,
) -> Result<Json<ScanResult>, (StatusCode, Json<ErrorResponse>)> {
    let api_key = require_api_key_from_headers(&state.db, &headers).await?;

    if !SUPPORTED_IMAGE_TYPES.contains(&req.content_type.as_str()) {
        return Err((
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Json(ErrorResponse::new(
                format!(
                    "Unsupported image type: {}. Supported: {}",
                    req.content_type,
                    SUPPORTED_IMAGE_TYPES.join(", ")
                ),
                "UNSUPPORTED_MEDIA_TYPE",
            )),
        ));
    }

    let image = BASE64.decode(req.image_base64.as_bytes()).map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            Json(
                ErrorResponse::new("Image payload is not valid base64", "INVALID_IMAGE_ENCODING")
                    .with_details(e.to_string()),
            ),
        )
    })?;

    if image.len() > MAX_IMAGE_SIZE_BYTES {
        return Err((
            StatusCode::PAYLOAD_TOO_LARGE,
            Json(ErrorResponse::new(
                format!("Image exceeds {}MB limit", MAX_IMAGE_SIZE_BYTES / (1024 * 1024)),
                "PAYLOAD_TOO_LARGE",
            )),
        ));
    }

    tracing::info!(api_key_id = %api_key.id, image_bytes = image.len(), "image scan started");

    let result = state
        .scans
        .scan_image(&image, req.channel, req.category, req.locale, api_key.id)
        .await
        .map_err(service_error)?;

    Ok(Json(result))
}

/// Retrieve a previous scan result
///
/// **Auth: API Key Required** - scans are only visible to the key that
/// created them.
pub async fn get_scan(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(scan_id): Path<Uuid>,
) -> Result<Json<ScanResult>, (StatusCode, Json<ErrorResponse>)> {
    let api_key = require_api_key_from_headers(&state.db, &headers).await?;

    let result = state
        .scans
        .get_scan(scan_id, api_key.id)
        .await
        .map_err(service_error)?;

    match result {
        Some(result) => Ok(Json(result)),
        None => Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new("Scan not found", "SCAN_NOT_FOUND")),
        )),
    }
}

fn service_error(e: ServiceError) -> (StatusCode, Json<ErrorResponse>) {
    match e {
        ServiceError::Database(e) => {
            tracing::error!("scan persistence failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new("Failed to save scan", "DB_ERROR")),
            )
        }
        ServiceError::Ocr(msg) => (
            StatusCode::BAD_GATEWAY,
            Json(ErrorResponse::new("Could not extract text from image", "OCR_FAILED").with_details(msg)),
        ),
    }
}
