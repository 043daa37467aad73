use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::Row;

use super::AppState;
use crate::middleware::ErrorResponse;

#[derive(Debug, Serialize)]
pub struct CardResponse {
    pub card_id: String,
    pub title: String,
    pub summary: String,
    pub risk_level: String,
    pub risk_score: i16,
    pub scam_type: Option<String>,
    pub card_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub share_count: i32,
    pub view_count: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ShareResponse {
    pub card_id: String,
    pub share_count: i32,
}

/// Get public scam card data (no auth required). Each fetch counts as
/// a view.
pub async fn get_card(
    State(state): State<AppState>,
    Path(short_id): Path<String>,
) -> Result<Json<CardResponse>, (StatusCode, Json<ErrorResponse>)> {
    let row = sqlx::query(
        r#"
        UPDATE scam_cards
        SET view_count = view_count + 1
        WHERE short_id = $1
        RETURNING short_id, title, summary, risk_level, risk_score, scam_type,
                  image_url, share_count, view_count, created_at
        "#,
    )
    .bind(&short_id)
    .fetch_optional(&state.db)
    .await
    .map_err(|e| {
        tracing::error!("failed to fetch card {}: {}", short_id, e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::new("Failed to fetch card", "DB_ERROR")),
        )
    })?;

    let Some(row) = row else {
        return Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new("Card not found", "CARD_NOT_FOUND")),
        ));
    };

    let card_id: String = row.get("short_id");
    Ok(Json(CardResponse {
        card_url: format!("{}/card/{}", state.config.public_base_url, card_id),
        card_id,
        title: row.get("title"),
        summary: row.get("summary"),
        risk_level: row.get("risk_level"),
        risk_score: row.get("risk_score"),
        scam_type: row.get("scam_type"),
        image_url: row.get("image_url"),
        share_count: row.get("share_count"),
        view_count: row.get("view_count"),
        created_at: row.get("created_at"),
    }))
}

/// Record a share of a card (no auth required).
pub async fn share_card(
    State(state): State<AppState>,
    Path(short_id): Path<String>,
) -> Result<Json<ShareResponse>, (StatusCode, Json<ErrorResponse>)> {
    let row = sqlx::query(
        r#"
        UPDATE scam_cards
        SET share_count = share_count + 1
        WHERE short_id = $1
        RETURNING short_id, share_count
        "#,
    )
    .bind(&short_id)
    .fetch_optional(&state.db)
    .await
    .map_err(|e| {
        tracing::error!("failed to record share for card {}: {}", short_id, e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::new("Failed to record share", "DB_ERROR")),
        )
    })?;

    match row {
        Some(row) => Ok(Json(ShareResponse {
            card_id: row.get("short_id"),
            share_count: row.get("share_count"),
        })),
        None => Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new("Card not found", "CARD_NOT_FOUND")),
        )),
    }
}
