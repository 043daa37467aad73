use axum::{
    Router,
    routing::{get, post},
};

use super::AppState;
use super::{card, scan};

/// V1 API routes
///
/// ## Scan Routes (API Key Required)
/// - POST /scan - Scan text content for scam indicators
/// - POST /scan/image - Scan an image (OCR + analysis)
/// - GET  /scan/{scan_id} - Retrieve a previous scan result
///
/// ## Public Card Routes (no auth required)
/// - GET  /card/{short_id} - Get a shareable scam card (counts the view)
/// - POST /card/{short_id}/share - Record a share of the card
pub fn v1_routes() -> Router<AppState> {
    Router::new()
        // ========================================
        // Scans: API key auth
        // ========================================
        .route("/scan", post(scan::create_scan))
        .route("/scan/image", post(scan::create_image_scan))
        .route("/scan/{scan_id}", get(scan::get_scan))
        // ========================================
        // Public: shareable cards
        // ========================================
        .route("/card/{short_id}", get(card::get_card))
        .route("/card/{short_id}/share", post(card::share_card))
}
