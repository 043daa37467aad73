use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Shareable public summary of a risky scan. At most one per scan;
/// `short_id` is the public identifier used in card URLs.
#[allow(dead_code)]
#[derive(Debug, Serialize, Deserialize)]
pub struct ScamCard {
    pub id: Uuid,
    pub scan_id: Uuid,
    pub short_id: String,
    pub title: String,
    pub summary: String,
    pub risk_level: String,
    pub risk_score: i16,
    pub scam_type: Option<String>,
    pub image_url: Option<String>,
    pub share_count: i32,
    pub view_count: i32,
    pub created_at: DateTime<Utc>,
}
