use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How much evidence detail a caller is shown. Driven by the abuse
/// score, which an external periodic job maintains - this service only
/// ever reads it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseLevel {
    Full,
    Reduced,
    Minimal,
    Throttled,
}

impl ResponseLevel {
    #[allow(dead_code)]
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseLevel::Full => "full",
            ResponseLevel::Reduced => "reduced",
            ResponseLevel::Minimal => "minimal",
            ResponseLevel::Throttled => "throttled",
        }
    }

    /// Unrecognized stored values degrade to `Full` rather than erroring;
    /// shaping is a soft control, not an access check.
    pub fn parse_or_full(s: &str) -> Self {
        match s {
            "reduced" => ResponseLevel::Reduced,
            "minimal" => ResponseLevel::Minimal,
            "throttled" => ResponseLevel::Throttled,
            _ => ResponseLevel::Full,
        }
    }
}

/// Per-caller abuse score row, read-only to the scan pipeline.
#[allow(dead_code)]
#[derive(Debug, Serialize, Deserialize)]
pub struct AbuseScore {
    pub api_key_id: Uuid,
    pub score: i16,
    pub scan_count_1h: i32,
    pub flagged_ratio: f32,
    pub similarity_ratio: f32,
    pub entity_reuse_ratio: f32,
    pub response_level: String,
    pub is_flagged: bool,
    pub updated_at: DateTime<Utc>,
}
