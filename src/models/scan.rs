use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::taxonomy::{RiskLevel, ScamType};

/// A persisted scan. Immutable after creation - counters live on the
/// scam card, never here.
#[allow(dead_code)]
#[derive(Debug, Serialize, Deserialize)]
pub struct Scan {
    pub id: Uuid,
    pub api_key_id: Uuid,
    pub content_type: String,
    pub channel: Option<String>,
    pub category: String,
    pub locale: String,
    /// Raw content - auto-deleted by the external retention job once
    /// `content_expires_at` passes.
    pub raw_content: Option<String>,
    pub content_hash: String,
    pub risk_score: i16,
    pub risk_level: String,
    pub scam_type: Option<String>,
    pub explanation: Option<String>,
    pub evidence: serde_json::Value,
    pub actions: serde_json::Value,
    pub checks_performed: serde_json::Value,
    pub checks_not_available: serde_json::Value,
    pub confidence_note: Option<String>,
    pub processing_time_ms: i32,
    pub model_used: Option<String>,
    pub content_expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[allow(dead_code)]
#[derive(Debug, Serialize, Deserialize)]
pub struct ScanEntity {
    pub id: Uuid,
    pub scan_id: Uuid,
    pub entity_type: String,
    pub value: String,
    pub created_at: DateTime<Utc>,
}

#[allow(dead_code)]
#[derive(Debug, Serialize, Deserialize)]
pub struct ThreatResultRecord {
    pub id: Uuid,
    pub scan_id: Uuid,
    pub source: String,
    pub is_threat: bool,
    pub threat_type: Option<String>,
    pub confidence: f32,
    pub details: serde_json::Value,
    pub response_time_ms: i32,
    pub created_at: DateTime<Utc>,
}

// ============================================
// Pipeline Data Types
// ============================================

/// Entities extracted from scanned content. Each list is ordered and
/// deduplicated preserving first occurrence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntitySet {
    #[serde(default)]
    pub urls: Vec<String>,
    #[serde(default)]
    pub phones: Vec<String>,
    #[serde(default)]
    pub emails: Vec<String>,
    #[serde(default)]
    pub upi_ids: Vec<String>,
    #[serde(default)]
    pub crypto_addresses: Vec<String>,
}

impl EntitySet {
    pub fn total(&self) -> usize {
        self.urls.len()
            + self.phones.len()
            + self.emails.len()
            + self.upi_ids.len()
            + self.crypto_addresses.len()
    }
}

/// One piece of evidence shown to the caller and persisted with the scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidenceItem {
    pub source: String,
    pub detail: String,
    pub is_threat: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
}

/// Classifier output. `risk_score` is authoritative: if the model's
/// stated level disagrees with the band the score falls in, the level
/// is recomputed from the score.
#[derive(Debug, Clone)]
pub struct ClassificationResult {
    pub risk_score: u8,
    pub risk_level: RiskLevel,
    pub scam_type: ScamType,
    pub explanation: String,
    pub evidence: Vec<EvidenceItem>,
    pub model_used: String,
}
