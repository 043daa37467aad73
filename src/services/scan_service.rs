// Scan orchestration pipeline

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::config::Config;
use crate::db::queries::{self, NewScan};
use crate::llm::LlmClient;
use crate::models::scan::{ClassificationResult, EntitySet, EvidenceItem};
use crate::models::taxonomy::{Channel, ContentType, RiskLevel, ScamType, ScanCategory};
use crate::services::abuse;
use crate::services::action_engine::get_actions;
use crate::services::classifier::classify_content;
use crate::services::entity_extractor::extract_entities;
use crate::services::ocr::OcrClient;
use crate::services::scam_card::create_scam_card;
use crate::services::threat_intel::{ThreatIntel, ThreatIntelConfig, results_to_evidence};
use crate::services::ServiceError;
use crate::utils::hash_content;

// ============================================
// Honest Messaging
// ============================================

const CHECKS_PERFORMED_TEXT: [&str; 2] = [
    "message_pattern_analysis",
    "entity_extraction (URLs, phones, emails, UPI, crypto)",
];
const CHECKS_PERFORMED_URLS: [&str; 2] = [
    "url_reputation (Google Safe Browsing, PhishTank, URLhaus)",
    "domain_age_verification (RDAP)",
];
const CHECKS_NOT_AVAILABLE: [&str; 3] = [
    "sender_identity_verification",
    "transaction_confirmation",
    "voice_call_content_analysis",
];

fn confidence_note(risk_level: RiskLevel) -> &'static str {
    match risk_level {
        RiskLevel::Critical => {
            "Strong scam indicators detected. However, no automated system is 100% accurate. \
             If unsure, verify directly with the claimed sender through official channels."
        }
        RiskLevel::High => {
            "Multiple warning signs detected. Exercise extreme caution. \
             Verify through official channels before taking any action."
        }
        RiskLevel::Medium => {
            "Some suspicious elements found. This could be a scam or legitimate but aggressive \
             communication. Verify independently before sharing any personal or financial \
             information."
        }
        RiskLevel::Low => {
            "Minor concerns noted but likely legitimate. Stay alert. \
             No automated system is perfect - if something feels wrong, trust your instincts."
        }
        RiskLevel::None => {
            "No scam indicators detected in our checks. However, no automated system is perfect. \
             If something feels wrong, trust your instincts and verify directly."
        }
        RiskLevel::Insufficient => {
            "Insufficient data for analysis. When in doubt, verify through official channels."
        }
    }
}

fn checks_performed_for(entities: &EntitySet) -> Vec<String> {
    let mut checks: Vec<String> = CHECKS_PERFORMED_TEXT.iter().map(|s| s.to_string()).collect();
    if !entities.urls.is_empty() {
        checks.extend(CHECKS_PERFORMED_URLS.iter().map(|s| s.to_string()));
    }
    checks
}

/// Minimum risk score for which a shareable card is created.
const CARD_SCORE_THRESHOLD: u8 = 40;

fn deserves_card(risk_score: u8) -> bool {
    risk_score >= CARD_SCORE_THRESHOLD
}

// ============================================
// Result Types
// ============================================

#[derive(Debug, Serialize)]
pub struct ScamCardData {
    pub card_id: String,
    pub card_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ScanResult {
    pub scan_id: Uuid,
    pub risk_score: u8,
    pub risk_level: RiskLevel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scam_type: Option<ScamType>,
    pub explanation: String,
    pub evidence: Vec<EvidenceItem>,
    pub actions: Vec<String>,
    pub entities: EntitySet,
    pub checks_performed: Vec<String>,
    pub checks_not_available: Vec<String>,
    pub confidence_note: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scam_card: Option<ScamCardData>,
    pub processing_time_ms: i32,
    pub created_at: DateTime<Utc>,
}

pub struct TextScanInput {
    pub content: String,
    pub content_type: ContentType,
    pub channel: Option<Channel>,
    pub category: ScanCategory,
    pub locale: String,
    pub api_key_id: Uuid,
}

// ============================================
// Orchestrator
// ============================================

#[derive(Clone)]
pub struct ScanService {
    db: PgPool,
    config: Arc<Config>,
    llm: Option<LlmClient>,
    intel: ThreatIntel,
    ocr: OcrClient,
}

impl ScanService {
    pub fn new(db: PgPool, config: Arc<Config>) -> anyhow::Result<Self> {
        let llm = match &config.anthropic_api_key {
            Some(key) => Some(LlmClient::new(key.clone(), config.claude_model.clone())?),
            None => None,
        };
        let intel = ThreatIntel::new(ThreatIntelConfig {
            safe_browsing_key: config.google_safe_browsing_key.clone(),
            phishtank_key: config.phishtank_api_key.clone(),
            urlhaus_enabled: config.urlhaus_enabled,
        })?;
        let ocr = OcrClient::new(config.google_vision_api_key.clone())?;

        Ok(Self {
            db,
            config,
            llm,
            intel,
            ocr,
        })
    }

    pub fn ocr_configured(&self) -> bool {
        self.ocr.is_configured()
    }

    pub fn llm_configured(&self) -> bool {
        self.llm.is_some()
    }

    /// Full scan pipeline for text content: extract entities, aggregate
    /// threat intel over found URLs, classify, derive actions, persist
    /// everything in one transaction, then maybe mint a card.
    pub async fn scan_text(&self, input: TextScanInput) -> Result<ScanResult, ServiceError> {
        let start = Instant::now();

        let entities = extract_entities(&input.content, self.llm.as_ref()).await;
        tracing::debug!(count = entities.total(), "entities extracted");

        let threat_results = self.intel.check_all(&entities.urls, None).await;
        let threat_evidence = results_to_evidence(&threat_results);

        let classification =
            classify_content(&input.content, &entities, &threat_evidence, self.llm.as_ref()).await;

        let actions = get_actions(classification.scam_type, classification.risk_level);

        let checks_performed = checks_performed_for(&entities);
        let checks_not_available: Vec<String> =
            CHECKS_NOT_AVAILABLE.iter().map(|s| s.to_string()).collect();
        let note = confidence_note(classification.risk_level);

        let processing_time_ms = start.elapsed().as_millis() as i32;

        let new_scan = NewScan {
            api_key_id: input.api_key_id,
            content_type: input.content_type.as_str().to_string(),
            channel: input.channel.map(|c| c.as_str().to_string()),
            category: input.category.as_str().to_string(),
            locale: input.locale.clone(),
            raw_content: Some(input.content.clone()),
            content_hash: hash_content(&input.content),
            risk_score: classification.risk_score as i16,
            risk_level: classification.risk_level.as_str().to_string(),
            scam_type: Some(classification.scam_type.as_str().to_string()),
            explanation: classification.explanation.clone(),
            evidence: serde_json::to_value(&classification.evidence)
                .unwrap_or_else(|_| serde_json::json!([])),
            actions: serde_json::to_value(&actions).unwrap_or_else(|_| serde_json::json!([])),
            checks_performed: serde_json::to_value(&checks_performed)
                .unwrap_or_else(|_| serde_json::json!([])),
            checks_not_available: serde_json::to_value(&checks_not_available)
                .unwrap_or_else(|_| serde_json::json!([])),
            confidence_note: note.to_string(),
            processing_time_ms,
            model_used: Some(classification.model_used.clone()),
            content_expires_at: Some(
                Utc::now() + Duration::hours(self.config.raw_content_retention_hours),
            ),
        };

        let (scan_id, created_at) =
            queries::insert_scan_with_children(&self.db, new_scan, &entities, &threat_results)
                .await?;

        let scam_card = if deserves_card(classification.risk_score) {
            self.try_create_card(scan_id, &classification).await
        } else {
            None
        };

        // Shape the response for this caller; the full evidence is
        // already persisted above.
        let level = abuse::get_response_level(&self.db, input.api_key_id).await;
        let evidence = abuse::filter_evidence(classification.evidence, level);

        Ok(ScanResult {
            scan_id,
            risk_score: classification.risk_score,
            risk_level: classification.risk_level,
            scam_type: Some(classification.scam_type),
            explanation: classification.explanation,
            evidence,
            actions,
            entities,
            checks_performed,
            checks_not_available,
            confidence_note: note.to_string(),
            scam_card,
            processing_time_ms,
            created_at,
        })
    }

    /// Image pipeline: OCR first, then hand the extracted text to the
    /// text pipeline. No usable text short-circuits into a terminal
    /// insufficient-data scan.
    pub async fn scan_image(
        &self,
        image: &[u8],
        channel: Option<Channel>,
        category: ScanCategory,
        locale: String,
        api_key_id: Uuid,
    ) -> Result<ScanResult, ServiceError> {
        let text = self
            .ocr
            .extract_text(image)
            .await
            .map_err(|e| ServiceError::Ocr(e.to_string()))?;

        if text.trim().is_empty() {
            return self.save_insufficient_scan(image, channel, category, locale, api_key_id).await;
        }

        self.scan_text(TextScanInput {
            content: text,
            content_type: ContentType::Image,
            channel,
            category,
            locale,
            api_key_id,
        })
        .await
    }

    async fn save_insufficient_scan(
        &self,
        image: &[u8],
        channel: Option<Channel>,
        category: ScanCategory,
        locale: String,
        api_key_id: Uuid,
    ) -> Result<ScanResult, ServiceError> {
        let explanation =
            "We could not extract enough text from this image for a reliable assessment."
                .to_string();
        let checks_performed = vec!["ocr_text_extraction".to_string()];
        let checks_not_available = vec!["image_content_insufficient".to_string()];
        let note = confidence_note(RiskLevel::Insufficient);

        let new_scan = NewScan {
            api_key_id,
            content_type: ContentType::Image.as_str().to_string(),
            channel: channel.map(|c| c.as_str().to_string()),
            category: category.as_str().to_string(),
            locale,
            raw_content: None,
            content_hash: hash_content(&image.len().to_string()),
            risk_score: 0,
            risk_level: RiskLevel::Insufficient.as_str().to_string(),
            scam_type: None,
            explanation: explanation.clone(),
            evidence: serde_json::json!([]),
            actions: serde_json::json!([]),
            checks_performed: serde_json::to_value(&checks_performed)
                .unwrap_or_else(|_| serde_json::json!([])),
            checks_not_available: serde_json::to_value(&checks_not_available)
                .unwrap_or_else(|_| serde_json::json!([])),
            confidence_note: note.to_string(),
            processing_time_ms: 0,
            model_used: None,
            content_expires_at: None,
        };

        let (scan_id, created_at) = queries::insert_scan_with_children(
            &self.db,
            new_scan,
            &EntitySet::default(),
            &[],
        )
        .await?;

        Ok(ScanResult {
            scan_id,
            risk_score: 0,
            risk_level: RiskLevel::Insufficient,
            scam_type: None,
            explanation,
            evidence: Vec::new(),
            actions: Vec::new(),
            entities: EntitySet::default(),
            checks_performed,
            checks_not_available,
            confidence_note: note.to_string(),
            scam_card: None,
            processing_time_ms: 0,
            created_at,
        })
    }

    /// Retrieve a previous scan, scoped to its owner. Extracted entities
    /// are never replayed back; callers get the derived risk fields with
    /// an empty entity set.
    pub async fn get_scan(
        &self,
        scan_id: Uuid,
        api_key_id: Uuid,
    ) -> Result<Option<ScanResult>, ServiceError> {
        let Some(stored) = queries::fetch_scan(&self.db, scan_id, api_key_id).await? else {
            return Ok(None);
        };

        let evidence: Vec<EvidenceItem> =
            serde_json::from_value(stored.evidence).unwrap_or_default();
        let actions: Vec<String> = serde_json::from_value(stored.actions).unwrap_or_default();
        let checks_performed: Vec<String> =
            serde_json::from_value(stored.checks_performed).unwrap_or_default();
        let checks_not_available: Vec<String> =
            serde_json::from_value(stored.checks_not_available).unwrap_or_default();

        let level = abuse::get_response_level(&self.db, api_key_id).await;
        let evidence = abuse::filter_evidence(evidence, level);

        Ok(Some(ScanResult {
            scan_id: stored.id,
            risk_score: stored.risk_score.clamp(0, 100) as u8,
            risk_level: RiskLevel::parse(&stored.risk_level).unwrap_or(RiskLevel::None),
            scam_type: stored.scam_type.as_deref().map(ScamType::parse_or_unknown),
            explanation: stored.explanation.unwrap_or_default(),
            evidence,
            actions,
            entities: EntitySet::default(),
            checks_performed,
            checks_not_available,
            confidence_note: stored.confidence_note.unwrap_or_default(),
            scam_card: None,
            processing_time_ms: stored.processing_time_ms,
            created_at: stored.created_at,
        }))
    }

    async fn try_create_card(
        &self,
        scan_id: Uuid,
        classification: &ClassificationResult,
    ) -> Option<ScamCardData> {
        let card = create_scam_card(&self.db, scan_id, classification).await?;
        Some(ScamCardData {
            card_url: format!("{}/card/{}", self.config.public_base_url, card.short_id),
            card_id: card.short_id,
            image_url: card.image_url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn card_threshold_boundary() {
        assert!(!deserves_card(39));
        assert!(deserves_card(40));
        assert!(deserves_card(100));
        assert!(!deserves_card(0));
    }

    #[test]
    fn url_checks_listed_only_when_urls_found() {
        let without_urls = checks_performed_for(&EntitySet::default());
        assert_eq!(without_urls.len(), 2);
        assert!(without_urls[0].contains("pattern_analysis"));

        let with_urls = checks_performed_for(&EntitySet {
            urls: vec!["https://example.com".to_string()],
            ..Default::default()
        });
        assert_eq!(with_urls.len(), 4);
        assert!(with_urls[2].contains("url_reputation"));
        assert!(with_urls[3].contains("domain_age_verification"));
    }

    #[test]
    fn confidence_note_covers_every_level() {
        let levels = [
            RiskLevel::Critical,
            RiskLevel::High,
            RiskLevel::Medium,
            RiskLevel::Low,
            RiskLevel::None,
            RiskLevel::Insufficient,
        ];
        for level in levels {
            assert!(!confidence_note(level).is_empty());
        }
        assert!(confidence_note(RiskLevel::None).contains("no automated system is perfect"));
    }
}
