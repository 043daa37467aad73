use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::models::scan::EntitySet;
use crate::models::taxonomy::EntityType;
use crate::services::threat_intel::ThreatCheckResult;

/// Scan row as assembled by the orchestrator, ready to persist.
pub struct NewScan {
    pub api_key_id: Uuid,
    pub content_type: String,
    pub channel: Option<String>,
    pub category: String,
    pub locale: String,
    pub raw_content: Option<String>,
    pub content_hash: String,
    pub risk_score: i16,
    pub risk_level: String,
    pub scam_type: Option<String>,
    pub explanation: String,
    pub evidence: serde_json::Value,
    pub actions: serde_json::Value,
    pub checks_performed: serde_json::Value,
    pub checks_not_available: serde_json::Value,
    pub confidence_note: String,
    pub processing_time_ms: i32,
    pub model_used: Option<String>,
    pub content_expires_at: Option<DateTime<Utc>>,
}

/// Insert a scan together with its entity and threat-result children in
/// one transaction: either the whole scan lands or none of it does.
pub async fn insert_scan_with_children(
    pool: &PgPool,
    scan: NewScan,
    entities: &EntitySet,
    threat_results: &[ThreatCheckResult],
) -> Result<(Uuid, DateTime<Utc>), sqlx::Error> {
    let scan_id = Uuid::new_v4();
    let created_at = Utc::now();

    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        INSERT INTO scans (
            id, api_key_id, content_type, channel, category, locale,
            raw_content, content_hash, risk_score, risk_level, scam_type,
            explanation, evidence, actions, checks_performed,
            checks_not_available, confidence_note, processing_time_ms,
            model_used, content_expires_at, created_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11,
                $12, $13, $14, $15, $16, $17, $18, $19, $20, $21)
        "#,
    )
    .bind(scan_id)
    .bind(scan.api_key_id)
    .bind(&scan.content_type)
    .bind(&scan.channel)
    .bind(&scan.category)
    .bind(&scan.locale)
    .bind(&scan.raw_content)
    .bind(&scan.content_hash)
    .bind(scan.risk_score)
    .bind(&scan.risk_level)
    .bind(&scan.scam_type)
    .bind(&scan.explanation)
    .bind(&scan.evidence)
    .bind(&scan.actions)
    .bind(&scan.checks_performed)
    .bind(&scan.checks_not_available)
    .bind(&scan.confidence_note)
    .bind(scan.processing_time_ms)
    .bind(&scan.model_used)
    .bind(scan.content_expires_at)
    .bind(created_at)
    .execute(&mut *tx)
    .await?;

    let typed: [(EntityType, &[String]); 5] = [
        (EntityType::Url, &entities.urls),
        (EntityType::Phone, &entities.phones),
        (EntityType::Email, &entities.emails),
        (EntityType::Upi, &entities.upi_ids),
        (EntityType::Crypto, &entities.crypto_addresses),
    ];
    for (entity_type, values) in typed {
        for value in values {
            sqlx::query(
                r#"
                INSERT INTO scan_entities (id, scan_id, entity_type, value, created_at)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(scan_id)
            .bind(entity_type.as_str())
            .bind(value)
            .bind(created_at)
            .execute(&mut *tx)
            .await?;
        }
    }

    for tr in threat_results {
        sqlx::query(
            r#"
            INSERT INTO threat_results (
                id, scan_id, source, is_threat, threat_type, confidence,
                details, response_time_ms, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(scan_id)
        .bind(tr.source.as_str())
        .bind(tr.is_threat)
        .bind(&tr.threat_type)
        .bind(tr.confidence)
        .bind(&tr.details)
        .bind(tr.response_time_ms)
        .bind(created_at)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok((scan_id, created_at))
}

/// Derived fields of a stored scan, as returned to callers. Entities are
/// deliberately absent: they are never replayed back after persistence.
pub struct StoredScan {
    pub id: Uuid,
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
    pub created_at: DateTime<Utc>,
}

/// Fetch a scan scoped to its owning API key.
pub async fn fetch_scan(
    pool: &PgPool,
    scan_id: Uuid,
    api_key_id: Uuid,
) -> Result<Option<StoredScan>, sqlx::Error> {
    let row = sqlx::query(
        r#"
        SELECT id, risk_score, risk_level, scam_type, explanation, evidence,
               actions, checks_performed, checks_not_available, confidence_note,
               processing_time_ms, model_used, created_at
        FROM scans
        WHERE id = $1 AND api_key_id = $2
        "#,
    )
    .bind(scan_id)
    .bind(api_key_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|row| StoredScan {
        id: row.get("id"),
        risk_score: row.get("risk_score"),
        risk_level: row.get("risk_level"),
        scam_type: row.get("scam_type"),
        explanation: row.get("explanation"),
        evidence: row.get("evidence"),
        actions: row.get("actions"),
        checks_performed: row.get("checks_performed"),
        checks_not_available: row.get("checks_not_available"),
        confidence_note: row.get("confidence_note"),
        processing_time_ms: row.get("processing_time_ms"),
        model_used: row.get("model_used"),
        created_at: row.get("created_at"),
    }))
}
