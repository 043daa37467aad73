// Abuse-driven response shaping

use sqlx::PgPool;
use uuid::Uuid;

use crate::models::abuse::ResponseLevel;
use crate::models::scan::EvidenceItem;

/// Current response level for an API key. The abuse score behind it is
/// computed by an external periodic job; callers with no row get full
/// detail. A read failure also degrades to full rather than blocking
/// the scan.
pub async fn get_response_level(db: &PgPool, api_key_id: Uuid) -> ResponseLevel {
    let row: Result<Option<String>, sqlx::Error> =
        sqlx::query_scalar("SELECT response_level FROM abuse_scores WHERE api_key_id = $1")
            .bind(api_key_id)
            .fetch_optional(db)
            .await;

    match row {
        Ok(Some(level)) => ResponseLevel::parse_or_full(&level),
        Ok(None) => ResponseLevel::Full,
        Err(e) => {
            tracing::warn!("abuse score lookup failed, defaulting to full: {}", e);
            ResponseLevel::Full
        }
    }
}

/// Shape the evidence list returned to the caller. Only the response is
/// affected; the persisted scan always keeps full evidence.
pub fn filter_evidence(evidence: Vec<EvidenceItem>, level: ResponseLevel) -> Vec<EvidenceItem> {
    match level {
        ResponseLevel::Full => evidence,
        ResponseLevel::Reduced => evidence
            .into_iter()
            .map(|e| EvidenceItem {
                source: "analysis".to_string(),
                ..e
            })
            .collect(),
        // Verdict only
        ResponseLevel::Minimal | ResponseLevel::Throttled => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<EvidenceItem> {
        vec![
            EvidenceItem {
                source: "urlhaus".to_string(),
                detail: "URL listed in URLhaus as distributing malware".to_string(),
                is_threat: true,
                confidence: Some(0.9),
            },
            EvidenceItem {
                source: "pattern_analysis".to_string(),
                detail: "Urgent payment demand".to_string(),
                is_threat: true,
                confidence: None,
            },
        ]
    }

    #[test]
    fn full_is_unchanged() {
        let filtered = filter_evidence(sample(), ResponseLevel::Full);
        assert_eq!(filtered.len(), 2);
        assert_eq!(filtered[0].source, "urlhaus");
    }

    #[test]
    fn reduced_strips_source_attribution_keeps_detail() {
        let filtered = filter_evidence(sample(), ResponseLevel::Reduced);
        assert_eq!(filtered.len(), 2);
        for item in &filtered {
            assert_eq!(item.source, "analysis");
        }
        assert_eq!(filtered[0].detail, "URL listed in URLhaus as distributing malware");
    }

    #[test]
    fn minimal_and_throttled_empty_the_list() {
        assert!(filter_evidence(sample(), ResponseLevel::Minimal).is_empty());
        assert!(filter_evidence(sample(), ResponseLevel::Throttled).is_empty());

        let big: Vec<EvidenceItem> = (0..100)
            .map(|i| EvidenceItem {
                source: format!("s{}", i),
                detail: "d".to_string(),
                is_threat: false,
                confidence: None,
            })
            .collect();
        assert!(filter_evidence(big, ResponseLevel::Throttled).is_empty());
    }

    #[test]
    fn unknown_stored_level_degrades_to_full() {
        assert_eq!(ResponseLevel::parse_or_full("weird"), ResponseLevel::Full);
        assert_eq!(ResponseLevel::parse_or_full("reduced"), ResponseLevel::Reduced);
    }
}
