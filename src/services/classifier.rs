// Risk classification: LLM with structured tool output, deterministic fallback

use serde::Deserialize;
use serde_json::Value;

use crate::llm::LlmClient;
use crate::models::scan::{ClassificationResult, EntitySet, EvidenceItem};
use crate::models::taxonomy::{RiskLevel, ScamType};

const SYSTEM_PROMPT: &str = "\
You are a scam classification engine. Your job is to analyze messages and \
provide evidence-grounded risk assessments.

CRITICAL RULES:
1. NEVER use absolute language. Never say \"safe\", \"definitely a scam\", \
\"guaranteed\", or \"100%\".
2. ALWAYS ground your assessment in observable evidence from the message \
and threat intel.
3. If threat intel shows a URL is flagged, weight that heavily \
(increase score by 20-30).
4. If the domain is very new (< 7 days), weight that as suspicious \
(increase score by 10-20).
5. Consider these scam patterns: urgency, threats, too-good-to-be-true \
offers, requests for personal info, suspicious links, impersonation of \
known brands, unusual payment methods.
6. For low-risk messages, explicitly state \"no automated system is \
perfect\" in your explanation.
7. Be specific about what you found and what you couldn't check.

SCORE GUIDE:
- 80-100 (critical): Multiple strong scam indicators. Flagged URLs, \
brand impersonation + malicious link, known scam template.
- 60-79 (high): Several warning signs. New domains, urgency + money \
request, suspicious patterns.
- 40-59 (medium): Some suspicious elements but mixed signals. Could be \
aggressive marketing or a scam.
- 20-39 (low): Minor concerns but likely legitimate. Unusual tone or \
minor red flags.
- 0-19 (none): No scam indicators detected. Normal communication.";

/// How many extracted entities get echoed into the LLM prompt.
const MAX_PROMPT_ENTITIES: usize = 20;

fn classification_tool() -> Value {
    let scam_types: Vec<&str> = ScamType::ALL.iter().map(|t| t.as_str()).collect();
    serde_json::json!({
        "name": "classify_scam",
        "description": "Classify the message and provide a risk assessment with evidence-grounded reasoning.",
        "input_schema": {
            "type": "object",
            "properties": {
                "risk_score": {
                    "type": "integer",
                    "minimum": 0,
                    "maximum": 100,
                    "description": "Risk score from 0 (no risk) to 100 (confirmed scam)."
                },
                "risk_level": {
                    "type": "string",
                    "enum": ["critical", "high", "medium", "low", "none"],
                    "description": "Risk level based on score: critical (80-100), high (60-79), medium (40-59), low (20-39), none (0-19)."
                },
                "scam_type": {
                    "type": "string",
                    "enum": scam_types,
                    "description": "The most likely scam type. Use 'unknown' if uncertain."
                },
                "explanation": {
                    "type": "string",
                    "description": "Clear, evidence-grounded explanation of why this is or isn't a scam. Cite specific signals found in the message. Never use absolute language like 'safe' or 'definitely a scam'."
                },
                "evidence_signals": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "signal": {"type": "string"},
                            "detail": {"type": "string"}
                        },
                        "required": ["signal", "detail"]
                    },
                    "description": "Specific signals that contributed to the classification. Each must cite something observable in the message or threat intel."
                }
            },
            "required": ["risk_score", "risk_level", "scam_type", "explanation", "evidence_signals"]
        }
    })
}

#[derive(Debug, Deserialize)]
struct ToolOutput {
    risk_score: i64,
    risk_level: String,
    scam_type: String,
    explanation: String,
    #[serde(default)]
    evidence_signals: Vec<Signal>,
}

#[derive(Debug, Deserialize)]
struct Signal {
    #[allow(dead_code)]
    signal: String,
    detail: String,
}

/// Classify content. Exactly one LLM attempt per scan: any failure at
/// all (no credential, transport, schema mismatch) drops to the
/// deterministic threat-count fallback, which bounds worst-case latency.
pub async fn classify_content(
    text: &str,
    entities: &EntitySet,
    threat_evidence: &[EvidenceItem],
    llm: Option<&LlmClient>,
) -> ClassificationResult {
    let Some(llm) = llm else {
        return fallback_classification(threat_evidence);
    };

    let user_message = build_user_message(text, entities, threat_evidence);
    let tool = classification_tool();

    let input = match llm
        .tool_call(Some(SYSTEM_PROMPT), &user_message, &tool, "classify_scam")
        .await
    {
        Ok(input) => input,
        Err(e) => {
            tracing::warn!("classification call failed, using fallback: {}", e);
            return fallback_classification(threat_evidence);
        }
    };

    let output: ToolOutput = match serde_json::from_value(input) {
        Ok(o) => o,
        Err(e) => {
            tracing::warn!("classification output malformed, using fallback: {}", e);
            return fallback_classification(threat_evidence);
        }
    };

    finalize(output, threat_evidence, llm.model())
}

fn build_user_message(
    text: &str,
    entities: &EntitySet,
    threat_evidence: &[EvidenceItem],
) -> String {
    let mut entity_context = String::new();
    let all: Vec<&String> = entities
        .urls
        .iter()
        .chain(&entities.phones)
        .chain(&entities.emails)
        .chain(&entities.upi_ids)
        .chain(&entities.crypto_addresses)
        .take(MAX_PROMPT_ENTITIES)
        .collect();
    if !all.is_empty() {
        let joined: Vec<&str> = all.iter().map(|s| s.as_str()).collect();
        entity_context = format!("\n\nExtracted entities: {}", joined.join(", "));
    }

    let mut threat_context = String::new();
    if !threat_evidence.is_empty() {
        let lines: Vec<String> = threat_evidence
            .iter()
            .map(|e| {
                let status = if e.is_threat { "FLAGGED" } else { "clean" };
                format!("  - [{}] {}: {}", status, e.source, e.detail)
            })
            .collect();
        threat_context = format!("\n\nThreat intelligence results:\n{}", lines.join("\n"));
    }

    format!(
        "Analyze this message for scam risk:\n\n---\n{}\n---{}{}",
        text, entity_context, threat_context
    )
}

/// Validate the model output and assemble the final result. The score is
/// authoritative: a risk_level that disagrees with the score's band is
/// replaced by the recomputed one.
fn finalize(
    output: ToolOutput,
    threat_evidence: &[EvidenceItem],
    model: &str,
) -> ClassificationResult {
    let risk_score = output.risk_score.clamp(0, 100) as u8;
    let banded = RiskLevel::from_score(risk_score);
    if RiskLevel::parse(&output.risk_level) != Some(banded) {
        tracing::debug!(
            stated = %output.risk_level,
            recomputed = banded.as_str(),
            "model risk_level disagreed with score band"
        );
    }

    let mut evidence: Vec<EvidenceItem> = threat_evidence.to_vec();
    evidence.extend(output.evidence_signals.into_iter().map(|s| EvidenceItem {
        source: "pattern_analysis".to_string(),
        detail: s.detail,
        is_threat: true,
        confidence: None,
    }));

    ClassificationResult {
        risk_score,
        risk_level: banded,
        scam_type: ScamType::parse_or_unknown(&output.scam_type),
        explanation: output.explanation,
        evidence,
        model_used: model.to_string(),
    }
}

/// Fallback when the LLM is unavailable: threat intel signals only.
fn fallback_classification(threat_evidence: &[EvidenceItem]) -> ClassificationResult {
    let threat_count = threat_evidence.iter().filter(|e| e.is_threat).count();

    let (score, level) = match threat_count {
        0 => (10, RiskLevel::None),
        1 => (55, RiskLevel::Medium),
        _ => (75, RiskLevel::High),
    };

    ClassificationResult {
        risk_score: score,
        risk_level: level,
        scam_type: ScamType::Unknown,
        explanation: format!(
            "Analysis based on threat intelligence signals only (LLM unavailable). \
             Found {} threat indicator(s). \
             No automated system is perfect - verify through official channels if unsure.",
            threat_count
        ),
        evidence: threat_evidence.to_vec(),
        model_used: "fallback".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn threat(detail: &str) -> EvidenceItem {
        EvidenceItem {
            source: "urlhaus".to_string(),
            detail: detail.to_string(),
            is_threat: true,
            confidence: Some(0.9),
        }
    }

    fn clean(detail: &str) -> EvidenceItem {
        EvidenceItem {
            source: "phishtank".to_string(),
            detail: detail.to_string(),
            is_threat: false,
            confidence: Some(0.0),
        }
    }

    #[tokio::test]
    async fn no_credential_two_threats_is_high_75() {
        let evidence = vec![threat("listed"), threat("flagged"), clean("not found")];
        let result =
            classify_content("win a prize now", &EntitySet::default(), &evidence, None).await;

        assert_eq!(result.risk_score, 75);
        assert_eq!(result.risk_level, RiskLevel::High);
        assert_eq!(result.scam_type, ScamType::Unknown);
        assert_eq!(result.model_used, "fallback");
    }

    #[tokio::test]
    async fn fallback_single_threat_is_medium() {
        let evidence = vec![threat("listed")];
        let result = classify_content("hello", &EntitySet::default(), &evidence, None).await;
        assert_eq!(result.risk_score, 55);
        assert_eq!(result.risk_level, RiskLevel::Medium);
    }

    #[tokio::test]
    async fn fallback_no_threats_is_none() {
        let result = classify_content("lunch at 1?", &EntitySet::default(), &[], None).await;
        assert_eq!(result.risk_score, 10);
        assert_eq!(result.risk_level, RiskLevel::None);
        assert!(result.evidence.is_empty());
    }

    #[tokio::test]
    async fn fallback_is_deterministic() {
        let evidence = vec![threat("a"), threat("b")];
        let first = classify_content("x", &EntitySet::default(), &evidence, None).await;
        let second = classify_content("x", &EntitySet::default(), &evidence, None).await;
        assert_eq!(first.risk_score, second.risk_score);
        assert_eq!(first.risk_level, second.risk_level);
        assert_eq!(first.explanation, second.explanation);
    }

    #[test]
    fn score_overrides_disagreeing_level() {
        let output = ToolOutput {
            risk_score: 85,
            risk_level: "medium".to_string(),
            scam_type: "phishing".to_string(),
            explanation: "Multiple indicators suggest this is likely a scam.".to_string(),
            evidence_signals: vec![],
        };
        let result = finalize(output, &[], "claude-sonnet-4-6");
        assert_eq!(result.risk_score, 85);
        assert_eq!(result.risk_level, RiskLevel::Critical);
    }

    #[test]
    fn threat_evidence_ordered_before_model_signals() {
        let output = ToolOutput {
            risk_score: 70,
            risk_level: "high".to_string(),
            scam_type: "upi_fraud".to_string(),
            explanation: "Urgent payment request with a collect prompt.".to_string(),
            evidence_signals: vec![Signal {
                signal: "urgency".to_string(),
                detail: "Message demands payment within 10 minutes".to_string(),
            }],
        };
        let result = finalize(output, &[threat("listed")], "claude-sonnet-4-6");
        assert_eq!(result.evidence.len(), 2);
        assert_eq!(result.evidence[0].source, "urlhaus");
        assert_eq!(result.evidence[1].source, "pattern_analysis");
    }

    #[test]
    fn unknown_scam_type_parses_to_unknown() {
        let output = ToolOutput {
            risk_score: 50,
            risk_level: "medium".to_string(),
            scam_type: "brand_new_scheme".to_string(),
            explanation: "Mixed signals present.".to_string(),
            evidence_signals: vec![],
        };
        let result = finalize(output, &[], "claude-sonnet-4-6");
        assert_eq!(result.scam_type, ScamType::Unknown);
    }

    #[test]
    fn out_of_range_score_is_clamped() {
        let output = ToolOutput {
            risk_score: 250,
            risk_level: "critical".to_string(),
            scam_type: "phishing".to_string(),
            explanation: "Strong indicators.".to_string(),
            evidence_signals: vec![],
        };
        let result = finalize(output, &[], "claude-sonnet-4-6");
        assert_eq!(result.risk_score, 100);
        assert_eq!(result.risk_level, RiskLevel::Critical);
    }
}
