// Shareable scam-card creation

use rand::Rng;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::scan::ClassificationResult;
use crate::models::taxonomy::{RiskLevel, ScamType};

const SHORT_ID_LEN: usize = 8;
const SHORT_ID_CHARS: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Truncation point for the card summary's explanation text.
const SUMMARY_MAX_CHARS: usize = 200;

/// Generate a URL-safe short ID for scam cards.
fn generate_short_id() -> String {
    let mut rng = rand::thread_rng();
    (0..SHORT_ID_LEN)
        .map(|_| SHORT_ID_CHARS[rng.gen_range(0..SHORT_ID_CHARS.len())] as char)
        .collect()
}

/// Card title from the scam type. Exhaustive so a new taxonomy variant
/// must pick a label (or the default) explicitly.
fn card_title(scam_type: ScamType) -> &'static str {
    match scam_type {
        ScamType::Phishing => "Phishing Alert",
        ScamType::Smishing => "SMS Scam Alert",
        ScamType::UpiFraud => "UPI Fraud Alert",
        ScamType::AdvanceFee => "Advance Fee Scam Alert",
        ScamType::LotteryPrize => "Lottery/Prize Scam Alert",
        ScamType::JobScam => "Job Scam Alert",
        ScamType::InvestmentScam => "Investment Scam Alert",
        ScamType::TechSupport => "Tech Support Scam Alert",
        ScamType::Impersonation => "Impersonation Alert",
        ScamType::OtpFraud => "OTP Fraud Alert",
        ScamType::CryptoScam => "Crypto Scam Alert",
        ScamType::RomanceScam => "Romance Scam Alert",
        ScamType::DeliveryScam => "Delivery Scam Alert",
        ScamType::VishingReference
        | ScamType::QrCodeScam
        | ScamType::FakeApp
        | ScamType::RentalScam
        | ScamType::CharityScam
        | ScamType::Unknown => "Scam Alert",
    }
}

/// Shareable one-line summary: risk prefix plus the (truncated) explanation.
fn card_summary(risk_level: RiskLevel, explanation: &str) -> String {
    let prefix = match risk_level {
        RiskLevel::Critical => "CRITICAL WARNING",
        RiskLevel::High => "HIGH RISK",
        RiskLevel::Medium => "CAUTION",
        RiskLevel::Low | RiskLevel::None | RiskLevel::Insufficient => "Warning",
    };

    let explanation = if explanation.chars().count() > SUMMARY_MAX_CHARS {
        let truncated: String = explanation.chars().take(SUMMARY_MAX_CHARS - 3).collect();
        format!("{}...", truncated)
    } else {
        explanation.to_string()
    };

    format!("{}: {}", prefix, explanation)
}

pub struct CreatedCard {
    pub short_id: String,
    pub image_url: Option<String>,
}

/// Create a scam card for a risky scan. Runs in its own transaction
/// scope: any failure here is logged and reported as "no card", never
/// propagated into the scan result.
pub async fn create_scam_card(
    db: &PgPool,
    scan_id: Uuid,
    classification: &ClassificationResult,
) -> Option<CreatedCard> {
    let short_id = generate_short_id();
    let title = card_title(classification.scam_type);
    let summary = card_summary(classification.risk_level, &classification.explanation);

    let inserted = sqlx::query(
        r#"
        INSERT INTO scam_cards (id, scan_id, short_id, title, summary, risk_level, risk_score, scam_type)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(scan_id)
    .bind(&short_id)
    .bind(title)
    .bind(&summary)
    .bind(classification.risk_level.as_str())
    .bind(classification.risk_score as i16)
    .bind(classification.scam_type.as_str())
    .execute(db)
    .await;

    match inserted {
        Ok(_) => Some(CreatedCard {
            short_id,
            image_url: None,
        }),
        Err(e) => {
            tracing::error!(scan_id = %scan_id, "scam card creation failed: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_id_is_eight_lowercase_alphanumeric() {
        for _ in 0..50 {
            let id = generate_short_id();
            assert_eq!(id.len(), 8);
            assert!(id.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
        }
    }

    #[test]
    fn titles_cover_taxonomy_with_default() {
        assert_eq!(card_title(ScamType::UpiFraud), "UPI Fraud Alert");
        assert_eq!(card_title(ScamType::Unknown), "Scam Alert");
        assert_eq!(card_title(ScamType::QrCodeScam), "Scam Alert");
    }

    #[test]
    fn summary_prefixes_by_level() {
        assert!(card_summary(RiskLevel::Critical, "x").starts_with("CRITICAL WARNING: "));
        assert!(card_summary(RiskLevel::High, "x").starts_with("HIGH RISK: "));
        assert!(card_summary(RiskLevel::Medium, "x").starts_with("CAUTION: "));
        assert!(card_summary(RiskLevel::Low, "x").starts_with("Warning: "));
    }

    #[test]
    fn summary_truncates_long_explanations_with_ellipsis() {
        let long = "a".repeat(500);
        let summary = card_summary(RiskLevel::High, &long);
        assert!(summary.ends_with("..."));
        // "HIGH RISK: " + 197 chars + "..."
        assert_eq!(summary.chars().count(), 11 + 197 + 3);

        let short = "short explanation";
        let summary = card_summary(RiskLevel::High, short);
        assert!(summary.ends_with(short));
        assert!(!summary.ends_with("..."));
    }
}
