// Recommended-action derivation: pure lookup, no I/O

use crate::models::taxonomy::{RiskLevel, ScamType};

/// Playbook for a scam type. Exhaustive over the taxonomy so adding a
/// variant forces a decision here at compile time. Types without a
/// dedicated playbook contribute nothing; risk-level actions still apply.
fn scam_type_actions(scam_type: ScamType) -> &'static [&'static str] {
    match scam_type {
        ScamType::Phishing => &[
            "Do NOT click any links in this message",
            "Do NOT enter any personal information",
            "Report the sender as spam/phishing",
            "If it claims to be from a known company, visit their official website directly (not through any link in this message)",
        ],
        ScamType::Smishing => &[
            "Do NOT click any links in this SMS",
            "Do NOT reply to this message",
            "Block the sender",
            "Report to your carrier by forwarding to 7726 (SPAM)",
        ],
        ScamType::UpiFraud => &[
            "Do NOT accept any collect request from unknown senders",
            "Remember: you do NOT need to enter your PIN to RECEIVE money",
            "Block this UPI ID in your payment app",
            "Report to your bank's fraud helpline",
        ],
        ScamType::AdvanceFee => &[
            "Do NOT send any money upfront",
            "Legitimate services do not require advance fees",
            "Do NOT share bank or UPI details",
            "Report this to cybercrime.gov.in or your local police",
        ],
        ScamType::LotteryPrize => &[
            "You cannot win a lottery you never entered",
            "Do NOT pay any 'processing fee' or 'tax'",
            "Do NOT share personal or banking details",
            "Block and report the sender",
        ],
        ScamType::JobScam => &[
            "Legitimate employers NEVER ask for money to hire you",
            "Verify the company on their official website and LinkedIn",
            "Do NOT share Aadhaar, PAN, or banking details before verifying",
            "If the salary seems too good to be true, it probably is",
        ],
        ScamType::InvestmentScam => &[
            "No legitimate investment guarantees fixed high returns",
            "Check if the entity is registered with SEBI (India) or SEC (USA)",
            "Do NOT invest based on urgency or limited-time pressure",
            "Consult a registered financial advisor before investing",
        ],
        ScamType::TechSupport => &[
            "Legitimate companies do NOT cold-call about computer problems",
            "Do NOT give remote access to your computer",
            "Do NOT share passwords or OTPs",
            "Hang up and contact the company directly through their official number",
        ],
        ScamType::Impersonation => &[
            "Verify the sender's identity through a known, separate channel",
            "Do NOT act on urgent money requests without verifying",
            "Check the actual email address / phone number (not just the display name)",
            "Contact the person/organization directly using a number you already have",
        ],
        ScamType::OtpFraud => &[
            "NEVER share OTP with anyone - no bank or service will ask for it",
            "OTPs are for YOUR use only",
            "If someone asks for your OTP, it is a scam - no exceptions",
            "Report immediately to your bank",
        ],
        ScamType::CryptoScam => &[
            "No legitimate crypto investment guarantees returns",
            "Do NOT send cryptocurrency to unknown wallets",
            "Verify any platform on official crypto exchange listings",
            "Be extremely wary of 'celebrity endorsements' or 'exclusive groups'",
        ],
        // No dedicated playbook yet.
        ScamType::VishingReference
        | ScamType::RomanceScam
        | ScamType::QrCodeScam
        | ScamType::FakeApp
        | ScamType::RentalScam
        | ScamType::DeliveryScam
        | ScamType::CharityScam
        | ScamType::Unknown => &[],
    }
}

/// Default actions per risk level. Populated for every level, so a scan
/// always gets at least these.
fn risk_level_actions(risk_level: RiskLevel) -> &'static [&'static str] {
    match risk_level {
        RiskLevel::Critical => &[
            "We strongly recommend you do NOT engage with this message",
            "Block the sender immediately",
            "Report to relevant authorities",
        ],
        RiskLevel::High => &[
            "Exercise extreme caution",
            "Do NOT click links or share personal information",
            "Verify through official channels before taking any action",
        ],
        RiskLevel::Medium => &[
            "Proceed with caution",
            "Verify the sender and any claims independently",
            "Do NOT share personal or financial information without verification",
        ],
        RiskLevel::Low => &[
            "Stay alert - minor concerns noted",
            "If something feels off, trust your instincts and verify directly",
        ],
        RiskLevel::None => &[
            "No scam indicators detected in our checks",
            "However, no automated system is perfect - if something feels wrong, verify directly",
        ],
        RiskLevel::Insufficient => &[
            "We could not analyze this content",
            "When in doubt, verify through official channels",
        ],
    }
}

/// Get recommended actions: scam-type playbook first, then risk-level
/// defaults, deduplicated preserving first occurrence.
pub fn get_actions(scam_type: ScamType, risk_level: RiskLevel) -> Vec<String> {
    let mut actions: Vec<String> = Vec::new();
    for action in scam_type_actions(scam_type)
        .iter()
        .chain(risk_level_actions(risk_level))
    {
        if !actions.iter().any(|a| a == action) {
            actions.push((*action).to_string());
        }
    }
    actions
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_type_still_gets_risk_level_actions() {
        let actions = get_actions(ScamType::Unknown, RiskLevel::High);
        assert_eq!(actions.len(), 3);
        assert_eq!(actions[0], "Exercise extreme caution");
    }

    #[test]
    fn scam_actions_precede_risk_actions() {
        let actions = get_actions(ScamType::Phishing, RiskLevel::Critical);
        assert_eq!(actions[0], "Do NOT click any links in this message");
        assert!(actions.contains(&"Block the sender immediately".to_string()));
    }

    #[test]
    fn no_duplicates_for_any_pair() {
        let levels = [
            RiskLevel::Critical,
            RiskLevel::High,
            RiskLevel::Medium,
            RiskLevel::Low,
            RiskLevel::None,
            RiskLevel::Insufficient,
        ];
        for scam_type in ScamType::ALL {
            for level in levels {
                let actions = get_actions(scam_type, level);
                let mut deduped = actions.clone();
                deduped.dedup();
                deduped.sort();
                deduped.dedup();
                assert_eq!(
                    deduped.len(),
                    actions.len(),
                    "duplicate action for ({:?}, {:?})",
                    scam_type,
                    level
                );
                assert!(!actions.is_empty(), "({:?}, {:?}) produced no actions", scam_type, level);
            }
        }
    }
}
