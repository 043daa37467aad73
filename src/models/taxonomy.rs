use serde::{Deserialize, Serialize};

// ============================================
// Risk Levels
// ============================================

/// Risk bands: critical 80-100, high 60-79, medium 40-59, low 20-39,
/// none 0-19. `Insufficient` is the terminal state for image scans where
/// OCR produced no usable text - it is never derived from a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Critical,
    High,
    Medium,
    Low,
    None,
    Insufficient,
}

impl RiskLevel {
    /// Map a 0-100 risk score to its band.
    pub fn from_score(score: u8) -> Self {
        match score {
            80..=100 => RiskLevel::Critical,
            60..=79 => RiskLevel::High,
            40..=59 => RiskLevel::Medium,
            20..=39 => RiskLevel::Low,
            _ => RiskLevel::None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Critical => "critical",
            RiskLevel::High => "high",
            RiskLevel::Medium => "medium",
            RiskLevel::Low => "low",
            RiskLevel::None => "none",
            RiskLevel::Insufficient => "insufficient",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "critical" => Some(RiskLevel::Critical),
            "high" => Some(RiskLevel::High),
            "medium" => Some(RiskLevel::Medium),
            "low" => Some(RiskLevel::Low),
            "none" => Some(RiskLevel::None),
            "insufficient" => Some(RiskLevel::Insufficient),
            _ => None,
        }
    }
}

// ============================================
// Scam Taxonomy
// ============================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScamType {
    Phishing,
    Smishing,
    VishingReference,
    UpiFraud,
    AdvanceFee,
    LotteryPrize,
    JobScam,
    InvestmentScam,
    TechSupport,
    RomanceScam,
    Impersonation,
    QrCodeScam,
    OtpFraud,
    FakeApp,
    CryptoScam,
    RentalScam,
    DeliveryScam,
    CharityScam,
    Unknown,
}

impl ScamType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScamType::Phishing => "phishing",
            ScamType::Smishing => "smishing",
            ScamType::VishingReference => "vishing_reference",
            ScamType::UpiFraud => "upi_fraud",
            ScamType::AdvanceFee => "advance_fee",
            ScamType::LotteryPrize => "lottery_prize",
            ScamType::JobScam => "job_scam",
            ScamType::InvestmentScam => "investment_scam",
            ScamType::TechSupport => "tech_support",
            ScamType::RomanceScam => "romance_scam",
            ScamType::Impersonation => "impersonation",
            ScamType::QrCodeScam => "qr_code_scam",
            ScamType::OtpFraud => "otp_fraud",
            ScamType::FakeApp => "fake_app",
            ScamType::CryptoScam => "crypto_scam",
            ScamType::RentalScam => "rental_scam",
            ScamType::DeliveryScam => "delivery_scam",
            ScamType::CharityScam => "charity_scam",
            ScamType::Unknown => "unknown",
        }
    }

    /// Parse a wire value, falling back to `Unknown` for anything
    /// outside the taxonomy (the LLM is constrained to it, but we
    /// never trust that).
    pub fn parse_or_unknown(s: &str) -> Self {
        match s {
            "phishing" => ScamType::Phishing,
            "smishing" => ScamType::Smishing,
            "vishing_reference" => ScamType::VishingReference,
            "upi_fraud" => ScamType::UpiFraud,
            "advance_fee" => ScamType::AdvanceFee,
            "lottery_prize" => ScamType::LotteryPrize,
            "job_scam" => ScamType::JobScam,
            "investment_scam" => ScamType::InvestmentScam,
            "tech_support" => ScamType::TechSupport,
            "romance_scam" => ScamType::RomanceScam,
            "impersonation" => ScamType::Impersonation,
            "qr_code_scam" => ScamType::QrCodeScam,
            "otp_fraud" => ScamType::OtpFraud,
            "fake_app" => ScamType::FakeApp,
            "crypto_scam" => ScamType::CryptoScam,
            "rental_scam" => ScamType::RentalScam,
            "delivery_scam" => ScamType::DeliveryScam,
            "charity_scam" => ScamType::CharityScam,
            _ => ScamType::Unknown,
        }
    }

    /// All wire values, in taxonomy order. Used to build the LLM tool schema.
    pub const ALL: [ScamType; 19] = [
        ScamType::Phishing,
        ScamType::Smishing,
        ScamType::VishingReference,
        ScamType::UpiFraud,
        ScamType::AdvanceFee,
        ScamType::LotteryPrize,
        ScamType::JobScam,
        ScamType::InvestmentScam,
        ScamType::TechSupport,
        ScamType::RomanceScam,
        ScamType::Impersonation,
        ScamType::QrCodeScam,
        ScamType::OtpFraud,
        ScamType::FakeApp,
        ScamType::CryptoScam,
        ScamType::RentalScam,
        ScamType::DeliveryScam,
        ScamType::CharityScam,
        ScamType::Unknown,
    ];
}

// ============================================
// Entities & Threat Sources
// ============================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    Url,
    Phone,
    Email,
    Upi,
    Crypto,
}

impl EntityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Url => "url",
            EntityType::Phone => "phone",
            EntityType::Email => "email",
            EntityType::Upi => "upi",
            EntityType::Crypto => "crypto",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThreatSource {
    GoogleSafeBrowsing,
    Phishtank,
    Urlhaus,
    Rdap,
}

impl ThreatSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThreatSource::GoogleSafeBrowsing => "google_safe_browsing",
            ThreatSource::Phishtank => "phishtank",
            ThreatSource::Urlhaus => "urlhaus",
            ThreatSource::Rdap => "rdap",
        }
    }
}

// ============================================
// Request Classification
// ============================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Text,
    Image,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Text => "text",
            ContentType::Image => "image",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Sms,
    Whatsapp,
    Email,
    SocialDm,
    Website,
    Other,
}

impl Channel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Sms => "sms",
            Channel::Whatsapp => "whatsapp",
            Channel::Email => "email",
            Channel::SocialDm => "social_dm",
            Channel::Website => "website",
            Channel::Other => "other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanCategory {
    ScamCheck,
    JobOffer,
    RentalLease,
    Investment,
    Contract,
    Auto,
}

impl Default for ScanCategory {
    fn default() -> Self {
        ScanCategory::ScamCheck
    }
}

impl ScanCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScanCategory::ScamCheck => "scam_check",
            ScanCategory::JobOffer => "job_offer",
            ScanCategory::RentalLease => "rental_lease",
            ScanCategory::Investment => "investment",
            ScanCategory::Contract => "contract",
            ScanCategory::Auto => "auto",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn risk_bands_partition_0_to_100() {
        // Every score maps to exactly one of the five bands, no gaps.
        for score in 0u8..=100 {
            let level = RiskLevel::from_score(score);
            let expected = match score {
                0..=19 => RiskLevel::None,
                20..=39 => RiskLevel::Low,
                40..=59 => RiskLevel::Medium,
                60..=79 => RiskLevel::High,
                _ => RiskLevel::Critical,
            };
            assert_eq!(level, expected, "score {}", score);
        }
    }

    #[test]
    fn risk_band_boundaries() {
        assert_eq!(RiskLevel::from_score(19), RiskLevel::None);
        assert_eq!(RiskLevel::from_score(20), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(39), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(40), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(59), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(60), RiskLevel::High);
        assert_eq!(RiskLevel::from_score(79), RiskLevel::High);
        assert_eq!(RiskLevel::from_score(80), RiskLevel::Critical);
        assert_eq!(RiskLevel::from_score(100), RiskLevel::Critical);
    }

    #[test]
    fn insufficient_never_derived_from_score() {
        for score in 0u8..=100 {
            assert_ne!(RiskLevel::from_score(score), RiskLevel::Insufficient);
        }
    }

    #[test]
    fn scam_type_round_trips_through_wire_form() {
        for st in ScamType::ALL {
            assert_eq!(ScamType::parse_or_unknown(st.as_str()), st);
        }
        assert_eq!(ScamType::parse_or_unknown("nigerian_prince"), ScamType::Unknown);
    }
}
