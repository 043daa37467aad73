// Entity extraction: deterministic regex pass, optional LLM supplement

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::llm::LlmClient;
use crate::models::scan::EntitySet;
use crate::utils::url::extract_urls;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}").expect("email regex")
});

// UPI handles are name@provider with no TLD, restricted to the known
// provider suffixes so that plain email addresses never match.
static UPI_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b[a-zA-Z0-9._-]+@(?:upi|ybl|okhdfcbank|oksbi|okicici|okaxis|paytm|apl|ibl|axl|sbi|hdfcbank|icici|axisbank|kotak|indus|federal|idbi|rbl|boi|pnb|cnrb|citi|sc|dbs|hsbc|jio|freecharge|gpay|phonepe|amazon)\b",
    )
    .expect("upi regex")
});

static CRYPTO_RES: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [
        // Bitcoin (legacy base58)
        Regex::new(r"\b1[a-km-zA-HJ-NP-Z1-9]{25,34}\b").expect("btc regex"),
        // Ethereum
        Regex::new(r"\b0x[a-fA-F0-9]{40}\b").expect("eth regex"),
        // Tron
        Regex::new(r"\bT[a-zA-Z0-9]{33}\b").expect("tron regex"),
    ]
});

static PHONE_CANDIDATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\+?\d[\d()\s.-]{7,16}\d").expect("phone regex"));

/// Extract entities from text. Phase 1 is pure regex and always runs;
/// phase 2 asks the LLM for entities the patterns miss (obfuscated URLs,
/// numbers written with separators regex chokes on) and merges them in.
/// Phase 2 trouble of any kind degrades to phase-1 results.
pub async fn extract_entities(text: &str, llm: Option<&LlmClient>) -> EntitySet {
    let mut entities = extract_deterministic(text);

    if let Some(llm) = llm {
        match llm_extract(llm, text).await {
            Ok(supplement) => merge_entities(&mut entities, supplement),
            Err(e) => {
                tracing::warn!("LLM entity extraction failed, using regex results only: {}", e);
            }
        }
    }

    entities
}

/// Phase 1: pattern-based extraction. Deterministic - identical input
/// always yields an identical EntitySet.
pub fn extract_deterministic(text: &str) -> EntitySet {
    EntitySet {
        urls: extract_urls(text),
        phones: extract_phones(text),
        emails: dedup_matches(&EMAIL_RE, text),
        upi_ids: dedup_matches(&UPI_RE, text),
        crypto_addresses: extract_crypto_addresses(text),
    }
}

fn dedup_matches(re: &Regex, text: &str) -> Vec<String> {
    let mut seen = Vec::new();
    for m in re.find_iter(text) {
        let s = m.as_str().to_string();
        if !seen.contains(&s) {
            seen.push(s);
        }
    }
    seen
}

fn extract_crypto_addresses(text: &str) -> Vec<String> {
    let mut seen = Vec::new();
    for re in CRYPTO_RES.iter() {
        for m in re.find_iter(text) {
            let s = m.as_str().to_string();
            if !seen.contains(&s) {
                seen.push(s);
            }
        }
    }
    seen
}

// ============================================
// Phone Normalization
// ============================================

/// Extract phone numbers, trying each candidate against Indian and US
/// numbering plans and normalizing matches to E.164 before dedup.
fn extract_phones(text: &str) -> Vec<String> {
    let mut seen = Vec::new();
    for m in PHONE_CANDIDATE_RE.find_iter(text) {
        if let Some(normalized) = normalize_phone(m.as_str()) {
            if !seen.contains(&normalized) {
                seen.push(normalized);
            }
        }
    }
    seen
}

fn normalize_phone(candidate: &str) -> Option<String> {
    let has_plus = candidate.trim_start().starts_with('+');
    let digits: String = candidate.chars().filter(|c| c.is_ascii_digit()).collect();

    if has_plus {
        // Explicit country code: accept E.164-plausible lengths as-is.
        if (8..=15).contains(&digits.len()) {
            return Some(format!("+{}", digits));
        }
        return None;
    }

    let bytes = digits.as_bytes();
    match digits.len() {
        // Indian mobile: 10 digits starting 6-9
        10 if (b'6'..=b'9').contains(&bytes[0]) => Some(format!("+91{}", digits)),
        // US/NANP: 10 digits, area code starting 2-9
        10 if (b'2'..=b'9').contains(&bytes[0]) => Some(format!("+1{}", digits)),
        // Indian with leading trunk zero: 0 + mobile
        11 if bytes[0] == b'0' && (b'6'..=b'9').contains(&bytes[1]) => {
            Some(format!("+91{}", &digits[1..]))
        }
        // NANP with leading country code: 1 + 10 digits
        11 if bytes[0] == b'1' && (b'2'..=b'9').contains(&bytes[1]) => Some(format!("+{}", digits)),
        // Indian with country code but no plus: 91 + mobile
        12 if digits.starts_with("91") && (b'6'..=b'9').contains(&bytes[2]) => {
            Some(format!("+{}", digits))
        }
        _ => None,
    }
}

// ============================================
// LLM Supplement
// ============================================

fn extraction_tool() -> Value {
    serde_json::json!({
        "name": "extract_entities",
        "description": "Extract suspicious entities from the message for threat analysis.",
        "input_schema": {
            "type": "object",
            "properties": {
                "urls": {
                    "type": "array",
                    "items": {"type": "string"},
                    "description": "All URLs, links, and web addresses found in the message (including obfuscated ones)."
                },
                "phones": {
                    "type": "array",
                    "items": {"type": "string"},
                    "description": "All phone numbers found in the message."
                },
                "emails": {
                    "type": "array",
                    "items": {"type": "string"},
                    "description": "All email addresses found in the message."
                },
                "crypto_addresses": {
                    "type": "array",
                    "items": {"type": "string"},
                    "description": "All cryptocurrency wallet addresses found."
                },
                "upi_ids": {
                    "type": "array",
                    "items": {"type": "string"},
                    "description": "All UPI IDs found (format: name@bank)."
                }
            },
            "required": ["urls", "phones", "emails", "crypto_addresses", "upi_ids"]
        }
    })
}

async fn llm_extract(llm: &LlmClient, text: &str) -> anyhow::Result<EntitySet> {
    let tool = extraction_tool();
    let prompt = format!("Extract all entities from this message:\n\n{}", text);
    let input = llm.tool_call(None, &prompt, &tool, "extract_entities").await?;
    let entities: EntitySet = serde_json::from_value(input)?;
    Ok(entities)
}

/// Merge supplementary entities into the regex results. Exact-string
/// dedup; regex entries keep their positions ahead of LLM entries.
fn merge_entities(base: &mut EntitySet, supplement: EntitySet) {
    fn merge(into: &mut Vec<String>, from: Vec<String>) {
        for value in from {
            if !into.contains(&value) {
                into.push(value);
            }
        }
    }

    merge(&mut base.urls, supplement.urls);
    merge(&mut base.phones, supplement.phones);
    merge(&mut base.emails, supplement.emails);
    merge(&mut base.upi_ids, supplement.upi_ids);
    merge(&mut base.crypto_addresses, supplement.crypto_addresses);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic_extraction_is_repeatable() {
        let text = "Pay to merchant@paytm or visit https://kyc-update.example.in. \
                    Call +91 98765 43210 or email help@support-desk.com";
        let first = extract_deterministic(text);
        let second = extract_deterministic(text);
        assert_eq!(first, second);
        assert_eq!(first.urls, vec!["https://kyc-update.example.in"]);
        assert_eq!(first.upi_ids, vec!["merchant@paytm"]);
        assert_eq!(first.phones, vec!["+919876543210"]);
        assert_eq!(first.emails, vec!["help@support-desk.com"]);
    }

    #[test]
    fn upi_requires_known_provider_suffix() {
        let entities = extract_deterministic("send to victim@paytm and ignore user@randomco");
        assert_eq!(entities.upi_ids, vec!["victim@paytm"]);
    }

    #[test]
    fn phone_contexts_india_and_us() {
        assert_eq!(normalize_phone("9876543210"), Some("+919876543210".into()));
        assert_eq!(normalize_phone("09876543210"), Some("+919876543210".into()));
        assert_eq!(normalize_phone("919876543210"), Some("+919876543210".into()));
        assert_eq!(normalize_phone("(415) 555-2671"), Some("+14155552671".into()));
        assert_eq!(normalize_phone("1-415-555-2671"), Some("+14155552671".into()));
        assert_eq!(normalize_phone("+44 20 7946 0958"), Some("+442079460958".into()));
        // 10 digits starting 0-1 fit neither plan
        assert_eq!(normalize_phone("0123456789"), None);
    }

    #[test]
    fn crypto_address_formats() {
        let text = "BTC 1BvBMSEYstWetqTFn5Au4m4GFg7xJaNVN2 \
                    ETH 0x52908400098527886E0F7030069857D2E4169EE7 \
                    TRX TLa2f6VPqDgRE67v1736s7bJ8Ray5wYjU7";
        let entities = extract_deterministic(text);
        assert_eq!(entities.crypto_addresses.len(), 3);
        assert!(entities.crypto_addresses[0].starts_with('1'));
        assert!(entities.crypto_addresses[1].starts_with("0x"));
        assert!(entities.crypto_addresses[2].starts_with('T'));
    }

    #[test]
    fn merge_keeps_regex_entries_first_and_dedups() {
        let mut base = EntitySet {
            urls: vec!["https://a.com".into()],
            ..Default::default()
        };
        let supplement = EntitySet {
            urls: vec!["https://a.com".into(), "https://obfuscated.com".into()],
            phones: vec!["+919876543210".into()],
            ..Default::default()
        };
        merge_entities(&mut base, supplement);
        assert_eq!(base.urls, vec!["https://a.com", "https://obfuscated.com"]);
        assert_eq!(base.phones, vec!["+919876543210"]);
    }

    #[test]
    fn dedup_preserves_first_occurrence() {
        let entities = extract_deterministic("a@support.com b@support.com a@support.com");
        assert_eq!(entities.emails, vec!["a@support.com", "b@support.com"]);
    }
}
