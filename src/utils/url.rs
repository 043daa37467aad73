// URL extraction and domain helpers

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

static URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?i)https?://[^\s<>"')\]]+|www\.[^\s<>"')\]]+|(?:bit\.ly|t\.co|goo\.gl|tinyurl\.com|is\.gd)/[a-zA-Z0-9]+"#,
    )
    .expect("url regex")
});

/// Known URL shorteners - these get matched even without a scheme or
/// www prefix, since scam messages rarely bother with either.
const SHORTENERS: &[&str] = &[
    "bit.ly",
    "t.co",
    "goo.gl",
    "tinyurl.com",
    "is.gd",
    "ow.ly",
    "buff.ly",
    "tiny.cc",
    "rb.gy",
    "cutt.ly",
    "shorturl.at",
];

// Country-code suffixes that register domains at the third level
// (e.g. sbi.co.in, example.co.uk). Not a full public-suffix list, but
// covers the TLDs this service actually sees.
const SECOND_LEVEL_SUFFIXES: &[&str] = &[
    "co.in", "net.in", "org.in", "gov.in", "ac.in", "co.uk", "org.uk", "ac.uk", "gov.uk",
    "com.au", "net.au", "org.au", "co.nz", "com.sg", "com.my", "co.za", "com.br",
];

/// Extract URLs from text, normalized with a scheme and deduplicated
/// preserving first occurrence.
pub fn extract_urls(text: &str) -> Vec<String> {
    let mut seen = Vec::new();
    for m in URL_RE.find_iter(text) {
        let raw = m.as_str();
        let mut url = if raw.starts_with("http://") || raw.starts_with("https://") {
            raw.to_string()
        } else {
            format!("http://{}", raw)
        };
        while url.ends_with(['.', ',', ';', ':', '!', '?', ')']) {
            url.pop();
        }
        if !seen.contains(&url) {
            seen.push(url);
        }
    }
    seen
}

/// Extract the registrable domain from a URL ("https://a.b.sbi.co.in/x"
/// -> "sbi.co.in"). Falls back to the full hostname when parsing fails.
pub fn registrable_domain(url: &str) -> String {
    let host = match Url::parse(url) {
        Ok(parsed) => match parsed.host_str() {
            Some(h) => h.to_lowercase(),
            None => return String::new(),
        },
        Err(_) => return String::new(),
    };

    let labels: Vec<&str> = host.split('.').collect();
    if labels.len() <= 2 {
        return host;
    }

    let last_two = labels[labels.len() - 2..].join(".");
    if SECOND_LEVEL_SUFFIXES.contains(&last_two.as_str()) {
        labels[labels.len() - 3..].join(".")
    } else {
        last_two
    }
}

/// Check if a URL is from a known URL shortener.
pub fn is_shortened_url(url: &str) -> bool {
    let domain = registrable_domain(url);
    SHORTENERS.contains(&domain.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_and_normalizes_urls() {
        let urls = extract_urls(
            "Click https://evil.example.com/login now! Or www.sketchy.in/kyc. Also bit.ly/x9Kq2",
        );
        assert_eq!(
            urls,
            vec![
                "https://evil.example.com/login",
                "http://www.sketchy.in/kyc",
                "http://bit.ly/x9Kq2",
            ]
        );
    }

    #[test]
    fn dedup_preserves_first_occurrence() {
        let urls = extract_urls("see https://a.com/x and again https://a.com/x then https://b.com");
        assert_eq!(urls, vec!["https://a.com/x", "https://b.com"]);
    }

    #[test]
    fn registrable_domain_handles_subdomains_and_cctlds() {
        assert_eq!(registrable_domain("https://login.secure.evil.com/a"), "evil.com");
        assert_eq!(registrable_domain("https://netbanking.sbi.co.in/"), "sbi.co.in");
        assert_eq!(registrable_domain("https://example.com"), "example.com");
        assert_eq!(registrable_domain("not a url"), "");
    }

    #[test]
    fn shortener_detection() {
        assert!(is_shortened_url("http://bit.ly/abc"));
        assert!(!is_shortened_url("https://example.com/bit.ly"));
    }
}
