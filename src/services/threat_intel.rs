// Concurrent threat-intelligence fan-out

use std::time::{Duration, Instant};

use serde_json::{Value, json};
use tokio::task::JoinSet;

use crate::models::scan::EvidenceItem;
use crate::models::taxonomy::ThreatSource;
use crate::utils::url::registrable_domain;

// ============================================
// Configuration Constants
// ============================================

/// Timeout for a single source lookup
const PER_SOURCE_TIMEOUT_SECS: u64 = 3;

/// Deadline for the whole fan-out. When it elapses, in-flight checks are
/// abandoned and whatever completed is returned.
const AGGREGATE_TIMEOUT_SECS: u64 = 5;

const SAFE_BROWSING_URL: &str = "https://safebrowsing.googleapis.com/v4/threatMatches:find";
const PHISHTANK_URL: &str = "https://checkurl.phishtank.com/checkurl/";
const URLHAUS_URL: &str = "https://urlhaus-api.abuse.ch/v1/url/";
const RDAP_URL: &str = "https://rdap.org/domain";

// ============================================
// Result Type
// ============================================

/// Outcome of one source lookup. `error` is internal bookkeeping only:
/// errored checks are logged and dropped before the aggregate result is
/// returned, never surfaced to callers.
#[derive(Debug, Clone)]
pub struct ThreatCheckResult {
    pub source: ThreatSource,
    pub is_threat: bool,
    pub threat_type: Option<String>,
    pub confidence: f32,
    pub details: Value,
    pub response_time_ms: i32,
    error: Option<String>,
}

impl ThreatCheckResult {
    fn clean(source: ThreatSource) -> Self {
        Self {
            source,
            is_threat: false,
            threat_type: None,
            confidence: 0.0,
            details: json!({}),
            response_time_ms: 0,
            error: None,
        }
    }
}

/// Convert completed threat checks to evidence items for the scan response.
pub fn results_to_evidence(results: &[ThreatCheckResult]) -> Vec<EvidenceItem> {
    results
        .iter()
        .map(|r| EvidenceItem {
            source: r.source.as_str().to_string(),
            detail: r.details["summary"]
                .as_str()
                .map(str::to_string)
                .unwrap_or_else(|| format!("Checked via {}", r.source.as_str())),
            is_threat: r.is_threat,
            confidence: Some(r.confidence),
        })
        .collect()
}

// ============================================
// Aggregator
// ============================================

#[derive(Debug, Clone, Default)]
pub struct ThreatIntelConfig {
    pub safe_browsing_key: Option<String>,
    pub phishtank_key: Option<String>,
    pub urlhaus_enabled: bool,
}

#[derive(Clone)]
pub struct ThreatIntel {
    http: reqwest::Client,
    cfg: ThreatIntelConfig,
}

impl ThreatIntel {
    pub fn new(cfg: ThreatIntelConfig) -> Result<Self, reqwest::Error> {
        // The client-level timeout backstops the per-call timeout wrappers.
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(PER_SOURCE_TIMEOUT_SECS))
            .build()?;
        Ok(Self { http, cfg })
    }

    /// Run every configured source against every url, plus a
    /// registration-age check per domain, all concurrently. One slow or
    /// failing source never delays the rest: each check has its own
    /// timeout, the whole batch has a deadline, and failures are dropped.
    /// Result ordering across sources is unspecified.
    pub async fn check_all(
        &self,
        urls: &[String],
        domains: Option<Vec<String>>,
    ) -> Vec<ThreatCheckResult> {
        let domains = domains.unwrap_or_else(|| {
            let mut distinct = Vec::new();
            for url in urls {
                let d = registrable_domain(url);
                if !d.is_empty() && !distinct.contains(&d) {
                    distinct.push(d);
                }
            }
            distinct
        });

        if urls.is_empty() && domains.is_empty() {
            return Vec::new();
        }

        let mut set = JoinSet::new();
        for url in urls {
            let this = self.clone();
            let u = url.clone();
            set.spawn(async move { this.check_safe_browsing(&u).await });

            let this = self.clone();
            let u = url.clone();
            set.spawn(async move { this.check_phishtank(&u).await });

            let this = self.clone();
            let u = url.clone();
            set.spawn(async move { this.check_urlhaus(&u).await });
        }
        for domain in domains {
            let this = self.clone();
            set.spawn(async move { this.check_domain_age(&domain).await });
        }

        collect_with_deadline(set, Duration::from_secs(AGGREGATE_TIMEOUT_SECS)).await
    }

    // ----------------------------------------
    // Sources
    // ----------------------------------------

    async fn check_safe_browsing(&self, url: &str) -> ThreatCheckResult {
        let start = Instant::now();
        let mut result = ThreatCheckResult::clean(ThreatSource::GoogleSafeBrowsing);

        let Some(key) = self.cfg.safe_browsing_key.as_deref() else {
            result.details = json!({"summary": "Google Safe Browsing not configured"});
            return result;
        };

        let body = json!({
            "client": {"clientId": "satark-api", "clientVersion": env!("CARGO_PKG_VERSION")},
            "threatInfo": {
                "threatTypes": [
                    "MALWARE",
                    "SOCIAL_ENGINEERING",
                    "UNWANTED_SOFTWARE",
                    "POTENTIALLY_HARMFUL_APPLICATION",
                ],
                "platformTypes": ["ANY_PLATFORM"],
                "threatEntryTypes": ["URL"],
                "threatEntries": [{"url": url}],
            },
        });

        match self
            .post_json(format!("{}?key={}", SAFE_BROWSING_URL, key), &body)
            .await
        {
            Ok(data) => {
                if let Some(m) = data["matches"].get(0) {
                    let threat_type =
                        m["threatType"].as_str().unwrap_or("unknown").to_string();
                    result.is_threat = true;
                    result.confidence = 0.95;
                    result.details = json!({
                        "summary": format!(
                            "URL flagged as {} by Google Safe Browsing", threat_type
                        ),
                        "threat_type": threat_type,
                    });
                    result.threat_type = Some(threat_type);
                } else {
                    result.details =
                        json!({"summary": "URL not found in Google Safe Browsing database"});
                }
            }
            Err(e) => {
                result.error = Some(e);
            }
        }

        result.response_time_ms = start.elapsed().as_millis() as i32;
        result
    }

    async fn check_phishtank(&self, url: &str) -> ThreatCheckResult {
        let start = Instant::now();
        let mut result = ThreatCheckResult::clean(ThreatSource::Phishtank);

        let Some(key) = self.cfg.phishtank_key.as_deref() else {
            result.details = json!({"summary": "PhishTank not configured"});
            return result;
        };

        let form = [("url", url), ("format", "json"), ("app_key", key)];
        match self.post_form(PHISHTANK_URL, &form).await {
            Ok(data) => {
                let r = &data["results"];
                if r["in_database"].as_bool().unwrap_or(false)
                    && r["valid"].as_bool().unwrap_or(false)
                {
                    let verified = r["verified"].as_bool().unwrap_or(false);
                    result.is_threat = true;
                    result.threat_type = Some("phishing".to_string());
                    result.confidence = if verified { 0.95 } else { 0.7 };
                    result.details = json!({
                        "summary": "URL found in PhishTank phishing database",
                        "verified": verified,
                        "phish_id": r["phish_id"],
                    });
                } else {
                    result.details = json!({"summary": "URL not found in PhishTank database"});
                }
            }
            Err(e) => {
                result.error = Some(e);
            }
        }

        result.response_time_ms = start.elapsed().as_millis() as i32;
        result
    }

    async fn check_urlhaus(&self, url: &str) -> ThreatCheckResult {
        let start = Instant::now();
        let mut result = ThreatCheckResult::clean(ThreatSource::Urlhaus);

        if !self.cfg.urlhaus_enabled {
            result.details = json!({"summary": "URLhaus not enabled"});
            return result;
        }

        match self.post_form(URLHAUS_URL, &[("url", url)]).await {
            Ok(data) => {
                if data["query_status"].as_str() == Some("listed") {
                    let threat = data["threat"].as_str().unwrap_or("malware").to_string();
                    result.is_threat = true;
                    result.confidence = 0.9;
                    result.details = json!({
                        "summary": format!("URL listed in URLhaus as distributing {}", threat),
                        "threat": threat,
                        "tags": data["tags"],
                    });
                    result.threat_type = Some(threat);
                } else {
                    result.details = json!({"summary": "URL not found in URLhaus database"});
                }
            }
            Err(e) => {
                result.error = Some(e);
            }
        }

        result.response_time_ms = start.elapsed().as_millis() as i32;
        result
    }

    /// Registration-age lookup via RDAP. Scam infrastructure is usually
    /// days old, so a very recent registration date is itself a signal.
    async fn check_domain_age(&self, domain: &str) -> ThreatCheckResult {
        let start = Instant::now();
        let mut result = ThreatCheckResult::clean(ThreatSource::Rdap);

        match self.get_json(format!("{}/{}", RDAP_URL, domain)).await {
            Ok(data) => {
                let age_days = registration_age_days(&data, chrono::Utc::now());
                apply_domain_age(&mut result, age_days);
            }
            Err(e) => {
                result.error = Some(e);
            }
        }

        result.response_time_ms = start.elapsed().as_millis() as i32;
        result
    }

    // ----------------------------------------
    // HTTP helpers
    // ----------------------------------------

    async fn post_json(&self, url: String, body: &Value) -> Result<Value, String> {
        let fut = async {
            let resp = self
                .http
                .post(&url)
                .json(body)
                .send()
                .await
                .map_err(|e| e.to_string())?;
            let resp = resp.error_for_status().map_err(|e| e.to_string())?;
            resp.json::<Value>().await.map_err(|e| e.to_string())
        };
        with_source_timeout(fut).await
    }

    async fn post_form(&self, url: &str, form: &[(&str, &str)]) -> Result<Value, String> {
        let fut = async {
            let resp = self
                .http
                .post(url)
                .form(form)
                .send()
                .await
                .map_err(|e| e.to_string())?;
            let resp = resp.error_for_status().map_err(|e| e.to_string())?;
            resp.json::<Value>().await.map_err(|e| e.to_string())
        };
        with_source_timeout(fut).await
    }

    async fn get_json(&self, url: String) -> Result<Value, String> {
        let fut = async {
            let resp = self.http.get(&url).send().await.map_err(|e| e.to_string())?;
            let resp = resp.error_for_status().map_err(|e| e.to_string())?;
            resp.json::<Value>().await.map_err(|e| e.to_string())
        };
        with_source_timeout(fut).await
    }
}

async fn with_source_timeout<F>(fut: F) -> Result<Value, String>
where
    F: std::future::Future<Output = Result<Value, String>>,
{
    match tokio::time::timeout(Duration::from_secs(PER_SOURCE_TIMEOUT_SECS), fut).await {
        Ok(r) => r,
        Err(_) => Err(format!("timed out after {}s", PER_SOURCE_TIMEOUT_SECS)),
    }
}

/// Drain the JoinSet until it is empty or the deadline passes. Errored
/// checks are logged and dropped; when the deadline hits, dropping the
/// set aborts everything still in flight and their eventual results are
/// discarded.
async fn collect_with_deadline(
    mut set: JoinSet<ThreatCheckResult>,
    deadline: Duration,
) -> Vec<ThreatCheckResult> {
    // tokio's clock, not std's, so the deadline cooperates with paused
    // time in tests.
    let until = tokio::time::Instant::now() + deadline;
    let mut results = Vec::new();

    loop {
        let remaining = until.saturating_duration_since(tokio::time::Instant::now());
        match tokio::time::timeout(remaining, set.join_next()).await {
            Ok(Some(Ok(result))) => {
                if let Some(err) = &result.error {
                    tracing::warn!(source = result.source.as_str(), "threat check failed: {}", err);
                } else {
                    results.push(result);
                }
            }
            Ok(Some(Err(e))) => {
                tracing::warn!("threat check task failed: {}", e);
            }
            Ok(None) => break,
            Err(_) => {
                tracing::warn!(
                    abandoned = set.len(),
                    "threat intel deadline reached, abandoning in-flight checks"
                );
                break;
            }
        }
    }

    results
}

// ============================================
// Domain Age Heuristic
// ============================================

/// Pull the registration event date out of an RDAP domain object and
/// return the age in days, if present.
fn registration_age_days(rdap: &Value, now: chrono::DateTime<chrono::Utc>) -> Option<i64> {
    let events = rdap["events"].as_array()?;
    let registered = events.iter().find_map(|e| {
        if e["eventAction"].as_str() == Some("registration") {
            e["eventDate"].as_str()
        } else {
            None
        }
    })?;
    let date = chrono::DateTime::parse_from_rfc3339(registered).ok()?;
    Some((now - date.with_timezone(&chrono::Utc)).num_days())
}

fn apply_domain_age(result: &mut ThreatCheckResult, age_days: Option<i64>) {
    match age_days {
        Some(age) if age < 7 => {
            result.is_threat = true;
            result.threat_type = Some("new_domain".to_string());
            result.confidence = 0.6;
            result.details = json!({
                "summary": format!("Domain registered {} days ago - very new, high risk", age),
                "domain_age_days": age,
            });
        }
        Some(age) if age < 30 => {
            result.is_threat = true;
            result.threat_type = Some("new_domain".to_string());
            result.confidence = 0.3;
            result.details = json!({
                "summary": format!("Domain registered {} days ago - relatively new", age),
                "domain_age_days": age,
            });
        }
        Some(age) => {
            result.details = json!({
                "summary": format!("Domain registered {} days ago", age),
                "domain_age_days": age,
            });
        }
        None => {
            result.details = json!({"summary": "Domain registration date not available"});
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unconfigured() -> ThreatIntel {
        ThreatIntel::new(ThreatIntelConfig {
            safe_browsing_key: None,
            phishtank_key: None,
            urlhaus_enabled: false,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn empty_input_returns_empty_list() {
        let intel = unconfigured();
        let results = intel.check_all(&[], None).await;
        assert!(results.is_empty());

        let results = intel.check_all(&[], Some(vec![])).await;
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn unconfigured_sources_return_clean_without_network() {
        let intel = unconfigured();
        let sb = intel.check_safe_browsing("http://example.com").await;
        assert!(!sb.is_threat);
        assert!(sb.error.is_none());
        assert!(sb.details["summary"].as_str().unwrap().contains("not configured"));

        let pt = intel.check_phishtank("http://example.com").await;
        assert!(!pt.is_threat);
        assert!(pt.error.is_none());

        let uh = intel.check_urlhaus("http://example.com").await;
        assert!(!uh.is_threat);
        assert!(uh.error.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_abandons_hung_checks() {
        let mut set = JoinSet::new();
        for _ in 0..4 {
            set.spawn(async {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                ThreatCheckResult::clean(ThreatSource::Urlhaus)
            });
        }
        set.spawn(async { ThreatCheckResult::clean(ThreatSource::Phishtank) });

        let results = collect_with_deadline(set, Duration::from_secs(5)).await;
        // Only the immediate task completes; the sleepers are abandoned.
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].source, ThreatSource::Phishtank);
    }

    #[tokio::test]
    async fn errored_checks_are_dropped_from_output() {
        let mut set = JoinSet::new();
        set.spawn(async {
            let mut r = ThreatCheckResult::clean(ThreatSource::Urlhaus);
            r.error = Some("connection refused".to_string());
            r
        });
        set.spawn(async { ThreatCheckResult::clean(ThreatSource::Rdap) });

        let results = collect_with_deadline(set, Duration::from_secs(5)).await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].source, ThreatSource::Rdap);
    }

    #[test]
    fn domain_age_thresholds() {
        let mut r = ThreatCheckResult::clean(ThreatSource::Rdap);
        apply_domain_age(&mut r, Some(3));
        assert!(r.is_threat);
        assert_eq!(r.confidence, 0.6);

        let mut r = ThreatCheckResult::clean(ThreatSource::Rdap);
        apply_domain_age(&mut r, Some(7));
        assert!(r.is_threat);
        assert_eq!(r.confidence, 0.3);

        let mut r = ThreatCheckResult::clean(ThreatSource::Rdap);
        apply_domain_age(&mut r, Some(29));
        assert!(r.is_threat);
        assert_eq!(r.confidence, 0.3);

        let mut r = ThreatCheckResult::clean(ThreatSource::Rdap);
        apply_domain_age(&mut r, Some(30));
        assert!(!r.is_threat);

        let mut r = ThreatCheckResult::clean(ThreatSource::Rdap);
        apply_domain_age(&mut r, None);
        assert!(!r.is_threat);
        assert!(
            r.details["summary"].as_str().unwrap().contains("not available")
        );
    }

    #[test]
    fn registration_age_parses_rdap_events() {
        let now = chrono::Utc::now();
        let recent = (now - chrono::Duration::days(5)).to_rfc3339();
        let rdap = json!({
            "events": [
                {"eventAction": "expiration", "eventDate": "2030-01-01T00:00:00Z"},
                {"eventAction": "registration", "eventDate": recent},
            ]
        });
        assert_eq!(registration_age_days(&rdap, now), Some(5));
        assert_eq!(registration_age_days(&json!({}), now), None);
    }

    #[test]
    fn evidence_carries_summary_and_flag() {
        let mut r = ThreatCheckResult::clean(ThreatSource::Urlhaus);
        r.is_threat = true;
        r.confidence = 0.9;
        r.details = json!({"summary": "URL listed in URLhaus as distributing malware"});

        let evidence = results_to_evidence(&[r]);
        assert_eq!(evidence.len(), 1);
        assert_eq!(evidence[0].source, "urlhaus");
        assert!(evidence[0].is_threat);
        assert_eq!(evidence[0].confidence, Some(0.9));
    }
}
