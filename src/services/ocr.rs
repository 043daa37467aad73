// OCR collaborator (Google Cloud Vision)

use std::time::Duration;

use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use serde_json::{Value, json};

const VISION_URL: &str = "https://vision.googleapis.com/v1/images:annotate";
const OCR_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, thiserror::Error)]
pub enum OcrError {
    #[error("OCR provider not configured")]
    NotConfigured,

    #[error("OCR request failed: {0}")]
    Request(#[from] reqwest::Error),
}

#[derive(Clone)]
pub struct OcrClient {
    http: reqwest::Client,
    api_key: Option<String>,
}

impl OcrClient {
    pub fn new(api_key: Option<String>) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(OCR_TIMEOUT_SECS))
            .build()?;
        Ok(Self { http, api_key })
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// Extract text from image bytes. Returns an empty string when the
    /// provider finds no text; that case is the caller's "insufficient
    /// data" short-circuit, not an error.
    pub async fn extract_text(&self, image: &[u8]) -> Result<String, OcrError> {
        let Some(key) = self.api_key.as_deref() else {
            return Err(OcrError::NotConfigured);
        };

        let body = json!({
            "requests": [{
                "image": {"content": BASE64.encode(image)},
                "features": [{"type": "TEXT_DETECTION"}],
            }]
        });

        let resp = self
            .http
            .post(format!("{}?key={}", VISION_URL, key))
            .json(&body)
            .send()
            .await?
            .error_for_status()?;

        let data: Value = resp.json().await?;
        let text = data["responses"][0]["textAnnotations"][0]["description"]
            .as_str()
            .unwrap_or("")
            .trim()
            .to_string();

        Ok(text)
    }
}
