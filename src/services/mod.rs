pub mod abuse;
pub mod action_engine;
pub mod classifier;
pub mod entity_extractor;
pub mod ocr;
pub mod scam_card;
pub mod scan_service;
pub mod threat_intel;

/// Failures the pipeline cannot absorb. Provider trouble (threat intel,
/// LLM, card creation) degrades in place and never reaches this enum;
/// a scan that cannot be persisted or an image that cannot be OCR'd is
/// a real request failure.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("OCR failed: {0}")]
    Ocr(String),
}
