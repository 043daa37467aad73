use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::services::scan_service::ScanService;

pub mod card;
pub mod health;
pub mod routes;
pub mod scan;

// ============================================
// Application State
// ============================================

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Arc<Config>,
    pub scans: ScanService,
}

impl AppState {
    pub fn new(db: PgPool, config: Arc<Config>) -> anyhow::Result<Self> {
        let scans = ScanService::new(db.clone(), config.clone())?;
        Ok(Self { db, config, scans })
    }
}
