use std::sync::Arc;

use crate::accounts::store::UserStore;
use crate::compliance::scanner::ComplianceModel;
use crate::config::Config;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Account lookups. Default: PgUserStore.
    pub users: Arc<dyn UserStore>,
    /// Model backend for compliance scans. Default: LlmComplianceModel.
    pub scanner: Arc<dyn ComplianceModel>,
    pub config: Config,
}
