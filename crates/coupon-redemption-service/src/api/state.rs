//! 应用状态定义

use std::sync::Arc;

use redeem_shared::database::Database;

use crate::service::RedemptionService;

/// Axum 应用共享状态
#[derive(Clone)]
pub struct AppState {
    pub redemption_service: Arc<RedemptionService>,
    /// 内存存储模式下为 None
    pub database: Option<Database>,
    pub service_name: String,
}

impl AppState {
    pub fn new(
        redemption_service: Arc<RedemptionService>,
        database: Option<Database>,
        service_name: impl Into<String>,
    ) -> Self {
        Self {
            redemption_service,
            database,
            service_name: service_name.into(),
        }
    }
}
