//! 业务服务层

mod redemption_service;

pub use redemption_service::{RedemptionConfig, RedemptionService};
