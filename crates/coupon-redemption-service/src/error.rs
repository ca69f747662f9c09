//! 兑换服务错误类型
//!
//! 业务错误的 Display 即为返回给调用方的提示文案

use thiserror::Error;

/// 兑换服务错误类型
#[derive(Debug, Error)]
pub enum RedemptionError {
    // === 业务错误 ===
    #[error("Invalid reward!")]
    InvalidReward { reward_id: i64 },

    #[error("Reward has not started!")]
    RewardNotStarted { reward_id: i64 },

    #[error("Reward has expired!")]
    RewardExpired { reward_id: i64 },

    #[error("Daily reward limit exceeded!")]
    DailyLimitExceeded { reward_id: i64, limit: i32 },

    #[error("Total reward limit exceeded!")]
    TotalLimitExceeded { reward_id: i64, limit: i32 },

    #[error("Coupon not found for this reward")]
    NoCouponAvailable { reward_id: i64 },

    // === 系统错误 ===
    #[error("数据库错误: {0}")]
    Database(#[from] sqlx::Error),

    #[error("资源被占用，请稍后重试: {resource}")]
    LockConflict { resource: String },

    #[error("内部错误: {0}")]
    Internal(String),
}

/// 兑换服务 Result 类型别名
pub type Result<T> = std::result::Result<T, RedemptionError>;

impl RedemptionError {
    /// 检查是否为业务错误（非系统错误）
    pub fn is_business_error(&self) -> bool {
        !matches!(
            self,
            Self::Database(_) | Self::LockConflict { .. } | Self::Internal(_)
        )
    }

    /// 获取错误码（用于 API 响应）
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidReward { .. } => "INVALID_REWARD",
            Self::RewardNotStarted { .. } => "REWARD_NOT_STARTED",
            Self::RewardExpired { .. } => "REWARD_EXPIRED",
            Self::DailyLimitExceeded { .. } => "DAILY_LIMIT_EXCEEDED",
            Self::TotalLimitExceeded { .. } => "TOTAL_LIMIT_EXCEEDED",
            Self::NoCouponAvailable { .. } => "NO_COUPON_AVAILABLE",
            Self::Database(_) => "DATABASE_ERROR",
            Self::LockConflict { .. } => "LOCK_CONFLICT",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// 指标标签中使用的结果名，即小写的错误码
    pub fn outcome(&self) -> &'static str {
        match self {
            Self::InvalidReward { .. } => "invalid_reward",
            Self::RewardNotStarted { .. } => "reward_not_started",
            Self::RewardExpired { .. } => "reward_expired",
            Self::DailyLimitExceeded { .. } => "daily_limit_exceeded",
            Self::TotalLimitExceeded { .. } => "total_limit_exceeded",
            Self::NoCouponAvailable { .. } => "no_coupon_available",
            Self::Database(_) => "database_error",
            Self::LockConflict { .. } => "lock_conflict",
            Self::Internal(_) => "internal_error",
        }
    }
}
