//! 仓储 Trait 定义
//!
//! 每个方法对应兑换流程中的一种查询，便于服务层依赖抽象并使用 mock 测试

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::models::{Coupon, PlayerCoupon, RedeemedCoupon, Reward};

/// 优惠券分配结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssignOutcome {
    /// 分配成功，返回新建的兑换记录
    Assigned(PlayerCoupon),
    /// 优惠券已被其他请求抢先分配
    CouponTaken,
}

/// 奖励活动仓储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RewardRepository: Send + Sync {
    async fn find_reward(&self, reward_id: i64) -> Result<Option<Reward>>;
}

/// 兑换记录仓储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PlayerCouponRepository: Send + Sync {
    /// 统计玩家在 `[from, to)` 内兑换该活动优惠券的次数
    async fn count_by_reward_between(
        &self,
        player_id: i64,
        reward_id: i64,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<i64>;

    /// 统计玩家累计兑换该活动优惠券的次数
    async fn count_by_reward(&self, player_id: i64, reward_id: i64) -> Result<i64>;

    /// 将优惠券分配给玩家
    ///
    /// 同一张优惠券只能被分配一次，重复分配返回 `CouponTaken` 而不是错误
    async fn assign(
        &self,
        player_id: i64,
        coupon_id: i64,
        redeemed_at: DateTime<Utc>,
    ) -> Result<AssignOutcome>;

    /// 玩家的兑换历史，按兑换时间倒序
    async fn list_by_player(&self, player_id: i64) -> Result<Vec<RedeemedCoupon>>;
}

/// 优惠券仓储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CouponRepository: Send + Sync {
    /// 查找该活动下任意一张尚未分配的优惠券
    async fn find_unassigned(&self, reward_id: i64) -> Result<Option<Coupon>>;
}
