//! 优惠券兑换服务
//!
//! 处理玩家兑换优惠券的核心业务逻辑，包括：
//! - 奖励活动有效期检查
//! - 每日、累计兑换上限检查
//! - 挑选并分配一张未使用的优惠券
//!
//! ## 兑换流程
//!
//! 1. 获取 (玩家, 活动) 锁 -> 2. 活动有效期 -> 3. 每日上限 -> 4. 累计上限
//!    -> 5. 挑选优惠券 -> 6. 写入兑换记录 -> 7. 释放锁
//!
//! 第 6 步与其他玩家并发抢到同一张优惠券时，重新挑选，最多尝试
//! `max_assign_attempts` 次。

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, FixedOffset, Offset, Utc};
use redeem_shared::config::RedemptionSettings;
use redeem_shared::observability::metrics::record_coupon_redemption;
use tracing::{info, instrument, warn};

use crate::clock::{Clock, day_window};
use crate::error::{RedemptionError, Result};
use crate::lock::{LockManager, redeem_lock_key};
use crate::models::{Coupon, RedeemedCoupon, Reward, RewardWindow};
use crate::repository::{
    AssignOutcome, CouponRepository, PlayerCouponRepository, RewardRepository,
};

/// 兑换业务参数
#[derive(Debug, Clone)]
pub struct RedemptionConfig {
    /// 划分"当天"使用的参考时区
    pub day_offset: FixedOffset,
    /// 优惠券被抢占时的最大挑选次数
    pub max_assign_attempts: u32,
}

impl Default for RedemptionConfig {
    fn default() -> Self {
        Self {
            day_offset: Utc.fix(),
            max_assign_attempts: 3,
        }
    }
}

impl RedemptionConfig {
    pub fn from_settings(settings: &RedemptionSettings) -> Result<Self> {
        let day_offset = FixedOffset::east_opt(settings.utc_offset_seconds).ok_or_else(|| {
            RedemptionError::Internal(format!(
                "utc_offset_seconds 超出范围: {}",
                settings.utc_offset_seconds
            ))
        })?;

        Ok(Self {
            day_offset,
            max_assign_attempts: settings.max_assign_attempts.max(1),
        })
    }
}

/// 优惠券兑换服务
pub struct RedemptionService {
    reward_repo: Arc<dyn RewardRepository>,
    player_coupon_repo: Arc<dyn PlayerCouponRepository>,
    coupon_repo: Arc<dyn CouponRepository>,
    lock_manager: Arc<LockManager>,
    clock: Arc<dyn Clock>,
    config: RedemptionConfig,
}

impl RedemptionService {
    pub fn new(
        reward_repo: Arc<dyn RewardRepository>,
        player_coupon_repo: Arc<dyn PlayerCouponRepository>,
        coupon_repo: Arc<dyn CouponRepository>,
        lock_manager: Arc<LockManager>,
        clock: Arc<dyn Clock>,
        config: RedemptionConfig,
    ) -> Self {
        Self {
            reward_repo,
            player_coupon_repo,
            coupon_repo,
            lock_manager,
            clock,
            config,
        }
    }

    /// 兑换一张优惠券
    ///
    /// 成功时返回分配给玩家的优惠券；任何一步校验失败都不会产生兑换记录。
    #[instrument(skip(self))]
    pub async fn redeem(&self, player_id: i64, reward_id: i64) -> Result<Coupon> {
        let started = Instant::now();

        let result = self.redeem_exclusive(player_id, reward_id).await;

        let outcome = match &result {
            Ok(_) => "success",
            Err(e) => e.outcome(),
        };
        record_coupon_redemption(outcome, started.elapsed().as_secs_f64());

        match &result {
            Ok(coupon) => info!(coupon_id = coupon.id, "优惠券兑换成功"),
            Err(e) if e.is_business_error() => info!(reason = %e, "兑换被拒绝"),
            Err(e) => warn!(error = %e, "兑换失败"),
        }

        result
    }

    /// 查询玩家兑换历史，按兑换时间倒序
    #[instrument(skip(self))]
    pub async fn list_player_coupons(&self, player_id: i64) -> Result<Vec<RedeemedCoupon>> {
        self.player_coupon_repo.list_by_player(player_id).await
    }

    /// 在 (玩家, 活动) 锁内执行兑换
    async fn redeem_exclusive(&self, player_id: i64, reward_id: i64) -> Result<Coupon> {
        let guard = self
            .lock_manager
            .acquire(&redeem_lock_key(player_id, reward_id))
            .await?;

        let result = self.redeem_locked(player_id, reward_id).await;

        if let Err(e) = guard.release().await {
            warn!(error = %e, "Failed to release redemption lock");
        }

        result
    }

    async fn redeem_locked(&self, player_id: i64, reward_id: i64) -> Result<Coupon> {
        let now = self.clock.now();

        let reward = self.validate_reward(reward_id, now).await?;
        self.validate_limits(player_id, &reward, now).await?;
        self.assign_coupon(player_id, &reward, now).await
    }

    /// 校验活动存在且处于有效期内
    async fn validate_reward(&self, reward_id: i64, now: DateTime<Utc>) -> Result<Reward> {
        let reward = self
            .reward_repo
            .find_reward(reward_id)
            .await?
            .ok_or(RedemptionError::InvalidReward { reward_id })?;

        match reward.window_at(now) {
            RewardWindow::NotStarted => Err(RedemptionError::RewardNotStarted { reward_id }),
            RewardWindow::Expired => Err(RedemptionError::RewardExpired { reward_id }),
            RewardWindow::Active => Ok(reward),
        }
    }

    /// 先校验每日上限，再校验累计上限
    async fn validate_limits(
        &self,
        player_id: i64,
        reward: &Reward,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let today = day_window(now, self.config.day_offset);
        let daily = self
            .player_coupon_repo
            .count_by_reward_between(player_id, reward.id, today.start, today.end)
            .await?;
        if daily >= i64::from(reward.per_day_limit) {
            return Err(RedemptionError::DailyLimitExceeded {
                reward_id: reward.id,
                limit: reward.per_day_limit,
            });
        }

        let total = self
            .player_coupon_repo
            .count_by_reward(player_id, reward.id)
            .await?;
        if total >= i64::from(reward.total_limit) {
            return Err(RedemptionError::TotalLimitExceeded {
                reward_id: reward.id,
                limit: reward.total_limit,
            });
        }

        Ok(())
    }

    /// 挑选并分配一张未使用的优惠券
    async fn assign_coupon(
        &self,
        player_id: i64,
        reward: &Reward,
        now: DateTime<Utc>,
    ) -> Result<Coupon> {
        let no_coupon = || RedemptionError::NoCouponAvailable {
            reward_id: reward.id,
        };

        for attempt in 1..=self.config.max_assign_attempts {
            let coupon = self
                .coupon_repo
                .find_unassigned(reward.id)
                .await?
                .ok_or_else(no_coupon)?;

            match self
                .player_coupon_repo
                .assign(player_id, coupon.id, now)
                .await?
            {
                AssignOutcome::Assigned(record) => {
                    info!(
                        coupon_id = coupon.id,
                        player_coupon_id = record.id,
                        attempt = attempt,
                        "Coupon assigned"
                    );
                    return Ok(coupon);
                }
                AssignOutcome::CouponTaken => {
                    warn!(
                        coupon_id = coupon.id,
                        attempt = attempt,
                        "Coupon taken by a concurrent redemption, selecting another"
                    );
                }
            }
        }

        Err(no_coupon())
    }
}
