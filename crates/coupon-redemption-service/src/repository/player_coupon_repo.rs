//! 兑换记录仓储
//!
//! 兑换次数统计通过关联 coupons 表按活动过滤

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::debug;

use super::traits::{AssignOutcome, PlayerCouponRepository};
use crate::error::Result;
use crate::models::{PlayerCoupon, RedeemedCoupon};

/// 兑换记录仓储（PostgreSQL）
pub struct PgPlayerCouponRepository {
    pool: PgPool,
}

impl PgPlayerCouponRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PlayerCouponRepository for PgPlayerCouponRepository {
    async fn count_by_reward_between(
        &self,
        player_id: i64,
        reward_id: i64,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) as count
            FROM player_coupons pc
            JOIN coupons c ON c.id = pc.coupon_id
            WHERE pc.player_id = $1 AND c.reward_id = $2
              AND pc.redeemed_at >= $3 AND pc.redeemed_at < $4
            "#,
        )
        .bind(player_id)
        .bind(reward_id)
        .bind(from)
        .bind(to)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn count_by_reward(&self, player_id: i64, reward_id: i64) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) as count
            FROM player_coupons pc
            JOIN coupons c ON c.id = pc.coupon_id
            WHERE pc.player_id = $1 AND c.reward_id = $2
            "#,
        )
        .bind(player_id)
        .bind(reward_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    /// 依赖 coupon_id 唯一约束，冲突时不插入也不报错
    async fn assign(
        &self,
        player_id: i64,
        coupon_id: i64,
        redeemed_at: DateTime<Utc>,
    ) -> Result<AssignOutcome> {
        let record = sqlx::query_as::<_, PlayerCoupon>(
            r#"
            INSERT INTO player_coupons (player_id, coupon_id, redeemed_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (coupon_id) DO NOTHING
            RETURNING id, player_id, coupon_id, redeemed_at
            "#,
        )
        .bind(player_id)
        .bind(coupon_id)
        .bind(redeemed_at)
        .fetch_optional(&self.pool)
        .await?;

        match record {
            Some(record) => Ok(AssignOutcome::Assigned(record)),
            None => {
                debug!(player_id, coupon_id, "Coupon already assigned");
                Ok(AssignOutcome::CouponTaken)
            }
        }
    }

    async fn list_by_player(&self, player_id: i64) -> Result<Vec<RedeemedCoupon>> {
        let coupons = sqlx::query_as::<_, RedeemedCoupon>(
            r#"
            SELECT pc.coupon_id, c.value, c.reward_id, pc.redeemed_at
            FROM player_coupons pc
            JOIN coupons c ON c.id = pc.coupon_id
            WHERE pc.player_id = $1
            ORDER BY pc.redeemed_at DESC, pc.id DESC
            "#,
        )
        .bind(player_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(coupons)
    }
}
