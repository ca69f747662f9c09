//! 优惠券仓储

use async_trait::async_trait;
use sqlx::PgPool;

use super::traits::CouponRepository;
use crate::error::Result;
use crate::models::Coupon;

/// 优惠券仓储（PostgreSQL）
pub struct PgCouponRepository {
    pool: PgPool,
}

impl PgCouponRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CouponRepository for PgCouponRepository {
    /// 按 id 升序取第一张未被兑换记录引用的优惠券
    async fn find_unassigned(&self, reward_id: i64) -> Result<Option<Coupon>> {
        let coupon = sqlx::query_as::<_, Coupon>(
            r#"
            SELECT c.id, c.value, c.reward_id
            FROM coupons c
            WHERE c.reward_id = $1
              AND NOT EXISTS (
                  SELECT 1 FROM player_coupons pc WHERE pc.coupon_id = c.id
              )
            ORDER BY c.id ASC
            LIMIT 1
            "#,
        )
        .bind(reward_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(coupon)
    }
}
