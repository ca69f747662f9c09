//! 奖励活动仓储

use async_trait::async_trait;
use sqlx::PgPool;

use super::traits::RewardRepository;
use crate::error::Result;
use crate::models::Reward;

/// 奖励活动仓储（PostgreSQL）
pub struct PgRewardRepository {
    pool: PgPool,
}

impl PgRewardRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RewardRepository for PgRewardRepository {
    async fn find_reward(&self, reward_id: i64) -> Result<Option<Reward>> {
        let reward = sqlx::query_as::<_, Reward>(
            r#"
            SELECT id, name, start_date, end_date, per_day_limit, total_limit
            FROM rewards
            WHERE id = $1
            "#,
        )
        .bind(reward_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(reward)
    }
}
