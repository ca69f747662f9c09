//! 奖励活动实体

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 奖励活动
///
/// 活动在 `[start_date, end_date]` 闭区间内可兑换，
/// 每个玩家每天最多兑换 `per_day_limit` 张，累计最多 `total_limit` 张。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Reward {
    pub id: i64,
    pub name: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    /// 每日兑换上限
    pub per_day_limit: i32,
    /// 累计兑换上限
    pub total_limit: i32,
}

/// 活动相对于某一时刻所处的阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewardWindow {
    NotStarted,
    Active,
    Expired,
}

impl Reward {
    /// 判断活动在 `now` 时刻所处的阶段，起止时刻均视为有效
    pub fn window_at(&self, now: DateTime<Utc>) -> RewardWindow {
        if now < self.start_date {
            RewardWindow::NotStarted
        } else if now > self.end_date {
            RewardWindow::Expired
        } else {
            RewardWindow::Active
        }
    }
}
