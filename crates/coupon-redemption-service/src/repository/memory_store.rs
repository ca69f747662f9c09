//! 内存存储
//!
//! 使用 DashMap 实现的并发安全存储，同时实现三个仓储接口，适用于测试和演示环境。

use std::path::Path;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use serde::Deserialize;

use super::traits::{AssignOutcome, CouponRepository, PlayerCouponRepository, RewardRepository};
use crate::error::{RedemptionError, Result};
use crate::models::{Coupon, Player, PlayerCoupon, RedeemedCoupon, Reward};

/// 内存存储的种子数据
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SeedData {
    pub players: Vec<Player>,
    pub rewards: Vec<Reward>,
    pub coupons: Vec<Coupon>,
}

impl SeedData {
    /// 从 JSON 文件读取种子数据
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            RedemptionError::Internal(format!("读取种子文件失败 {}: {}", path.display(), e))
        })?;
        serde_json::from_str(&content).map_err(|e| {
            RedemptionError::Internal(format!("解析种子文件失败 {}: {}", path.display(), e))
        })
    }
}

/// 内存存储
///
/// 兑换记录以 coupon_id 为键保存，通过 entry API 保证同一张优惠券只会被分配一次。
#[derive(Debug)]
pub struct InMemoryStore {
    players: DashMap<i64, Player>,
    rewards: DashMap<i64, Reward>,
    coupons: DashMap<i64, Coupon>,
    /// coupon_id -> 兑换记录
    assignments: DashMap<i64, PlayerCoupon>,
    next_assignment_id: AtomicI64,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            players: DashMap::new(),
            rewards: DashMap::new(),
            coupons: DashMap::new(),
            assignments: DashMap::new(),
            next_assignment_id: AtomicI64::new(1),
        }
    }

    /// 写入玩家，id 相同时覆盖
    pub fn insert_player(&self, player: Player) {
        self.players.insert(player.id, player);
    }

    /// 写入奖励活动，id 相同时覆盖
    pub fn insert_reward(&self, reward: Reward) {
        self.rewards.insert(reward.id, reward);
    }

    /// 写入优惠券，id 相同时覆盖
    pub fn insert_coupon(&self, coupon: Coupon) {
        self.coupons.insert(coupon.id, coupon);
    }

    /// 批量写入种子数据
    pub fn seed(&self, data: SeedData) {
        data.players.into_iter().for_each(|p| self.insert_player(p));
        data.rewards.into_iter().for_each(|r| self.insert_reward(r));
        data.coupons.into_iter().for_each(|c| self.insert_coupon(c));
    }

    /// (玩家数, 活动数, 优惠券数)
    pub fn counts(&self) -> (usize, usize, usize) {
        (self.players.len(), self.rewards.len(), self.coupons.len())
    }

    /// 全部兑换记录，按记录 id 升序
    pub fn assignments(&self) -> Vec<PlayerCoupon> {
        let mut records: Vec<PlayerCoupon> = self
            .assignments
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        records.sort_by_key(|r| r.id);
        records
    }

    fn reward_of(&self, coupon_id: i64) -> Option<i64> {
        self.coupons.get(&coupon_id).map(|c| c.reward_id)
    }

    fn count_matching<F>(&self, player_id: i64, reward_id: i64, predicate: F) -> i64
    where
        F: Fn(&PlayerCoupon) -> bool,
    {
        let matching: Vec<i64> = self
            .assignments
            .iter()
            .filter(|entry| entry.player_id == player_id && predicate(entry.value()))
            .map(|entry| entry.coupon_id)
            .collect();

        matching
            .into_iter()
            .filter(|coupon_id| self.reward_of(*coupon_id) == Some(reward_id))
            .count() as i64
    }
}

#[async_trait]
impl RewardRepository for InMemoryStore {
    async fn find_reward(&self, reward_id: i64) -> Result<Option<Reward>> {
        Ok(self.rewards.get(&reward_id).map(|r| r.clone()))
    }
}

#[async_trait]
impl PlayerCouponRepository for InMemoryStore {
    async fn count_by_reward_between(
        &self,
        player_id: i64,
        reward_id: i64,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<i64> {
        Ok(self.count_matching(player_id, reward_id, |record| {
            record.redeemed_at >= from && record.redeemed_at < to
        }))
    }

    async fn count_by_reward(&self, player_id: i64, reward_id: i64) -> Result<i64> {
        Ok(self.count_matching(player_id, reward_id, |_| true))
    }

    async fn assign(
        &self,
        player_id: i64,
        coupon_id: i64,
        redeemed_at: DateTime<Utc>,
    ) -> Result<AssignOutcome> {
        match self.assignments.entry(coupon_id) {
            Entry::Occupied(_) => Ok(AssignOutcome::CouponTaken),
            Entry::Vacant(slot) => {
                let record = PlayerCoupon {
                    id: self.next_assignment_id.fetch_add(1, Ordering::SeqCst),
                    player_id,
                    coupon_id,
                    redeemed_at,
                };
                slot.insert(record.clone());
                Ok(AssignOutcome::Assigned(record))
            }
        }
    }

    async fn list_by_player(&self, player_id: i64) -> Result<Vec<RedeemedCoupon>> {
        let mut records: Vec<PlayerCoupon> = self
            .assignments
            .iter()
            .filter(|entry| entry.player_id == player_id)
            .map(|entry| entry.value().clone())
            .collect();
        records.sort_by(|a, b| b.redeemed_at.cmp(&a.redeemed_at).then(b.id.cmp(&a.id)));

        Ok(records
            .into_iter()
            .filter_map(|record| {
                self.coupons.get(&record.coupon_id).map(|coupon| RedeemedCoupon {
                    coupon_id: coupon.id,
                    value: coupon.value.clone(),
                    reward_id: coupon.reward_id,
                    redeemed_at: record.redeemed_at,
                })
            })
            .collect())
    }
}

#[async_trait]
impl CouponRepository for InMemoryStore {
    async fn find_unassigned(&self, reward_id: i64) -> Result<Option<Coupon>> {
        let candidates: Vec<Coupon> = self
            .coupons
            .iter()
            .filter(|entry| entry.reward_id == reward_id)
            .map(|entry| entry.value().clone())
            .collect();

        Ok(candidates
            .into_iter()
            .filter(|coupon| !self.assignments.contains_key(&coupon.id))
            .min_by_key(|coupon| coupon.id))
    }
}
