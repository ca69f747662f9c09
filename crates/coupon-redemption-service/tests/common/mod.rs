//! 测试辅助：基于内存存储和固定时钟构建服务

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, TimeZone, Utc};
use coupon_redemption::{
    clock::FixedClock,
    lock::{LockConfig, LockManager},
    models::{Coupon, Player, Reward},
    repository::InMemoryStore,
    service::{RedemptionConfig, RedemptionService},
};

pub const PLAYER_ID: i64 = 1;
pub const REWARD_ID: i64 = 1;

/// 测试默认时间：2024-06-15 12:00:00 UTC
pub fn test_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
}

pub struct TestContext {
    pub store: Arc<InMemoryStore>,
    pub clock: Arc<FixedClock>,
    pub service: Arc<RedemptionService>,
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_config(RedemptionConfig::default())
    }

    pub fn with_config(config: RedemptionConfig) -> Self {
        let store = Arc::new(InMemoryStore::new());
        let clock = Arc::new(FixedClock::new(test_now()));
        let lock_manager = Arc::new(LockManager::local(LockConfig {
            ttl: StdDuration::from_secs(5),
            retry_count: 200,
            retry_delay: StdDuration::from_millis(10),
        }));
        let service = Arc::new(RedemptionService::new(
            store.clone(),
            store.clone(),
            store.clone(),
            lock_manager,
            clock.clone(),
            config,
        ));

        store.insert_player(Player {
            id: PLAYER_ID,
            name: "player-1".to_string(),
        });

        Self {
            store,
            clock,
            service,
        }
    }

    /// 写入一个有效期覆盖测试时间前后 10 天的活动
    pub fn add_reward(&self, id: i64, per_day_limit: i32, total_limit: i32) {
        self.store.insert_reward(Reward {
            id,
            name: format!("reward-{}", id),
            start_date: test_now() - Duration::days(10),
            end_date: test_now() + Duration::days(10),
            per_day_limit,
            total_limit,
        });
    }

    /// 为活动写入 id 为 `ids` 的优惠券，券码为 C{id}
    pub fn add_coupons(&self, reward_id: i64, ids: impl IntoIterator<Item = i64>) {
        for id in ids {
            self.store.insert_coupon(Coupon {
                id,
                value: format!("C{}", id),
                reward_id,
            });
        }
    }

    pub fn add_player(&self, id: i64) {
        self.store.insert_player(Player {
            id,
            name: format!("player-{}", id),
        });
    }
}
