//! 兑换锁
//!
//! 同一玩家对同一活动的兑换请求在锁内串行执行，保证上限校验与分配之间不被插入其他兑换。

mod lock_manager;

pub use lock_manager::{LockConfig, LockGuard, LockManager};

/// 兑换锁的 key
pub fn redeem_lock_key(player_id: i64, reward_id: i64) -> String {
    format!("coupon-redeem:{}:{}", player_id, reward_id)
}
