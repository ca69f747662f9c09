//! 数据模型
//!
//! 与 migrations/ 中的表结构一一对应

mod coupon;
mod player;
mod reward;

pub use coupon::{Coupon, PlayerCoupon, RedeemedCoupon};
pub use player::Player;
pub use reward::{Reward, RewardWindow};
