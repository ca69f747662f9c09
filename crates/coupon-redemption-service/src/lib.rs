//! 优惠券兑换服务
//!
//! 玩家凭奖励活动兑换一张优惠券，兑换前校验活动有效期以及每日、累计兑换上限。
//!
//! ## 模块结构
//!
//! - `models`: 玩家、奖励活动、优惠券、兑换记录等实体
//! - `repository`: 仓储接口及 PostgreSQL / 内存实现
//! - `lock`: 按 (玩家, 活动) 串行化兑换请求的锁管理器
//! - `service`: 兑换业务逻辑
//! - `api`: HTTP 接口层
//! - `clock`: 可注入的时钟与"当天"窗口计算

pub mod api;
pub mod clock;
pub mod error;
pub mod lock;
pub mod models;
pub mod repository;
pub mod service;

pub use error::{RedemptionError, Result};
