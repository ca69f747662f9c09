//! 数据仓储层
//!
//! 服务层只依赖 `traits` 中的接口，具体实现有两套：
//!
//! - `Pg*Repository`：基于 SQLx 的 PostgreSQL 实现，用于生产环境
//! - `InMemoryStore`：基于 DashMap 的内存实现，用于测试和演示环境
//!
//! 仓储只负责数据持久化，不包含业务规则。

mod coupon_repo;
mod memory_store;
mod player_coupon_repo;
mod reward_repo;
mod traits;

pub use coupon_repo::PgCouponRepository;
pub use memory_store::{InMemoryStore, SeedData};
pub use player_coupon_repo::PgPlayerCouponRepository;
pub use reward_repo::PgRewardRepository;
pub use traits::*;
