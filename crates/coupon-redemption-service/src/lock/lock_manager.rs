//! 锁管理器
//!
//! 支持两种后端：进程内互斥锁（单实例部署）和基于 redemption_locks 表的数据库锁（多实例部署）。

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use redeem_shared::config::{LockBackendKind, LockSettings};
use sqlx::PgPool;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::error::{RedemptionError, Result};

type LocalLocks = Arc<DashMap<String, Arc<Mutex<()>>>>;

/// 锁配置
#[derive(Debug, Clone)]
pub struct LockConfig {
    /// 锁超时时间
    pub ttl: Duration,
    /// 获取锁重试次数
    pub retry_count: u32,
    /// 重试间隔
    pub retry_delay: Duration,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(30),
            retry_count: 20,
            retry_delay: Duration::from_millis(50),
        }
    }
}

impl From<&LockSettings> for LockConfig {
    fn from(settings: &LockSettings) -> Self {
        Self {
            ttl: Duration::from_secs(settings.ttl_seconds),
            retry_count: settings.retry_count.max(1),
            retry_delay: Duration::from_millis(settings.retry_delay_ms),
        }
    }
}

impl LockConfig {
    /// 本地锁的最长等待时间
    fn max_wait(&self) -> Duration {
        self.retry_delay * self.retry_count
    }
}

enum LockBackend {
    Local(LocalLocks),
    Database(PgPool),
}

/// 锁管理器
pub struct LockManager {
    backend: LockBackend,
    config: LockConfig,
    /// 实例唯一标识，用于区分不同服务实例持有的锁
    instance_id: String,
}

impl LockManager {
    /// 进程内锁
    pub fn local(config: LockConfig) -> Self {
        Self::with_backend(LockBackend::Local(Arc::new(DashMap::new())), config)
    }

    /// 数据库锁
    pub fn database(pool: PgPool, config: LockConfig) -> Self {
        Self::with_backend(LockBackend::Database(pool), config)
    }

    /// 按配置选择后端
    ///
    /// 没有数据库连接时只能使用进程内锁
    pub fn from_settings(settings: &LockSettings, pool: Option<PgPool>) -> Self {
        let config = LockConfig::from(settings);
        match (settings.backend, pool) {
            (LockBackendKind::Database, Some(pool)) => Self::database(pool, config),
            (LockBackendKind::Database, None) => {
                warn!("Database lock requested without a database, using local lock");
                Self::local(config)
            }
            (LockBackendKind::Local, _) => Self::local(config),
        }
    }

    fn with_backend(backend: LockBackend, config: LockConfig) -> Self {
        Self {
            backend,
            config,
            instance_id: Uuid::new_v4().to_string(),
        }
    }

    /// 当前后端名称，用于启动日志
    pub fn backend_name(&self) -> &'static str {
        match self.backend {
            LockBackend::Local(_) => "local",
            LockBackend::Database(_) => "database",
        }
    }

    /// 获取锁
    ///
    /// 在重试次数内无法获取锁时返回 `LockConflict` 错误。
    #[instrument(skip(self), fields(instance_id = %self.instance_id))]
    pub async fn acquire(&self, key: &str) -> Result<LockGuard> {
        // owner 格式: instance_id:uuid，确保锁的唯一性
        let owner = format!("{}:{}", self.instance_id, Uuid::new_v4());

        match &self.backend {
            LockBackend::Local(locks) => self.acquire_local(locks, key, owner).await,
            LockBackend::Database(pool) => self.try_db_lock(pool, key, owner).await,
        }
    }

    async fn acquire_local(
        &self,
        locks: &LocalLocks,
        key: &str,
        owner: String,
    ) -> Result<LockGuard> {
        let mutex = locks
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        match tokio::time::timeout(self.config.max_wait(), mutex.lock_owned()).await {
            Ok(guard) => {
                debug!(key = %key, owner = %owner, "Local lock acquired");
                Ok(LockGuard {
                    key: key.to_string(),
                    owner,
                    backend: GuardBackend::Local {
                        guard: Some(guard),
                        locks: Arc::clone(locks),
                    },
                    released: false,
                })
            }
            Err(_) => Err(RedemptionError::LockConflict {
                resource: key.to_string(),
            }),
        }
    }

    /// 尝试获取数据库锁
    ///
    /// 使用 INSERT ON CONFLICT DO NOTHING 实现原子锁获取，
    /// 同时清理过期锁以避免持有者崩溃后锁无法释放。
    async fn try_db_lock(&self, pool: &PgPool, key: &str, owner: String) -> Result<LockGuard> {
        let ttl = chrono::Duration::from_std(self.config.ttl)
            .map_err(|e| RedemptionError::Internal(e.to_string()))?;

        for attempt in 0..self.config.retry_count {
            let deleted = sqlx::query(
                r#"DELETE FROM redemption_locks WHERE lock_key = $1 AND expires_at < NOW()"#,
            )
            .bind(key)
            .execute(pool)
            .await?;

            if deleted.rows_affected() > 0 {
                debug!(key = %key, "Cleaned up expired database lock");
            }

            let result = sqlx::query(
                r#"
                INSERT INTO redemption_locks (lock_key, owner_id, expires_at)
                VALUES ($1, $2, $3)
                ON CONFLICT (lock_key) DO NOTHING
                "#,
            )
            .bind(key)
            .bind(&owner)
            .bind(chrono::Utc::now() + ttl)
            .execute(pool)
            .await?;

            if result.rows_affected() > 0 {
                debug!(key = %key, owner = %owner, attempt = attempt, "Database lock acquired");
                return Ok(LockGuard {
                    key: key.to_string(),
                    owner,
                    backend: GuardBackend::Database(pool.clone()),
                    released: false,
                });
            }

            if attempt + 1 < self.config.retry_count {
                debug!(
                    key = %key,
                    attempt = attempt,
                    retry_delay_ms = self.config.retry_delay.as_millis(),
                    "Lock not acquired, retrying"
                );
                tokio::time::sleep(self.config.retry_delay).await;
            }
        }

        Err(RedemptionError::LockConflict {
            resource: key.to_string(),
        })
    }
}

/// 锁守卫
///
/// 进程内锁在 drop 时自动释放；数据库锁必须调用 `release()`，
/// 否则只能等待 TTL 过期。
pub struct LockGuard {
    key: String,
    owner: String,
    backend: GuardBackend,
    /// 标记锁是否已被释放，避免重复释放
    released: bool,
}

enum GuardBackend {
    Local {
        guard: Option<OwnedMutexGuard<()>>,
        locks: LocalLocks,
    },
    Database(PgPool),
}

impl std::fmt::Debug for LockGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let backend = match self.backend {
            GuardBackend::Local { .. } => "local",
            GuardBackend::Database(_) => "database",
        };
        f.debug_struct("LockGuard")
            .field("key", &self.key)
            .field("owner", &self.owner)
            .field("backend", &backend)
            .field("released", &self.released)
            .finish()
    }
}

impl LockGuard {
    /// 获取锁的 key
    pub fn key(&self) -> &str {
        &self.key
    }

    /// 获取锁的 owner
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// 显式释放锁
    #[instrument(skip(self))]
    pub async fn release(mut self) -> Result<()> {
        self.released = true;
        match &mut self.backend {
            GuardBackend::Local { guard, locks } => {
                release_local(&self.key, guard, locks);
                Ok(())
            }
            GuardBackend::Database(pool) => {
                let result = sqlx::query(
                    r#"DELETE FROM redemption_locks WHERE lock_key = $1 AND owner_id = $2"#,
                )
                .bind(&self.key)
                .bind(&self.owner)
                .execute(&*pool)
                .await?;

                if result.rows_affected() == 0 {
                    warn!(
                        key = %self.key,
                        owner = %self.owner,
                        "Lock was already released or owned by another client"
                    );
                } else {
                    debug!(key = %self.key, "Database lock released");
                }
                Ok(())
            }
        }
    }
}

/// 释放进程内锁，并在无人等待时移除该 key 对应的互斥锁
fn release_local(key: &str, guard: &mut Option<OwnedMutexGuard<()>>, locks: &LocalLocks) {
    if guard.take().is_some() {
        locks.remove_if(key, |_, mutex| Arc::strong_count(mutex) == 1);
        debug!(key = %key, "Local lock released");
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        match &mut self.backend {
            GuardBackend::Local { guard, locks } => release_local(&self.key, guard, locks),
            GuardBackend::Database(_) => {
                // Drop 中无法执行异步操作，锁最终通过 TTL 过期释放
                warn!(
                    lock_key = %self.key,
                    owner = %self.owner,
                    "LockGuard dropped without explicit release - lock will expire via TTL"
                );
            }
        }
    }
}
