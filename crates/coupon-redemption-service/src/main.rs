//! 优惠券兑换服务
//!
//! 提供 `POST /coupon-redeem` 兑换接口及玩家兑换历史查询。

use std::sync::Arc;

use coupon_redemption::{
    api::{AppState, build_router},
    clock::SystemClock,
    lock::LockManager,
    repository::{
        InMemoryStore, PgCouponRepository, PgPlayerCouponRepository, PgRewardRepository, SeedData,
    },
    service::{RedemptionConfig, RedemptionService},
};
use redeem_shared::{
    config::{AppConfig, StorageBackend},
    database::Database,
    observability,
};
use tokio::net::TcpListener;
use tracing::{error, info, warn};

const SERVICE_NAME: &str = "coupon-redemption-service";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load(SERVICE_NAME)?;

    let obs_config = config
        .observability
        .clone()
        .with_service_name(&config.service_name);
    let _guard = observability::init(&obs_config).await?;

    info!(
        environment = %config.environment,
        storage = ?config.storage.backend,
        "Starting {} on {}",
        SERVICE_NAME,
        config.server_addr()
    );

    let redemption_config = RedemptionConfig::from_settings(&config.redemption)?;

    let (redemption_service, database) = match config.storage.backend {
        StorageBackend::Postgres => {
            let db = Database::connect(&config.database).await?;
            if config.database.run_migrations {
                db.run_migrations().await?;
            }

            let lock_manager = Arc::new(LockManager::from_settings(
                &config.redemption.lock,
                Some(db.pool().clone()),
            ));
            info!(lock_backend = lock_manager.backend_name(), "Lock manager initialized");
            let service = RedemptionService::new(
                Arc::new(PgRewardRepository::new(db.pool().clone())),
                Arc::new(PgPlayerCouponRepository::new(db.pool().clone())),
                Arc::new(PgCouponRepository::new(db.pool().clone())),
                lock_manager,
                Arc::new(SystemClock),
                redemption_config,
            );
            (service, Some(db))
        }
        StorageBackend::Memory => {
            if config.is_production() {
                warn!("In-memory storage is running in production, data is lost on restart");
            }
            let store = Arc::new(InMemoryStore::new());
            if let Some(seed_file) = &config.storage.seed_file {
                store.seed(SeedData::from_file(seed_file)?);
                let (players, rewards, coupons) = store.counts();
                info!(seed_file = %seed_file, players, rewards, coupons, "In-memory store seeded");
            }
            let lock_manager = Arc::new(LockManager::from_settings(&config.redemption.lock, None));
            info!(lock_backend = lock_manager.backend_name(), "Lock manager initialized");
            let service = RedemptionService::new(
                store.clone(),
                store.clone(),
                store,
                lock_manager,
                Arc::new(SystemClock),
                redemption_config,
            );
            (service, None)
        }
    };
    info!("RedemptionService initialized");

    let state = AppState::new(
        Arc::new(redemption_service),
        database.clone(),
        config.service_name.clone(),
    );
    let app = build_router(state);

    let listener = TcpListener::bind(config.server_addr()).await?;
    info!("Listening on {}", config.server_addr());

    // 优雅关闭：收到 SIGTERM 或 Ctrl+C 时停止接收新连接并等待已有请求处理完毕
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(db) = database {
        db.close().await;
    }
    info!("Server shutdown complete");

    Ok(())
}

/// 监听关闭信号
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "注册 Ctrl+C 处理器失败");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "注册 SIGTERM 处理器失败");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, initiating graceful shutdown..."),
        _ = terminate => info!("Received SIGTERM, initiating graceful shutdown..."),
    }
}
