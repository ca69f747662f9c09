//! 路由配置

use axum::{
    Router, middleware,
    routing::{get, post},
};
use redeem_shared::observability::middleware as obs_middleware;
use tower_http::cors::{Any, CorsLayer};

use super::handlers::{health, redemption};
use super::state::AppState;

/// 业务路由
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/coupon-redeem", post(redemption::redeem_coupon))
        .route(
            "/players/{player_id}/coupons",
            get(redemption::list_player_coupons),
        )
}

/// 完整应用路由，包含探针和中间件
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(api_routes())
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        .layer(cors)
        // 可观测性中间件：请求追踪和指标收集
        .layer(middleware::from_fn(obs_middleware::http_tracing))
        .layer(middleware::from_fn(obs_middleware::request_id))
        .with_state(state)
}
