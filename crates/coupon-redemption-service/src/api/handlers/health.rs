//! 健康检查

use axum::{Json, extract::State};
use serde_json::{Value, json};

use crate::api::state::AppState;

/// 存活探针：服务进程正常即返回 ok
pub async fn health_check(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": state.service_name
    }))
}

/// 就绪探针：检查数据库连接是否可用
///
/// 内存存储模式下没有外部依赖，数据库检查项标记为 skipped
pub async fn readiness_check(State(state): State<AppState>) -> Json<Value> {
    let database = match &state.database {
        Some(db) => {
            if db.health_check().await.is_ok() {
                "ok"
            } else {
                "fail"
            }
        }
        None => "skipped",
    };

    Json(json!({
        "status": if database == "fail" { "degraded" } else { "ok" },
        "service": state.service_name,
        "checks": {
            "database": database
        }
    }))
}
