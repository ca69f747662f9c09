//! HTTP 错误响应
//!
//! 业务错误返回 400，锁冲突返回 409，系统错误返回 500 且只返回通用提示

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use super::dto::RedeemCouponRequest;
use crate::error::RedemptionError;

const INTERNAL_ERROR_MESSAGE: &str = "Internal server error, please try again later";

/// API 错误类型
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Redemption(#[from] RedemptionError),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Redemption(e) if e.is_business_error() => StatusCode::BAD_REQUEST,
            Self::Redemption(RedemptionError::LockConflict { .. }) => StatusCode::CONFLICT,
            Self::Redemption(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Redemption(e) => e.error_code(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // 系统级错误只返回通用提示，详细信息仅记录日志
        let message = match &self {
            Self::Redemption(e @ (RedemptionError::Database(_) | RedemptionError::Internal(_))) => {
                tracing::error!(error = %e, "兑换请求处理失败");
                INTERNAL_ERROR_MESSAGE.to_string()
            }
            other => other.to_string(),
        };

        let body = json!({
            "success": false,
            "code": self.error_code(),
            "message": message,
        });

        (status, axum::Json(body)).into_response()
    }
}

/// 从 validator 错误转换，按字段声明顺序取第一条提示
impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let field_errors = errors.field_errors();
        let message = RedeemCouponRequest::FIELD_ORDER
            .iter()
            .filter_map(|field| field_errors.get(*field))
            .flat_map(|errs| errs.iter())
            .find_map(|e| e.message.as_ref().map(|m| m.to_string()))
            .unwrap_or_else(|| errors.to_string());
        Self::Validation(message)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::Validation("Player is required".to_string()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(RedemptionError::RewardExpired { reward_id: 1 }).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(RedemptionError::LockConflict {
                resource: "coupon-redeem:1:1".to_string()
            })
            .status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::from(RedemptionError::Internal("boom".to_string())).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_internal_error_body_hides_details() {
        let response =
            ApiError::from(RedemptionError::Internal("secret detail".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["code"], "INTERNAL_ERROR");
        assert_eq!(json["message"], INTERNAL_ERROR_MESSAGE);
    }

    #[tokio::test]
    async fn test_business_error_body_carries_literal_message() {
        let response =
            ApiError::from(RedemptionError::DailyLimitExceeded { reward_id: 1, limit: 3 })
                .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["code"], "DAILY_LIMIT_EXCEEDED");
        assert_eq!(json["message"], "Daily reward limit exceeded!");
    }
}
