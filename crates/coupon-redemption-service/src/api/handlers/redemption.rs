//! 兑换 API 处理器

use axum::{
    Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
};
use tracing::info;

use crate::api::{dto::RedeemCouponRequest, error::ApiError, state::AppState};
use crate::models::{Coupon, RedeemedCoupon};

/// 兑换优惠券
///
/// POST /coupon-redeem
pub async fn redeem_coupon(
    State(state): State<AppState>,
    payload: Result<Json<RedeemCouponRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Coupon>), ApiError> {
    let Json(req) = payload?;
    let (player_id, reward_id) = req.into_ids()?;

    info!(player_id, reward_id, "Coupon redemption requested");

    let coupon = state
        .redemption_service
        .redeem(player_id, reward_id)
        .await?;

    Ok((StatusCode::CREATED, Json(coupon)))
}

/// 查询玩家兑换历史
///
/// GET /players/{player_id}/coupons
pub async fn list_player_coupons(
    State(state): State<AppState>,
    player_id: Result<Path<i64>, PathRejection>,
) -> Result<Json<Vec<RedeemedCoupon>>, ApiError> {
    let Path(player_id) = player_id?;

    let coupons = state
        .redemption_service
        .list_player_coupons(player_id)
        .await?;

    Ok(Json(coupons))
}
