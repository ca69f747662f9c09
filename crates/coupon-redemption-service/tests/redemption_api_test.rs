//! 兑换 HTTP 接口端到端测试
//!
//! 使用内存存储和固定时钟，通过 tower oneshot 直接调用路由。

mod common;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use chrono::{Duration, Utc};
use coupon_redemption::api::{AppState, build_router};
use coupon_redemption::models::Coupon;
use serde_json::{Value, json};
use tower::ServiceExt;

use common::{PLAYER_ID, REWARD_ID, TestContext};

fn app(ctx: &TestContext) -> Router {
    build_router(AppState::new(
        ctx.service.clone(),
        None,
        "coupon-redemption-service",
    ))
}

async fn post_redeem(app: Router, body: String) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/coupon-redeem")
                .header("content-type", "application/json")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

async fn redeem(ctx: &TestContext, player_id: i64, reward_id: i64) -> (StatusCode, Value) {
    post_redeem(
        app(ctx),
        json!({ "playerId": player_id, "rewardId": reward_id }).to_string(),
    )
    .await
}

#[tokio::test]
async fn test_redeem_returns_created_coupon() {
    let ctx = TestContext::new();
    ctx.add_reward(REWARD_ID, 3, 21);
    ctx.add_coupons(REWARD_ID, [1]);

    let (status, body) = redeem(&ctx, PLAYER_ID, REWARD_ID).await;

    assert_eq!(status, StatusCode::CREATED);
    let coupon: Coupon = serde_json::from_value(body.clone()).unwrap();
    assert_eq!(coupon.id, 1);
    assert_eq!(coupon.value, "C1");
    assert_eq!(coupon.reward_id, REWARD_ID);
    assert_eq!(body["rewardId"], REWARD_ID);
}

#[tokio::test]
async fn test_fourth_redemption_same_day_hits_daily_limit() {
    let ctx = TestContext::new();
    ctx.add_reward(REWARD_ID, 3, 21);
    ctx.add_coupons(REWARD_ID, 1..=4);

    for expected in 1..=3 {
        let (status, body) = redeem(&ctx, PLAYER_ID, REWARD_ID).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["id"], expected);
    }

    let (status, body) = redeem(&ctx, PLAYER_ID, REWARD_ID).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Daily reward limit exceeded!");
    assert_eq!(body["code"], "DAILY_LIMIT_EXCEEDED");
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_fourth_redemption_hits_total_limit() {
    let ctx = TestContext::new();
    ctx.add_reward(REWARD_ID, 6, 3);
    ctx.add_coupons(REWARD_ID, 1..=4);

    for _ in 0..3 {
        let (status, _) = redeem(&ctx, PLAYER_ID, REWARD_ID).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = redeem(&ctx, PLAYER_ID, REWARD_ID).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Total reward limit exceeded!");
}

#[tokio::test]
async fn test_business_errors_map_to_bad_request() {
    let ctx = TestContext::new();
    ctx.add_reward(REWARD_ID, 3, 21);

    let (status, body) = redeem(&ctx, PLAYER_ID, 404).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid reward!");

    let (status, body) = redeem(&ctx, PLAYER_ID, REWARD_ID).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Coupon not found for this reward");

    ctx.clock.set(Utc::now() + Duration::days(3650));
    let (status, body) = redeem(&ctx, PLAYER_ID, REWARD_ID).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Reward has expired!");
}

#[tokio::test]
async fn test_missing_fields_rejected() {
    let ctx = TestContext::new();

    let (status, body) = post_redeem(app(&ctx), "{}".to_string()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Player is required");
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let (status, body) = post_redeem(app(&ctx), json!({ "playerId": 1 }).to_string()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Reward is required");

    let (status, body) = post_redeem(app(&ctx), json!({ "rewardId": 1 }).to_string()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Player is required");
}

#[tokio::test]
async fn test_malformed_json_rejected() {
    let ctx = TestContext::new();

    let (status, body) = post_redeem(app(&ctx), "{not json".to_string()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let (status, _) = post_redeem(
        app(&ctx),
        json!({ "playerId": "one", "rewardId": 1 }).to_string(),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_list_player_coupons() {
    let ctx = TestContext::new();
    ctx.add_reward(REWARD_ID, 3, 21);
    ctx.add_coupons(REWARD_ID, 1..=2);

    redeem(&ctx, PLAYER_ID, REWARD_ID).await;
    ctx.clock.advance(Duration::minutes(5));
    redeem(&ctx, PLAYER_ID, REWARD_ID).await;

    let response = app(&ctx)
        .oneshot(
            Request::builder()
                .uri(format!("/players/{}/coupons", PLAYER_ID))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    let items = body.as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["couponId"], 2);
    assert_eq!(items[1]["couponId"], 1);
    assert_eq!(items[1]["value"], "C1");
}

#[tokio::test]
async fn test_probes_and_request_id() {
    let ctx = TestContext::new();

    let response = app(&ctx)
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("x-request-id", "req-123")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-request-id"], "req-123");

    let response = app(&ctx)
        .oneshot(Request::builder().uri("/ready").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["checks"]["database"], "skipped");
}
