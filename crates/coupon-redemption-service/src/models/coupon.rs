//! 优惠券及兑换记录

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 优惠券
///
/// 归属于一个奖励活动，未被任何兑换记录引用前视为可用
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Coupon {
    pub id: i64,
    /// 券码或面值描述，原样返回给调用方
    pub value: String,
    pub reward_id: i64,
}

/// 兑换记录
///
/// 每次兑换成功创建一条，创建后不再修改
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PlayerCoupon {
    pub id: i64,
    pub player_id: i64,
    pub coupon_id: i64,
    pub redeemed_at: DateTime<Utc>,
}

/// 玩家兑换历史中的一项
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct RedeemedCoupon {
    pub coupon_id: i64,
    pub value: String,
    pub reward_id: i64,
    pub redeemed_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coupon_json_shape() {
        let coupon = Coupon {
            id: 7,
            value: "SPRING-10".to_string(),
            reward_id: 1,
        };
        let json = serde_json::to_value(&coupon).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "id": 7, "value": "SPRING-10", "rewardId": 1 })
        );
    }
}
