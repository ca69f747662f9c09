//! 请求 DTO

use serde::Deserialize;
use validator::Validate;

use super::error::ApiError;

/// 兑换请求
///
/// 字段声明为 Option，缺失时由校验给出明确提示而不是反序列化失败
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RedeemCouponRequest {
    #[validate(required(message = "Player is required"))]
    pub player_id: Option<i64>,
    #[validate(required(message = "Reward is required"))]
    pub reward_id: Option<i64>,
}

impl RedeemCouponRequest {
    /// 字段校验顺序，决定多个字段同时缺失时返回哪条提示
    pub const FIELD_ORDER: [&'static str; 2] = ["player_id", "reward_id"];

    /// 校验并取出 (player_id, reward_id)
    ///
    /// 提示文案只来自字段上的 `validate` 属性，顺序只来自 `FIELD_ORDER`
    pub fn into_ids(self) -> Result<(i64, i64), ApiError> {
        self.validate()?;
        // 校验通过后两个字段必然存在
        self.player_id
            .zip(self.reward_id)
            .ok_or_else(|| ApiError::Validation("Invalid redemption request".to_string()))
    }
}
