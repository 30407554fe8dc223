//! 服务层数据传输对象
//!
//! 定义服务层与外部交互使用的 DTO，与内部领域模型解耦

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::{Decision, Points, RedemptionRequest, RequestStatus, Stock};

/// 提交兑换申请
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRedemptionRequest {
    #[validate(length(min = 1, max = 100, message = "用户ID不能为空"))]
    pub user_id: String,
    pub reward_id: Uuid,
}

impl SubmitRedemptionRequest {
    /// 去掉用户ID首尾空白，纯空白的ID在校验时按空处理
    pub fn trimmed(mut self) -> Self {
        self.user_id = self.user_id.trim().to_string();
        self
    }
}

/// 审批兑换申请
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DecideRedemptionRequest {
    pub decision: Decision,
    /// 执行审批的管理员
    #[validate(length(min = 1, max = 100, message = "审批人不能为空"))]
    pub admin_id: String,
}

impl DecideRedemptionRequest {
    pub fn trimmed(mut self) -> Self {
        self.admin_id = self.admin_id.trim().to_string();
        self
    }
}

/// 审批结果
///
/// 通过时附带结算后的余额和库存，拒绝时二者为空
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionOutcome {
    pub request_id: Uuid,
    pub status: RequestStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub balance_after: Option<Points>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock_after: Option<Stock>,
}

impl DecisionOutcome {
    pub fn rejected(request_id: Uuid) -> Self {
        Self {
            request_id,
            status: RequestStatus::Rejected,
            balance_after: None,
            stock_after: None,
        }
    }
}

/// 兑换历史 DTO
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedemptionHistoryDto {
    pub request_id: Uuid,
    pub reward_id: Uuid,
    /// 奖励已被删除时为空
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reward_name: Option<String>,
    pub status: RequestStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decided_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RedemptionHistoryDto {
    pub fn from_request(request: RedemptionRequest, reward_name: Option<String>) -> Self {
        Self {
            request_id: request.id,
            reward_id: request.reward_id,
            reward_name,
            status: request.status,
            decided_by: request.decided_by,
            created_at: request.created_at,
            updated_at: request.updated_at,
        }
    }
}

/// 新建奖励
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewReward {
    #[validate(length(min = 1, max = 100, message = "奖励名称长度必须在1-100个字符之间"))]
    pub name: String,
    #[serde(default)]
    pub image: Option<String>,
    #[validate(range(min = 0, message = "价格不能为负数"))]
    pub price: i64,
    #[validate(range(min = 0, message = "库存不能为负数"))]
    pub stock: i64,
}

/// 更新奖励
///
/// 更新时名称和图片都必须提供
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RewardUpdate {
    #[validate(length(min = 1, max = 100, message = "奖励名称长度必须在1-100个字符之间"))]
    pub name: String,
    #[validate(length(min = 1, message = "奖励图片不能为空"))]
    pub image: String,
    #[validate(range(min = 0, message = "价格不能为负数"))]
    pub price: i64,
    #[validate(range(min = 0, message = "库存不能为负数"))]
    pub stock: i64,
}

/// 任务积分入账
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreditPointsRequest {
    #[validate(range(min = 1, message = "入账积分必须大于0"))]
    pub points: i64,
    /// 关联的任务名
    #[validate(length(min = 1, max = 200, message = "关联任务不能为空"))]
    pub reference: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submit_request_validation() {
        let request = SubmitRedemptionRequest {
            user_id: String::new(),
            reward_id: Uuid::new_v4(),
        };
        assert!(request.validate().is_err());

        let request = SubmitRedemptionRequest {
            user_id: "user-1".to_string(),
            reward_id: Uuid::new_v4(),
        };
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_blank_identifiers_fail_after_trim() {
        let request = SubmitRedemptionRequest {
            user_id: "   ".to_string(),
            reward_id: Uuid::new_v4(),
        };
        assert!(request.clone().validate().is_ok());
        assert!(request.trimmed().validate().is_err());

        let command = DecideRedemptionRequest {
            decision: Decision::Done,
            admin_id: "\t ".to_string(),
        };
        assert!(command.trimmed().validate().is_err());

        let padded = SubmitRedemptionRequest {
            user_id: " user-1 ".to_string(),
            reward_id: Uuid::new_v4(),
        }
        .trimmed();
        assert_eq!(padded.user_id, "user-1");
        assert!(padded.validate().is_ok());
    }

    #[test]
    fn test_new_reward_validation() {
        let valid = NewReward {
            name: "Coffee Voucher".to_string(),
            image: None,
            price: 0,
            stock: 0,
        };
        assert!(valid.validate().is_ok());

        let negative_price = NewReward {
            price: -1,
            ..valid.clone()
        };
        assert!(negative_price.validate().is_err());

        let long_name = NewReward {
            name: "x".repeat(101),
            ..valid
        };
        assert!(long_name.validate().is_err());
    }

    #[test]
    fn test_reward_update_requires_image() {
        let update = RewardUpdate {
            name: "Coffee Voucher".to_string(),
            image: String::new(),
            price: 30,
            stock: 5,
        };
        assert!(update.validate().is_err());
    }

    #[test]
    fn test_decide_request_deserialization() {
        let json = r#"{"decision":"REJECTED","adminId":"admin-1"}"#;
        let request: DecideRedemptionRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.decision, Decision::Rejected);
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_rejected_outcome_omits_settlement_fields() {
        let value = serde_json::to_value(DecisionOutcome::rejected(Uuid::nil())).unwrap();
        assert_eq!(value["status"], "REJECTED");
        assert!(value.get("balanceAfter").is_none());
    }
}
