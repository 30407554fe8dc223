//! 积分流水

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::amount::Points;

/// 积分变动类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "varchar", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PointChangeType {
    /// 完成任务获得积分
    TaskCredit,
    /// 兑换奖励扣减积分
    RewardRedeem,
}

/// 积分流水记录
///
/// 每次余额变动写入一条，`points` 为变动的绝对值
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PointLedgerEntry {
    pub id: Uuid,
    pub user_id: String,
    pub change_type: PointChangeType,
    /// 关联对象描述（任务名或奖励名）
    pub reference: String,
    pub points: Points,
    pub balance_after: Points,
    pub created_at: DateTime<Utc>,
}

impl PointLedgerEntry {
    pub fn new(
        user_id: impl Into<String>,
        change_type: PointChangeType,
        reference: impl Into<String>,
        points: Points,
        balance_after: Points,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            user_id: user_id.into(),
            change_type,
            reference: reference.into(),
            points,
            balance_after,
            created_at: Utc::now(),
        }
    }
}
