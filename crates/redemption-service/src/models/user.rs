//! 用户实体

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::amount::Points;

/// 用户角色
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "varchar", rename_all = "lowercase")]
pub enum UserRole {
    #[default]
    User,
    Admin,
}

/// 用户
///
/// `point` 为当前可用余额，`total_point` 为累计获得的积分（只增不减）。
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub role: UserRole,
    pub point: Points,
    pub total_point: Points,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// 当前余额是否足以支付指定价格
    pub fn can_afford(&self, price: Points) -> bool {
        self.point.covers(price)
    }
}
