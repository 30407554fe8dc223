//! 奖励实体

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::amount::{Points, Stock};

/// 奖励
///
/// 由管理员维护，审批通过的兑换申请会扣减一件库存
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Reward {
    pub id: Uuid,
    pub name: String,
    /// 图片引用（上传由外部系统负责）
    #[sqlx(default)]
    pub image: Option<String>,
    /// 兑换所需积分
    pub price: Points,
    /// 剩余库存
    pub stock: Stock,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Reward {
    pub fn in_stock(&self) -> bool {
        self.stock.is_available()
    }
}
