//! 积分账本服务
//!
//! 任务积分入账和余额维护。兑换扣减不经过这里，由审批结算完成。

use std::sync::Arc;

use metrics::counter;
use tracing::{info, instrument, warn};
use validator::Validate;

use reward_shared::observability::metrics::POINT_CREDITS_TOTAL;

use crate::error::{RedemptionError, Result};
use crate::models::{PointLedgerEntry, Points};
use crate::repository::UserRepositoryTrait;
use crate::service::dto::CreditPointsRequest;

/// 积分账本服务
pub struct PointLedgerService<U: UserRepositoryTrait> {
    user_repo: Arc<U>,
    history_limit: i64,
}

impl<U: UserRepositoryTrait> PointLedgerService<U> {
    pub fn new(user_repo: Arc<U>, history_limit: i64) -> Self {
        Self {
            user_repo,
            history_limit: history_limit.max(1),
        }
    }

    /// 任务完成后入账，返回入账后的余额
    #[instrument(skip(self), fields(user_id = %user_id, points = request.points))]
    pub async fn credit_task_points(
        &self,
        user_id: &str,
        request: CreditPointsRequest,
    ) -> Result<Points> {
        request.validate()?;
        let points = Points::new(request.points)?;

        let balance = self
            .user_repo
            .credit_points(user_id, points, &request.reference)
            .await?
            .ok_or_else(|| RedemptionError::UserNotFound(user_id.to_string()))?;

        counter!(POINT_CREDITS_TOTAL).increment(1);
        info!(balance = %balance, "任务积分已入账");
        Ok(balance)
    }

    /// 直接设置余额
    ///
    /// 以读到的余额为条件写入，期间余额被其他操作修改时返回 `ConcurrencyConflict`。
    #[instrument(skip(self))]
    pub async fn adjust_balance(&self, user_id: &str, new_balance: i64) -> Result<Points> {
        let new_balance = Points::new(new_balance)?;
        let current = self.get_balance(user_id).await?;

        if !self
            .user_repo
            .update_balance(user_id, current, new_balance)
            .await?
        {
            warn!(expected = %current, "余额已被并发修改");
            return Err(RedemptionError::ConcurrencyConflict);
        }

        info!(from = %current, to = %new_balance, "余额已调整");
        Ok(new_balance)
    }

    pub async fn get_balance(&self, user_id: &str) -> Result<Points> {
        self.user_repo
            .get_user(user_id)
            .await?
            .map(|user| user.point)
            .ok_or_else(|| RedemptionError::UserNotFound(user_id.to_string()))
    }

    /// 积分流水，最新的在前
    pub async fn list_ledger(&self, user_id: &str) -> Result<Vec<PointLedgerEntry>> {
        self.user_repo
            .list_ledger_entries(user_id, self.history_limit)
            .await
    }
}
