//! 仓储 Trait 定义
//!
//! 定义仓储接口，便于服务层依赖抽象而非具体实现，支持 mock 测试

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{PointLedgerEntry, Points, RedemptionRequest, RequestStatus, Reward, Stock, User};
use crate::workflow::{ApprovalSettlement, SettlementOutcome};

/// 用户积分仓储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepositoryTrait: Send + Sync {
    async fn get_user(&self, id: &str) -> Result<Option<User>>;

    /// 条件更新余额：仅当当前余额等于 `expected` 时写入 `new_balance`
    ///
    /// 返回 false 表示用户不存在或余额已被并发修改
    async fn update_balance(&self, id: &str, expected: Points, new_balance: Points)
    -> Result<bool>;

    /// 任务积分入账：余额和累计积分同时增加，并写入流水
    ///
    /// 用户不存在时返回 None
    async fn credit_points(
        &self,
        id: &str,
        points: Points,
        reference: &str,
    ) -> Result<Option<Points>>;

    async fn list_ledger_entries(&self, user_id: &str, limit: i64)
    -> Result<Vec<PointLedgerEntry>>;
}

/// 奖励目录仓储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RewardRepositoryTrait: Send + Sync {
    async fn get_reward(&self, id: Uuid) -> Result<Option<Reward>>;
    async fn list_rewards(&self) -> Result<Vec<Reward>>;
    async fn create_reward(&self, reward: &Reward) -> Result<()>;
    /// 返回 false 表示奖励不存在
    async fn update_reward(&self, reward: &Reward) -> Result<bool>;
    /// 返回 false 表示奖励不存在
    async fn update_stock(&self, id: Uuid, new_stock: Stock) -> Result<bool>;
    /// 仅在没有待审批申请引用时删除，返回是否删除成功
    async fn delete_reward(&self, id: Uuid) -> Result<bool>;
}

/// 兑换申请仓储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RedemptionRequestRepositoryTrait: Send + Sync {
    /// 写入新申请，引用的奖励不存在时返回 `RewardNotFound`
    ///
    /// 与 `RewardRepositoryTrait::delete_reward` 互斥，不会留下引用已删除奖励的待审批申请
    async fn create(&self, request: &RedemptionRequest) -> Result<Uuid>;
    async fn get_by_id(&self, id: Uuid) -> Result<Option<RedemptionRequest>>;

    /// 条件更新状态：仅当当前状态为 `from` 时更新，返回是否更新成功
    async fn update_status(
        &self,
        id: Uuid,
        from: RequestStatus,
        to: RequestStatus,
        decided_by: &str,
    ) -> Result<bool>;

    /// 待审批队列，按提交时间升序
    async fn list_pending(&self) -> Result<Vec<RedemptionRequest>>;

    /// 用户兑换历史，按提交时间降序
    async fn list_history_for_user(
        &self,
        user_id: &str,
        limit: i64,
    ) -> Result<Vec<RedemptionRequest>>;

    async fn count_pending_for_reward(&self, reward_id: Uuid) -> Result<i64>;

    /// 在单个事务内执行审批结算
    ///
    /// 依次带条件地更新申请状态、扣减库存、扣减余额并写入流水，
    /// 任一条件不满足则整体回滚并返回对应的结果
    async fn settle_approval(&self, settlement: &ApprovalSettlement) -> Result<SettlementOutcome>;
}
