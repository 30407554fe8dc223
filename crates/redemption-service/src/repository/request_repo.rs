//! 兑换申请仓储
//!
//! 审批结算在单个事务内按 申请 -> 奖励 -> 用户 的固定顺序加行锁，
//! 每一步都是带条件的 UPDATE，影响行数为 0 即回滚。

use async_trait::async_trait;
use sqlx::{PgConnection, PgPool};
use tracing::debug;
use uuid::Uuid;

use super::reward_repo::RewardRepository;
use super::traits::RedemptionRequestRepositoryTrait;
use super::user_repo::UserRepository;
use crate::error::{RedemptionError, Result};
use crate::models::{PointChangeType, PointLedgerEntry, RedemptionRequest, RequestStatus};
use crate::workflow::{ApprovalSettlement, SettlementOutcome};

/// 兑换申请仓储
pub struct RedemptionRequestRepository {
    pool: PgPool,
}

impl RedemptionRequestRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 在事务中带条件地更新申请状态
    pub async fn update_status_in_tx(
        tx: &mut PgConnection,
        id: Uuid,
        from: RequestStatus,
        to: RequestStatus,
        decided_by: &str,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE redemption_requests
            SET status = $3, decided_by = $4, updated_at = NOW()
            WHERE id = $1 AND status = $2
            "#,
        )
        .bind(id)
        .bind(from)
        .bind(to)
        .bind(decided_by)
        .execute(tx)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// 在事务中读取申请当前状态
    pub async fn get_status_in_tx(
        tx: &mut PgConnection,
        id: Uuid,
    ) -> Result<Option<RequestStatus>> {
        let status = sqlx::query_scalar::<_, RequestStatus>(
            "SELECT status FROM redemption_requests WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(tx)
        .await?;

        Ok(status)
    }
}

#[async_trait]
impl RedemptionRequestRepositoryTrait for RedemptionRequestRepository {
    async fn create(&self, request: &RedemptionRequest) -> Result<Uuid> {
        let mut tx = self.pool.begin().await?;

        // 奖励行加锁到提交，期间删除会被阻塞
        if !RewardRepository::key_share_in_tx(&mut tx, request.reward_id).await? {
            tx.rollback().await?;
            return Err(RedemptionError::RewardNotFound(request.reward_id));
        }

        sqlx::query(
            r#"
            INSERT INTO redemption_requests (id, user_id, reward_id, status, decided_by, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(request.id)
        .bind(&request.user_id)
        .bind(request.reward_id)
        .bind(request.status)
        .bind(&request.decided_by)
        .bind(request.created_at)
        .bind(request.updated_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(request.id)
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<RedemptionRequest>> {
        let request = sqlx::query_as::<_, RedemptionRequest>(
            r#"
            SELECT id, user_id, reward_id, status, decided_by, created_at, updated_at
            FROM redemption_requests
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(request)
    }

    async fn update_status(
        &self,
        id: Uuid,
        from: RequestStatus,
        to: RequestStatus,
        decided_by: &str,
    ) -> Result<bool> {
        let mut conn = self.pool.acquire().await?;
        Self::update_status_in_tx(&mut conn, id, from, to, decided_by).await
    }

    async fn list_pending(&self) -> Result<Vec<RedemptionRequest>> {
        let requests = sqlx::query_as::<_, RedemptionRequest>(
            r#"
            SELECT id, user_id, reward_id, status, decided_by, created_at, updated_at
            FROM redemption_requests
            WHERE status = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(RequestStatus::Pending)
        .fetch_all(&self.pool)
        .await?;

        Ok(requests)
    }

    async fn list_history_for_user(
        &self,
        user_id: &str,
        limit: i64,
    ) -> Result<Vec<RedemptionRequest>> {
        let requests = sqlx::query_as::<_, RedemptionRequest>(
            r#"
            SELECT id, user_id, reward_id, status, decided_by, created_at, updated_at
            FROM redemption_requests
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(requests)
    }

    async fn count_pending_for_reward(&self, reward_id: Uuid) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM redemption_requests
            WHERE reward_id = $1 AND status = $2
            "#,
        )
        .bind(reward_id)
        .bind(RequestStatus::Pending)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn settle_approval(&self, settlement: &ApprovalSettlement) -> Result<SettlementOutcome> {
        let mut tx = self.pool.begin().await?;

        // 1. 锁定申请并置为 Done，同一申请的并发审批只有一个会成功
        let claimed = Self::update_status_in_tx(
            &mut tx,
            settlement.request_id,
            RequestStatus::Pending,
            RequestStatus::Done,
            &settlement.decided_by,
        )
        .await?;
        if !claimed {
            let status = Self::get_status_in_tx(&mut tx, settlement.request_id).await?;
            tx.rollback().await?;
            debug!(request_id = %settlement.request_id, ?status, "申请不是待审批状态");
            return Ok(match status {
                Some(status) => SettlementOutcome::NotPending(status),
                None => SettlementOutcome::RequestMissing,
            });
        }

        // 2. 扣减库存
        let Some(stock_after) = RewardRepository::take_one_in_tx(&mut tx, settlement.reward_id).await?
        else {
            let exists = RewardRepository::exists_in_tx(&mut tx, settlement.reward_id).await?;
            tx.rollback().await?;
            return Ok(if exists {
                SettlementOutcome::OutOfStock
            } else {
                SettlementOutcome::RewardMissing
            });
        };

        // 3. 扣减余额
        let Some(balance_after) =
            UserRepository::deduct_points_in_tx(&mut tx, &settlement.user_id, settlement.price)
                .await?
        else {
            let available = UserRepository::get_balance_in_tx(&mut tx, &settlement.user_id).await?;
            tx.rollback().await?;
            return Ok(match available {
                Some(available) => SettlementOutcome::InsufficientPoints { available },
                None => SettlementOutcome::UserMissing,
            });
        };

        // 4. 积分流水
        let entry = PointLedgerEntry::new(
            settlement.user_id.clone(),
            PointChangeType::RewardRedeem,
            settlement.reward_name.clone(),
            settlement.price,
            balance_after,
        );
        UserRepository::create_ledger_entry_in_tx(&mut tx, &entry).await?;

        tx.commit().await?;

        Ok(SettlementOutcome::Settled {
            balance_after,
            stock_after,
        })
    }
}
