//! 奖励目录仓储

use async_trait::async_trait;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use super::traits::RewardRepositoryTrait;
use crate::error::Result;
use crate::models::{RequestStatus, Reward, Stock};

/// 奖励目录仓储
pub struct RewardRepository {
    pool: PgPool,
}

impl RewardRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 在事务中扣减一件库存，库存为 0 时返回 None
    pub async fn take_one_in_tx(tx: &mut PgConnection, reward_id: Uuid) -> Result<Option<Stock>> {
        let stock_after = sqlx::query_scalar::<_, Stock>(
            r#"
            UPDATE rewards
            SET stock = stock - 1, updated_at = NOW()
            WHERE id = $1 AND stock >= 1
            RETURNING stock
            "#,
        )
        .bind(reward_id)
        .fetch_optional(tx)
        .await?;

        Ok(stock_after)
    }

    /// 在事务中对奖励行加 KEY SHARE 锁，奖励不存在时返回 false
    ///
    /// 与删除时的 FOR UPDATE 冲突，持锁期间奖励不会被删除
    pub async fn key_share_in_tx(tx: &mut PgConnection, reward_id: Uuid) -> Result<bool> {
        let locked = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM rewards WHERE id = $1 FOR KEY SHARE",
        )
        .bind(reward_id)
        .fetch_optional(tx)
        .await?;

        Ok(locked.is_some())
    }

    /// 在事务中检查奖励是否存在
    pub async fn exists_in_tx(tx: &mut PgConnection, reward_id: Uuid) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM rewards WHERE id = $1)",
        )
        .bind(reward_id)
        .fetch_one(tx)
        .await?;

        Ok(exists)
    }
}

#[async_trait]
impl RewardRepositoryTrait for RewardRepository {
    async fn get_reward(&self, id: Uuid) -> Result<Option<Reward>> {
        let reward = sqlx::query_as::<_, Reward>(
            r#"
            SELECT id, name, image, price, stock, created_at, updated_at
            FROM rewards
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(reward)
    }

    async fn list_rewards(&self) -> Result<Vec<Reward>> {
        let rewards = sqlx::query_as::<_, Reward>(
            r#"
            SELECT id, name, image, price, stock, created_at, updated_at
            FROM rewards
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rewards)
    }

    async fn create_reward(&self, reward: &Reward) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO rewards (id, name, image, price, stock, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(reward.id)
        .bind(&reward.name)
        .bind(&reward.image)
        .bind(reward.price)
        .bind(reward.stock)
        .bind(reward.created_at)
        .bind(reward.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update_reward(&self, reward: &Reward) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE rewards
            SET name = $2, image = $3, price = $4, stock = $5, updated_at = $6
            WHERE id = $1
            "#,
        )
        .bind(reward.id)
        .bind(&reward.name)
        .bind(&reward.image)
        .bind(reward.price)
        .bind(reward.stock)
        .bind(reward.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn update_stock(&self, id: Uuid, new_stock: Stock) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE rewards
            SET stock = $2, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(new_stock)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn delete_reward(&self, id: Uuid) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        // 先锁住奖励行，等待正在提交的申请事务结束
        let locked = sqlx::query_scalar::<_, Uuid>("SELECT id FROM rewards WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        if locked.is_none() {
            tx.rollback().await?;
            return Ok(false);
        }

        // 新语句使用新快照，能看到已提交的申请
        let referenced = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM redemption_requests
                WHERE reward_id = $1 AND status = $2
            )
            "#,
        )
        .bind(id)
        .bind(RequestStatus::Pending)
        .fetch_one(&mut *tx)
        .await?;
        if referenced {
            tx.rollback().await?;
            return Ok(false);
        }

        sqlx::query("DELETE FROM rewards WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(true)
    }
}
