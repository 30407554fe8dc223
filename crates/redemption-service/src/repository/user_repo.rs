//! 用户积分仓储
//!
//! 余额列带 `CHECK (point >= 0)` 约束，所有扣减都写成带条件的 UPDATE

use async_trait::async_trait;
use sqlx::{PgConnection, PgPool};

use super::traits::UserRepositoryTrait;
use crate::error::Result;
use crate::models::{PointChangeType, PointLedgerEntry, Points, User};

/// 用户积分仓储
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 在事务中写入积分流水
    pub async fn create_ledger_entry_in_tx(
        tx: &mut PgConnection,
        entry: &PointLedgerEntry,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO point_ledger (id, user_id, change_type, reference, points, balance_after, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(entry.id)
        .bind(&entry.user_id)
        .bind(entry.change_type)
        .bind(&entry.reference)
        .bind(entry.points)
        .bind(entry.balance_after)
        .bind(entry.created_at)
        .execute(tx)
        .await?;

        Ok(())
    }

    /// 在事务中带条件扣减余额，余额不足时返回 None
    pub async fn deduct_points_in_tx(
        tx: &mut PgConnection,
        user_id: &str,
        points: Points,
    ) -> Result<Option<Points>> {
        let balance_after = sqlx::query_scalar::<_, Points>(
            r#"
            UPDATE users
            SET point = point - $2, updated_at = NOW()
            WHERE id = $1 AND point >= $2
            RETURNING point
            "#,
        )
        .bind(user_id)
        .bind(points)
        .fetch_optional(tx)
        .await?;

        Ok(balance_after)
    }

    /// 在事务中读取余额
    pub async fn get_balance_in_tx(tx: &mut PgConnection, user_id: &str) -> Result<Option<Points>> {
        let balance = sqlx::query_scalar::<_, Points>("SELECT point FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(tx)
            .await?;

        Ok(balance)
    }
}

#[async_trait]
impl UserRepositoryTrait for UserRepository {
    async fn get_user(&self, id: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, role, point, total_point, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn update_balance(&self, id: &str, expected: Points, new_balance: Points) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET point = $3, updated_at = NOW()
            WHERE id = $1 AND point = $2
            "#,
        )
        .bind(id)
        .bind(expected)
        .bind(new_balance)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn credit_points(
        &self,
        id: &str,
        points: Points,
        reference: &str,
    ) -> Result<Option<Points>> {
        let mut tx = self.pool.begin().await?;

        let balance_after = sqlx::query_scalar::<_, Points>(
            r#"
            UPDATE users
            SET point = point + $2, total_point = total_point + $2, updated_at = NOW()
            WHERE id = $1
            RETURNING point
            "#,
        )
        .bind(id)
        .bind(points)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(balance_after) = balance_after else {
            tx.rollback().await?;
            return Ok(None);
        };

        let entry = PointLedgerEntry::new(
            id,
            PointChangeType::TaskCredit,
            reference,
            points,
            balance_after,
        );
        Self::create_ledger_entry_in_tx(&mut tx, &entry).await?;

        tx.commit().await?;

        Ok(Some(balance_after))
    }

    async fn list_ledger_entries(&self, user_id: &str, limit: i64) -> Result<Vec<PointLedgerEntry>> {
        let entries = sqlx::query_as::<_, PointLedgerEntry>(
            r#"
            SELECT id, user_id, change_type, reference, points, balance_after, created_at
            FROM point_ledger
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }
}
