//! 奖励目录服务
//!
//! 管理员维护奖励定义。删除受待审批申请约束：
//! 只要还有待审批的申请引用该奖励，就拒绝删除。

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

use crate::error::{RedemptionError, Result};
use crate::models::{Points, Reward, Stock};
use crate::repository::{RedemptionRequestRepositoryTrait, RewardRepositoryTrait};
use crate::service::dto::{NewReward, RewardUpdate};

/// 奖励目录服务
pub struct RewardCatalogService<R, Q>
where
    R: RewardRepositoryTrait,
    Q: RedemptionRequestRepositoryTrait,
{
    reward_repo: Arc<R>,
    request_repo: Arc<Q>,
}

impl<R, Q> RewardCatalogService<R, Q>
where
    R: RewardRepositoryTrait,
    Q: RedemptionRequestRepositoryTrait,
{
    pub fn new(reward_repo: Arc<R>, request_repo: Arc<Q>) -> Self {
        Self {
            reward_repo,
            request_repo,
        }
    }

    #[instrument(skip(self), fields(name = %input.name))]
    pub async fn create_reward(&self, input: NewReward) -> Result<Reward> {
        input.validate()?;

        let now = Utc::now();
        let reward = Reward {
            id: Uuid::now_v7(),
            name: input.name,
            image: input.image.filter(|image| !image.trim().is_empty()),
            price: Points::new(input.price)?,
            stock: Stock::new(input.stock)?,
            created_at: now,
            updated_at: now,
        };
        self.reward_repo.create_reward(&reward).await?;

        info!(reward_id = %reward.id, price = %reward.price, stock = %reward.stock, "奖励已创建");
        Ok(reward)
    }

    #[instrument(skip(self, input), fields(reward_id = %reward_id))]
    pub async fn update_reward(&self, reward_id: Uuid, input: RewardUpdate) -> Result<Reward> {
        input.validate()?;

        let existing = self.get_reward(reward_id).await?;
        let reward = Reward {
            name: input.name,
            image: Some(input.image),
            price: Points::new(input.price)?,
            stock: Stock::new(input.stock)?,
            updated_at: Utc::now(),
            ..existing
        };

        if !self.reward_repo.update_reward(&reward).await? {
            return Err(RedemptionError::RewardNotFound(reward_id));
        }

        info!("奖励已更新");
        Ok(reward)
    }

    /// 设置剩余库存
    #[instrument(skip(self))]
    pub async fn restock_reward(&self, reward_id: Uuid, stock: i64) -> Result<Stock> {
        let stock = Stock::new(stock)?;
        if !self.reward_repo.update_stock(reward_id, stock).await? {
            return Err(RedemptionError::RewardNotFound(reward_id));
        }

        info!(stock = %stock, "奖励库存已更新");
        Ok(stock)
    }

    #[instrument(skip(self))]
    pub async fn delete_reward(&self, reward_id: Uuid) -> Result<()> {
        self.get_reward(reward_id).await?;

        let pending = self
            .request_repo
            .count_pending_for_reward(reward_id)
            .await?;
        if pending > 0 {
            warn!(pending, "奖励仍被待审批申请引用");
            return Err(RedemptionError::RewardInUse { reward_id, pending });
        }

        // 计数和删除之间可能有新的申请提交，仓储层删除时会再次检查
        if !self.reward_repo.delete_reward(reward_id).await? {
            let pending = self
                .request_repo
                .count_pending_for_reward(reward_id)
                .await?;
            if pending > 0 {
                return Err(RedemptionError::RewardInUse { reward_id, pending });
            }
            return Err(RedemptionError::RewardNotFound(reward_id));
        }

        info!("奖励已删除");
        Ok(())
    }

    pub async fn get_reward(&self, reward_id: Uuid) -> Result<Reward> {
        self.reward_repo
            .get_reward(reward_id)
            .await?
            .ok_or(RedemptionError::RewardNotFound(reward_id))
    }

    pub async fn list_rewards(&self) -> Result<Vec<Reward>> {
        self.reward_repo.list_rewards().await
    }
}
