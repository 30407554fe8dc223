//! 命令执行器
//!
//! 把命令行参数转化为服务调用，结果以 JSON 打印到标准输出。

use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::json;
use sqlx::PgPool;
use tracing::info;

use crate::cli::Commands;
use crate::repository::{RedemptionRequestRepository, RewardRepository, UserRepository};
use crate::service::{
    CreditPointsRequest, DecideRedemptionRequest, NewReward, PointLedgerService,
    RedemptionService, RewardCatalogService, SubmitRedemptionRequest,
};

type PgRedemptionService =
    RedemptionService<UserRepository, RewardRepository, RedemptionRequestRepository>;
type PgCatalogService = RewardCatalogService<RewardRepository, RedemptionRequestRepository>;
type PgLedgerService = PointLedgerService<UserRepository>;

/// 命令执行器
pub struct CommandRunner {
    pool: PgPool,
    redemption: PgRedemptionService,
    catalog: PgCatalogService,
    ledger: PgLedgerService,
}

impl CommandRunner {
    pub fn new(pool: PgPool, history_limit: i64) -> Self {
        let user_repo = Arc::new(UserRepository::new(pool.clone()));
        let reward_repo = Arc::new(RewardRepository::new(pool.clone()));
        let request_repo = Arc::new(RedemptionRequestRepository::new(pool.clone()));

        Self {
            redemption: RedemptionService::new(
                user_repo.clone(),
                reward_repo.clone(),
                request_repo.clone(),
            )
            .with_history_limit(history_limit),
            catalog: RewardCatalogService::new(reward_repo, request_repo),
            ledger: PointLedgerService::new(user_repo, history_limit),
            pool,
        }
    }

    pub async fn run(&self, command: Commands) -> Result<()> {
        match command {
            Commands::Migrate => self.run_migrate().await,
            Commands::Rewards => print_json(&self.catalog.list_rewards().await?),
            Commands::CreateReward {
                name,
                price,
                stock,
                image,
            } => {
                let reward = self
                    .catalog
                    .create_reward(NewReward {
                        name,
                        image,
                        price,
                        stock,
                    })
                    .await?;
                print_json(&reward)
            }
            Commands::Restock { reward_id, stock } => {
                let stock = self.catalog.restock_reward(reward_id, stock).await?;
                print_json(&json!({ "rewardId": reward_id, "stock": stock }))
            }
            Commands::DeleteReward { reward_id } => {
                self.catalog.delete_reward(reward_id).await?;
                print_json(&json!({ "rewardId": reward_id, "deleted": true }))
            }
            Commands::Credit {
                user_id,
                points,
                reference,
            } => {
                let balance = self
                    .ledger
                    .credit_task_points(&user_id, CreditPointsRequest { points, reference })
                    .await?;
                print_json(&json!({ "userId": user_id, "balance": balance }))
            }
            Commands::Balance { user_id } => {
                let balance = self.ledger.get_balance(&user_id).await?;
                let ledger = self.ledger.list_ledger(&user_id).await?;
                print_json(&json!({ "userId": user_id, "balance": balance, "ledger": ledger }))
            }
            Commands::Submit { user_id, reward_id } => {
                let request = self
                    .redemption
                    .submit_request(SubmitRedemptionRequest { user_id, reward_id })
                    .await?;
                print_json(&request)
            }
            Commands::Decide {
                request_id,
                decision,
                admin_id,
            } => {
                let outcome = self
                    .redemption
                    .decide_request(request_id, DecideRedemptionRequest { decision, admin_id })
                    .await?;
                print_json(&outcome)
            }
            Commands::Pending => print_json(&self.redemption.list_pending_requests().await?),
            Commands::History { user_id } => {
                print_json(&self.redemption.list_user_history(&user_id).await?)
            }
        }
    }

    async fn run_migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("数据库迁移失败")?;

        info!("数据库迁移完成");
        Ok(())
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let output = serde_json::to_string_pretty(value).context("结果序列化失败")?;
    println!("{output}");
    Ok(())
}
