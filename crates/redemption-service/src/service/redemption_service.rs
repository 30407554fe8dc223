//! 奖励兑换服务
//!
//! 编排兑换申请的提交和审批：
//!
//! 1. 提交：参数校验 -> 加载用户和奖励 -> 乐观检查 -> 写入待审批申请
//! 2. 拒绝：带条件地更新状态，不触碰余额和库存
//! 3. 通过：加载最新数据 -> 生成结算单 -> 存储层原子结算 -> 翻译结果
//!
//! 业务规则全部在 [`crate::workflow`] 中，这里只负责 I/O、日志和指标。

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use metrics::counter;
use tracing::{info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

use reward_shared::observability::metrics::{
    REDEMPTION_DECISIONS_TOTAL, REDEMPTION_SUBMISSIONS_TOTAL,
};

use crate::error::{RedemptionError, Result};
use crate::models::{Decision, RedemptionRequest, RequestStatus, Reward, User};
use crate::repository::{
    RedemptionRequestRepositoryTrait, RewardRepositoryTrait, UserRepositoryTrait,
};
use crate::service::dto::{
    DecideRedemptionRequest, DecisionOutcome, RedemptionHistoryDto, SubmitRedemptionRequest,
};
use crate::workflow;

/// 历史查询默认上限
const DEFAULT_HISTORY_LIMIT: i64 = 100;

fn outcome_label<T>(result: &Result<T>) -> &'static str {
    match result {
        Ok(_) => "success",
        Err(err) => err.error_code(),
    }
}

/// 奖励兑换服务
pub struct RedemptionService<U, R, Q>
where
    U: UserRepositoryTrait,
    R: RewardRepositoryTrait,
    Q: RedemptionRequestRepositoryTrait,
{
    user_repo: Arc<U>,
    reward_repo: Arc<R>,
    request_repo: Arc<Q>,
    history_limit: i64,
}

impl<U, R, Q> RedemptionService<U, R, Q>
where
    U: UserRepositoryTrait,
    R: RewardRepositoryTrait,
    Q: RedemptionRequestRepositoryTrait,
{
    pub fn new(user_repo: Arc<U>, reward_repo: Arc<R>, request_repo: Arc<Q>) -> Self {
        Self {
            user_repo,
            reward_repo,
            request_repo,
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }

    /// 设置历史查询上限
    pub fn with_history_limit(mut self, limit: i64) -> Self {
        self.history_limit = limit.max(1);
        self
    }

    /// 提交兑换申请
    ///
    /// 只做乐观检查，不扣减积分和库存。
    #[instrument(skip(self), fields(user_id = %request.user_id, reward_id = %request.reward_id))]
    pub async fn submit_request(
        &self,
        request: SubmitRedemptionRequest,
    ) -> Result<RedemptionRequest> {
        let result = self.try_submit(request).await;
        counter!(REDEMPTION_SUBMISSIONS_TOTAL, "outcome" => outcome_label(&result)).increment(1);
        result
    }

    /// 审批兑换申请
    #[instrument(skip(self), fields(request_id = %request_id, decision = %command.decision.as_str()))]
    pub async fn decide_request(
        &self,
        request_id: Uuid,
        command: DecideRedemptionRequest,
    ) -> Result<DecisionOutcome> {
        let decision = command.decision;
        let result = self.try_decide(request_id, command).await;
        counter!(
            REDEMPTION_DECISIONS_TOTAL,
            "decision" => decision.as_str(),
            "outcome" => outcome_label(&result)
        )
        .increment(1);
        result
    }

    #[instrument(skip(self))]
    pub async fn get_request(&self, request_id: Uuid) -> Result<RedemptionRequest> {
        self.request_repo
            .get_by_id(request_id)
            .await?
            .ok_or(RedemptionError::RequestNotFound(request_id))
    }

    /// 待审批队列，最早提交的在前
    #[instrument(skip(self))]
    pub async fn list_pending_requests(&self) -> Result<Vec<RedemptionRequest>> {
        self.request_repo.list_pending().await
    }

    /// 用户兑换历史，最新的在前
    ///
    /// 奖励被删除的申请仍然返回，奖励名为空。
    #[instrument(skip(self))]
    pub async fn list_user_history(&self, user_id: &str) -> Result<Vec<RedemptionHistoryDto>> {
        if user_id.trim().is_empty() {
            return Err(RedemptionError::Validation("用户ID不能为空".to_string()));
        }

        let requests = self
            .request_repo
            .list_history_for_user(user_id, self.history_limit)
            .await?;

        let mut names: HashMap<Uuid, Option<String>> = HashMap::new();
        for request in &requests {
            if !names.contains_key(&request.reward_id) {
                let name = self
                    .reward_repo
                    .get_reward(request.reward_id)
                    .await?
                    .map(|r| r.name);
                names.insert(request.reward_id, name);
            }
        }

        Ok(requests
            .into_iter()
            .map(|request| {
                let name = names.get(&request.reward_id).cloned().flatten();
                RedemptionHistoryDto::from_request(request, name)
            })
            .collect())
    }

    // ==================== 私有方法 ====================

    async fn try_submit(&self, request: SubmitRedemptionRequest) -> Result<RedemptionRequest> {
        let request = request.trimmed();
        request.validate()?;

        let user = self.load_user(&request.user_id).await?;
        let reward = self.load_reward(request.reward_id).await?;

        workflow::check_submission(&user, &reward)?;

        let created = RedemptionRequest::pending(user.id, reward.id, Utc::now());
        self.request_repo.create(&created).await?;

        info!(request_id = %created.id, "兑换申请已提交");
        Ok(created)
    }

    async fn try_decide(
        &self,
        request_id: Uuid,
        command: DecideRedemptionRequest,
    ) -> Result<DecisionOutcome> {
        let command = command.trimmed();
        command.validate()?;

        let request = self.get_request(request_id).await?;
        workflow::next_status(&request, command.decision)?;

        match command.decision {
            Decision::Rejected => self.reject(&request, &command.admin_id).await,
            Decision::Done => self.approve(&request, &command.admin_id).await,
        }
    }

    async fn reject(&self, request: &RedemptionRequest, admin_id: &str) -> Result<DecisionOutcome> {
        let updated = self
            .request_repo
            .update_status(
                request.id,
                RequestStatus::Pending,
                RequestStatus::Rejected,
                admin_id,
            )
            .await?;

        if !updated {
            // 并发审批抢先处理了该申请
            let current = self.get_request(request.id).await?;
            warn!(status = %current.status, "兑换申请已被处理");
            return Err(RedemptionError::AlreadyFinalized {
                request_id: request.id,
                status: current.status,
            });
        }

        info!(admin_id = %admin_id, "兑换申请已拒绝");
        Ok(DecisionOutcome::rejected(request.id))
    }

    async fn approve(&self, request: &RedemptionRequest, admin_id: &str) -> Result<DecisionOutcome> {
        let user = self.load_user(&request.user_id).await?;
        let reward = self.load_reward(request.reward_id).await?;

        let settlement =
            workflow::plan_approval(request, &user, &reward, admin_id).inspect_err(|err| {
                warn!(error = %err, "兑换申请不满足审批条件");
            })?;

        let outcome = self.request_repo.settle_approval(&settlement).await?;
        let settled = workflow::resolve_settlement(&settlement, outcome).inspect_err(|err| {
            warn!(error = %err, "兑换结算被拒绝，未做任何修改");
        })?;

        info!(
            admin_id = %admin_id,
            user_id = %settlement.user_id,
            reward_id = %settlement.reward_id,
            price = %settlement.price,
            balance_after = %settled.balance_after,
            stock_after = %settled.stock_after,
            "兑换申请已通过"
        );

        Ok(DecisionOutcome {
            request_id: settled.request_id,
            status: RequestStatus::Done,
            balance_after: Some(settled.balance_after),
            stock_after: Some(settled.stock_after),
        })
    }

    async fn load_user(&self, user_id: &str) -> Result<User> {
        self.user_repo
            .get_user(user_id)
            .await?
            .ok_or_else(|| RedemptionError::UserNotFound(user_id.to_string()))
    }

    async fn load_reward(&self, reward_id: Uuid) -> Result<Reward> {
        self.reward_repo
            .get_reward(reward_id)
            .await?
            .ok_or(RedemptionError::RewardNotFound(reward_id))
    }
}
