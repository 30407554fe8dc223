//! 内存存储
//!
//! 同时实现三个仓储接口，适用于测试和嵌入式场景。
//! 所有数据放在一把互斥锁之后，结算与 PostgreSQL 实现一样是全有或全无的。

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use uuid::Uuid;

use super::traits::{
    RedemptionRequestRepositoryTrait, RewardRepositoryTrait, UserRepositoryTrait,
};
use crate::error::{RedemptionError, Result};
use crate::models::{
    PointChangeType, PointLedgerEntry, Points, RedemptionRequest, RequestStatus, Reward, Stock,
    User,
};
use crate::workflow::{ApprovalSettlement, SettlementOutcome};

#[derive(Debug, Default)]
struct MemoryState {
    users: HashMap<String, User>,
    rewards: HashMap<Uuid, Reward>,
    requests: HashMap<Uuid, RedemptionRequest>,
    ledger: Vec<PointLedgerEntry>,
}

/// 内存存储
///
/// `Clone` 共享同一份数据
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 插入或覆盖用户（用户由外部系统创建）
    pub fn insert_user(&self, user: User) {
        self.state.lock().users.insert(user.id.clone(), user);
    }

    /// 插入或覆盖奖励
    pub fn insert_reward(&self, reward: Reward) {
        self.state.lock().rewards.insert(reward.id, reward);
    }

    /// 当前余额快照
    pub fn balance_of(&self, user_id: &str) -> Option<Points> {
        self.state.lock().users.get(user_id).map(|u| u.point)
    }

    /// 当前库存快照
    pub fn stock_of(&self, reward_id: Uuid) -> Option<Stock> {
        self.state.lock().rewards.get(&reward_id).map(|r| r.stock)
    }

    /// 兑换申请总数
    pub fn request_count(&self) -> usize {
        self.state.lock().requests.len()
    }
}

#[async_trait]
impl UserRepositoryTrait for MemoryStore {
    async fn get_user(&self, id: &str) -> Result<Option<User>> {
        Ok(self.state.lock().users.get(id).cloned())
    }

    async fn update_balance(&self, id: &str, expected: Points, new_balance: Points) -> Result<bool> {
        let mut state = self.state.lock();
        match state.users.get_mut(id) {
            Some(user) if user.point == expected => {
                user.point = new_balance;
                user.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn credit_points(
        &self,
        id: &str,
        points: Points,
        reference: &str,
    ) -> Result<Option<Points>> {
        let mut state = self.state.lock();
        let Some(user) = state.users.get_mut(id) else {
            return Ok(None);
        };

        let (Some(point), Some(total_point)) = (
            user.point.checked_add(points),
            user.total_point.checked_add(points),
        ) else {
            return Err(RedemptionError::Validation(format!(
                "入账后积分超出上限: user_id={}",
                id
            )));
        };
        user.point = point;
        user.total_point = total_point;
        user.updated_at = Utc::now();

        let entry = PointLedgerEntry::new(id, PointChangeType::TaskCredit, reference, points, point);
        state.ledger.push(entry);

        Ok(Some(point))
    }

    async fn list_ledger_entries(&self, user_id: &str, limit: i64) -> Result<Vec<PointLedgerEntry>> {
        let state = self.state.lock();
        let limit = usize::try_from(limit).unwrap_or(0);
        Ok(state
            .ledger
            .iter()
            .rev()
            .filter(|e| e.user_id == user_id)
            .take(limit)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl RewardRepositoryTrait for MemoryStore {
    async fn get_reward(&self, id: Uuid) -> Result<Option<Reward>> {
        Ok(self.state.lock().rewards.get(&id).cloned())
    }

    async fn list_rewards(&self) -> Result<Vec<Reward>> {
        let mut rewards: Vec<Reward> = self.state.lock().rewards.values().cloned().collect();
        rewards.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(rewards)
    }

    async fn create_reward(&self, reward: &Reward) -> Result<()> {
        let mut state = self.state.lock();
        if state.rewards.contains_key(&reward.id) {
            return Err(RedemptionError::persistence(format!(
                "duplicate reward id {}",
                reward.id
            )));
        }
        state.rewards.insert(reward.id, reward.clone());
        Ok(())
    }

    async fn update_reward(&self, reward: &Reward) -> Result<bool> {
        let mut state = self.state.lock();
        match state.rewards.get_mut(&reward.id) {
            Some(existing) => {
                *existing = reward.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn update_stock(&self, id: Uuid, new_stock: Stock) -> Result<bool> {
        let mut state = self.state.lock();
        match state.rewards.get_mut(&id) {
            Some(reward) => {
                reward.stock = new_stock;
                reward.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_reward(&self, id: Uuid) -> Result<bool> {
        let mut state = self.state.lock();
        let referenced = state
            .requests
            .values()
            .any(|r| r.reward_id == id && r.is_pending());
        if referenced {
            return Ok(false);
        }
        Ok(state.rewards.remove(&id).is_some())
    }
}

#[async_trait]
impl RedemptionRequestRepositoryTrait for MemoryStore {
    async fn create(&self, request: &RedemptionRequest) -> Result<Uuid> {
        let mut state = self.state.lock();
        // 与 delete_reward 在同一把锁下互斥
        if !state.rewards.contains_key(&request.reward_id) {
            return Err(RedemptionError::RewardNotFound(request.reward_id));
        }
        state.requests.insert(request.id, request.clone());
        Ok(request.id)
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<RedemptionRequest>> {
        Ok(self.state.lock().requests.get(&id).cloned())
    }

    async fn update_status(
        &self,
        id: Uuid,
        from: RequestStatus,
        to: RequestStatus,
        decided_by: &str,
    ) -> Result<bool> {
        let mut state = self.state.lock();
        match state.requests.get_mut(&id) {
            Some(request) if request.status == from => {
                request.status = to;
                request.decided_by = Some(decided_by.to_string());
                request.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn list_pending(&self) -> Result<Vec<RedemptionRequest>> {
        let mut pending: Vec<RedemptionRequest> = self
            .state
            .lock()
            .requests
            .values()
            .filter(|r| r.is_pending())
            .cloned()
            .collect();
        pending.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(pending)
    }

    async fn list_history_for_user(
        &self,
        user_id: &str,
        limit: i64,
    ) -> Result<Vec<RedemptionRequest>> {
        let mut history: Vec<RedemptionRequest> = self
            .state
            .lock()
            .requests
            .values()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        history.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        history.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(history)
    }

    async fn count_pending_for_reward(&self, reward_id: Uuid) -> Result<i64> {
        let count = self
            .state
            .lock()
            .requests
            .values()
            .filter(|r| r.reward_id == reward_id && r.is_pending())
            .count();
        Ok(i64::try_from(count).unwrap_or(i64::MAX))
    }

    async fn settle_approval(&self, settlement: &ApprovalSettlement) -> Result<SettlementOutcome> {
        let mut state = self.state.lock();

        // 先全部检查，再统一写入
        match state.requests.get(&settlement.request_id) {
            None => return Ok(SettlementOutcome::RequestMissing),
            Some(request) if !request.is_pending() => {
                return Ok(SettlementOutcome::NotPending(request.status));
            }
            Some(_) => {}
        }

        let stock_after = match state.rewards.get(&settlement.reward_id) {
            None => return Ok(SettlementOutcome::RewardMissing),
            Some(reward) => match reward.stock.take_one() {
                Some(stock) => stock,
                None => return Ok(SettlementOutcome::OutOfStock),
            },
        };

        let balance_after = match state.users.get(&settlement.user_id) {
            None => return Ok(SettlementOutcome::UserMissing),
            Some(user) => match user.point.checked_sub(settlement.price) {
                Some(balance) => balance,
                None => {
                    return Ok(SettlementOutcome::InsufficientPoints {
                        available: user.point,
                    });
                }
            },
        };

        let now = Utc::now();
        if let Some(request) = state.requests.get_mut(&settlement.request_id) {
            request.status = RequestStatus::Done;
            request.decided_by = Some(settlement.decided_by.clone());
            request.updated_at = now;
        }
        if let Some(reward) = state.rewards.get_mut(&settlement.reward_id) {
            reward.stock = stock_after;
            reward.updated_at = now;
        }
        if let Some(user) = state.users.get_mut(&settlement.user_id) {
            user.point = balance_after;
            user.updated_at = now;
        }
        state.ledger.push(PointLedgerEntry::new(
            settlement.user_id.clone(),
            PointChangeType::RewardRedeem,
            settlement.reward_name.clone(),
            settlement.price,
            balance_after,
        ));

        Ok(SettlementOutcome::Settled {
            balance_after,
            stock_after,
        })
    }
}
