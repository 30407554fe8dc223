//! 兑换审批状态机
//!
//! 纯业务规则，不做任何 I/O：
//!
//! 1. 提交阶段：乐观检查余额和库存，不预占
//! 2. 审批阶段：基于最新持久化的数据再次检查，生成结算单
//! 3. 结算阶段：存储层在同一事务内带条件地执行扣减，返回 [`SettlementOutcome`]，
//!    由 [`resolve_settlement`] 翻译为业务结果
//!
//! 提交时的检查只是快速失败，库存和余额在提交与审批之间可能变化，
//! 真正的判定以结算事务为准。

use uuid::Uuid;

use crate::error::{RedemptionError, Result};
use crate::models::{Decision, Points, RedemptionRequest, RequestStatus, Reward, Stock, User};

/// 审批通过时需要原子执行的结算单
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApprovalSettlement {
    pub request_id: Uuid,
    pub user_id: String,
    pub reward_id: Uuid,
    /// 写入积分流水的关联描述
    pub reward_name: String,
    /// 扣减的积分（以审批时的奖励价格为准）
    pub price: Points,
    pub decided_by: String,
}

/// 存储层执行结算的结果
///
/// 除 `Settled` 外，其余结果都意味着事务已回滚、没有任何数据变化
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettlementOutcome {
    Settled {
        balance_after: Points,
        stock_after: Stock,
    },
    RequestMissing,
    NotPending(RequestStatus),
    RewardMissing,
    OutOfStock,
    UserMissing,
    InsufficientPoints {
        available: Points,
    },
}

/// 结算成功后的数据快照
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettledApproval {
    pub request_id: Uuid,
    pub balance_after: Points,
    pub stock_after: Stock,
}

/// 提交阶段的乐观检查
///
/// 先检查余额再检查库存，两者都不满足时报告积分不足。
pub fn check_submission(user: &User, reward: &Reward) -> Result<()> {
    if !user.can_afford(reward.price) {
        return Err(RedemptionError::InsufficientPoints {
            required: reward.price,
            available: user.point,
        });
    }

    if !reward.in_stock() {
        return Err(RedemptionError::OutOfStock(reward.id));
    }

    Ok(())
}

/// 计算审批后的状态，终态申请返回 `AlreadyFinalized`
pub fn next_status(request: &RedemptionRequest, decision: Decision) -> Result<RequestStatus> {
    request
        .status
        .transition(decision)
        .ok_or(RedemptionError::AlreadyFinalized {
            request_id: request.id,
            status: request.status,
        })
}

/// 基于最新数据生成结算单
///
/// 库存先于余额检查，与结算事务中的加锁顺序一致。
pub fn plan_approval(
    request: &RedemptionRequest,
    user: &User,
    reward: &Reward,
    decided_by: &str,
) -> Result<ApprovalSettlement> {
    next_status(request, Decision::Done)?;

    if !reward.in_stock() {
        return Err(RedemptionError::OutOfStock(reward.id));
    }

    if !user.can_afford(reward.price) {
        return Err(RedemptionError::InsufficientPoints {
            required: reward.price,
            available: user.point,
        });
    }

    Ok(ApprovalSettlement {
        request_id: request.id,
        user_id: user.id.clone(),
        reward_id: reward.id,
        reward_name: reward.name.clone(),
        price: reward.price,
        decided_by: decided_by.to_string(),
    })
}

/// 将存储层的结算结果翻译为业务结果
pub fn resolve_settlement(
    settlement: &ApprovalSettlement,
    outcome: SettlementOutcome,
) -> Result<SettledApproval> {
    match outcome {
        SettlementOutcome::Settled {
            balance_after,
            stock_after,
        } => Ok(SettledApproval {
            request_id: settlement.request_id,
            balance_after,
            stock_after,
        }),
        SettlementOutcome::RequestMissing => {
            Err(RedemptionError::RequestNotFound(settlement.request_id))
        }
        SettlementOutcome::NotPending(status) => Err(RedemptionError::AlreadyFinalized {
            request_id: settlement.request_id,
            status,
        }),
        SettlementOutcome::RewardMissing => {
            Err(RedemptionError::RewardNotFound(settlement.reward_id))
        }
        SettlementOutcome::OutOfStock => Err(RedemptionError::OutOfStock(settlement.reward_id)),
        SettlementOutcome::UserMissing => {
            Err(RedemptionError::UserNotFound(settlement.user_id.clone()))
        }
        SettlementOutcome::InsufficientPoints { available } => {
            Err(RedemptionError::InsufficientPoints {
                required: settlement.price,
                available,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    use crate::models::UserRole;

    fn user_with_balance(balance: i64) -> User {
        User {
            id: "user-1".to_string(),
            name: "Alice".to_string(),
            role: UserRole::User,
            point: Points::new(balance).unwrap(),
            total_point: Points::new(balance).unwrap(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn reward(price: i64, stock: i64) -> Reward {
        Reward {
            id: Uuid::new_v4(),
            name: "Coffee Voucher".to_string(),
            image: None,
            price: Points::new(price).unwrap(),
            stock: Stock::new(stock).unwrap(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn request_for(user: &User, reward: &Reward, status: RequestStatus) -> RedemptionRequest {
        let mut request = RedemptionRequest::pending(user.id.clone(), reward.id, Utc::now());
        request.status = status;
        request
    }

    #[test]
    fn test_submission_accepted() {
        assert!(check_submission(&user_with_balance(100), &reward(30, 2)).is_ok());
        // 余额恰好等于价格
        assert!(check_submission(&user_with_balance(30), &reward(30, 1)).is_ok());
        // 免费奖励
        assert!(check_submission(&user_with_balance(0), &reward(0, 1)).is_ok());
    }

    #[test]
    fn test_submission_insufficient_points() {
        let err = check_submission(&user_with_balance(10), &reward(30, 5)).unwrap_err();
        match err {
            RedemptionError::InsufficientPoints {
                required,
                available,
            } => {
                assert_eq!(required.value(), 30);
                assert_eq!(available.value(), 10);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_submission_out_of_stock() {
        let reward = reward(30, 0);
        let err = check_submission(&user_with_balance(100), &reward).unwrap_err();
        assert!(matches!(err, RedemptionError::OutOfStock(id) if id == reward.id));
    }

    #[test]
    fn test_submission_reports_points_before_stock() {
        let err = check_submission(&user_with_balance(10), &reward(30, 0)).unwrap_err();
        assert!(matches!(err, RedemptionError::InsufficientPoints { .. }));
    }

    #[test]
    fn test_next_status_rejects_terminal_requests() {
        let user = user_with_balance(100);
        let reward = reward(30, 2);

        let pending = request_for(&user, &reward, RequestStatus::Pending);
        assert_eq!(
            next_status(&pending, Decision::Rejected).unwrap(),
            RequestStatus::Rejected
        );

        for status in [RequestStatus::Done, RequestStatus::Rejected] {
            let request = request_for(&user, &reward, status);
            let err = next_status(&request, Decision::Done).unwrap_err();
            assert!(matches!(
                err,
                RedemptionError::AlreadyFinalized { status: s, .. } if s == status
            ));
        }
    }

    #[test]
    fn test_plan_approval_uses_current_values() {
        let user = user_with_balance(100);
        let reward = reward(30, 2);
        let request = request_for(&user, &reward, RequestStatus::Pending);

        let settlement = plan_approval(&request, &user, &reward, "admin-1").unwrap();
        assert_eq!(settlement.request_id, request.id);
        assert_eq!(settlement.price.value(), 30);
        assert_eq!(settlement.decided_by, "admin-1");

        // 提交之后库存被兑完
        let drained = Reward {
            stock: Stock::ZERO,
            ..reward.clone()
        };
        assert!(matches!(
            plan_approval(&request, &user, &drained, "admin-1"),
            Err(RedemptionError::OutOfStock(_))
        ));

        // 提交之后余额被花掉
        let spent = user_with_balance(20);
        assert!(matches!(
            plan_approval(&request, &spent, &reward, "admin-1"),
            Err(RedemptionError::InsufficientPoints { .. })
        ));
    }

    #[test]
    fn test_resolve_settlement() {
        let user = user_with_balance(100);
        let reward = reward(30, 2);
        let request = request_for(&user, &reward, RequestStatus::Pending);
        let settlement = plan_approval(&request, &user, &reward, "admin-1").unwrap();

        let settled = resolve_settlement(
            &settlement,
            SettlementOutcome::Settled {
                balance_after: Points::new(70).unwrap(),
                stock_after: Stock::new(1).unwrap(),
            },
        )
        .unwrap();
        assert_eq!(settled.balance_after.value(), 70);
        assert_eq!(settled.stock_after.value(), 1);

        assert!(matches!(
            resolve_settlement(&settlement, SettlementOutcome::OutOfStock),
            Err(RedemptionError::OutOfStock(_))
        ));
        assert!(matches!(
            resolve_settlement(
                &settlement,
                SettlementOutcome::NotPending(RequestStatus::Done)
            ),
            Err(RedemptionError::AlreadyFinalized {
                status: RequestStatus::Done,
                ..
            })
        ));
        assert!(matches!(
            resolve_settlement(
                &settlement,
                SettlementOutcome::InsufficientPoints {
                    available: Points::new(5).unwrap()
                }
            ),
            Err(RedemptionError::InsufficientPoints { .. })
        ));
        assert!(matches!(
            resolve_settlement(&settlement, SettlementOutcome::UserMissing),
            Err(RedemptionError::UserNotFound(_))
        ));
        assert!(matches!(
            resolve_settlement(&settlement, SettlementOutcome::RewardMissing),
            Err(RedemptionError::RewardNotFound(_))
        ));
        assert!(matches!(
            resolve_settlement(&settlement, SettlementOutcome::RequestMissing),
            Err(RedemptionError::RequestNotFound(_))
        ));
    }
}
