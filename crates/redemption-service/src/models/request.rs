//! 兑换申请
//!
//! 状态流转：
//!
//! ```text
//! Pending ──Done──────▶ Done      (终态)
//!    │
//!    └────Rejected────▶ Rejected  (终态)
//! ```

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 兑换申请状态
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "varchar", rename_all = "lowercase")]
pub enum RequestStatus {
    /// 待审批
    #[default]
    Pending,
    /// 已通过，积分和库存已扣减
    Done,
    /// 已拒绝
    Rejected,
}

impl RequestStatus {
    /// 是否为终态
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Done => "DONE",
            Self::Rejected => "REJECTED",
        }
    }

    /// 按审批决定计算下一个状态，终态不允许再流转
    pub fn transition(self, decision: Decision) -> Option<Self> {
        if self.is_terminal() {
            return None;
        }
        Some(decision.target_status())
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 管理员的审批决定
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Decision {
    Done,
    Rejected,
}

impl Decision {
    pub fn target_status(self) -> RequestStatus {
        match self {
            Self::Done => RequestStatus::Done,
            Self::Rejected => RequestStatus::Rejected,
        }
    }

    pub fn as_str(self) -> &'static str {
        self.target_status().as_str()
    }
}

impl FromStr for Decision {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "done" | "approve" | "approved" => Ok(Self::Done),
            "rejected" | "reject" => Ok(Self::Rejected),
            other => Err(format!("未知的审批决定: {}", other)),
        }
    }
}

/// 兑换申请
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct RedemptionRequest {
    pub id: Uuid,
    pub user_id: String,
    pub reward_id: Uuid,
    pub status: RequestStatus,
    /// 做出审批决定的管理员，待审批时为空
    #[sqlx(default)]
    pub decided_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RedemptionRequest {
    /// 新建一条待审批的申请
    pub fn pending(user_id: impl Into<String>, reward_id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::now_v7(),
            user_id: user_id.into(),
            reward_id,
            status: RequestStatus::Pending,
            decided_by: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == RequestStatus::Pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_transitions() {
        assert_eq!(
            RequestStatus::Pending.transition(Decision::Done),
            Some(RequestStatus::Done)
        );
        assert_eq!(
            RequestStatus::Pending.transition(Decision::Rejected),
            Some(RequestStatus::Rejected)
        );
    }

    #[test]
    fn test_terminal_states_never_transition() {
        for status in [RequestStatus::Done, RequestStatus::Rejected] {
            assert!(status.is_terminal());
            assert_eq!(status.transition(Decision::Done), None);
            assert_eq!(status.transition(Decision::Rejected), None);
        }
        assert!(!RequestStatus::Pending.is_terminal());
    }

    #[test]
    fn test_decision_from_str() {
        assert_eq!("done".parse::<Decision>().unwrap(), Decision::Done);
        assert_eq!("Approve".parse::<Decision>().unwrap(), Decision::Done);
        assert_eq!(" REJECTED ".parse::<Decision>().unwrap(), Decision::Rejected);
        assert!("pending".parse::<Decision>().is_err());
    }

    #[test]
    fn test_new_request_is_pending() {
        let request = RedemptionRequest::pending("user-1", Uuid::new_v4(), Utc::now());
        assert!(request.is_pending());
        assert!(request.decided_by.is_none());
        assert_eq!(request.created_at, request.updated_at);
    }

    #[test]
    fn test_status_serialization() {
        assert_eq!(
            serde_json::to_value(RequestStatus::Rejected).unwrap(),
            "REJECTED"
        );
        assert_eq!(serde_json::to_value(Decision::Done).unwrap(), "DONE");
    }
}
