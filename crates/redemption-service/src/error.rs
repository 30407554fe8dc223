//! 兑换服务错误类型
//!
//! 定义服务层的业务错误和系统错误。
//! 所有错误的 Display 文案都是稳定的、可直接展示给用户的中文描述，
//! 存储层细节只保留在 `source()` 中供日志使用。

use thiserror::Error;
use uuid::Uuid;

use crate::models::{AmountError, Points, RequestStatus};

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// 兑换服务错误类型
#[derive(Debug, Error)]
pub enum RedemptionError {
    // === 参数错误 ===
    #[error("参数校验失败: {0}")]
    Validation(String),

    // === 资源不存在 ===
    #[error("用户不存在: {0}")]
    UserNotFound(String),

    #[error("奖励不存在: {0}")]
    RewardNotFound(Uuid),

    #[error("兑换申请不存在: {0}")]
    RequestNotFound(Uuid),

    // === 兑换规则 ===
    #[error("积分不足: 需要 {required}, 可用 {available}")]
    InsufficientPoints { required: Points, available: Points },

    #[error("奖励库存不足: reward_id={0}")]
    OutOfStock(Uuid),

    #[error("兑换申请已处理，不能再次审批: request_id={request_id}, status={status}")]
    AlreadyFinalized {
        request_id: Uuid,
        status: RequestStatus,
    },

    #[error("奖励仍有 {pending} 个待审批的兑换申请，不能删除: reward_id={reward_id}")]
    RewardInUse { reward_id: Uuid, pending: i64 },

    // === 系统错误 ===
    #[error("并发冲突，请重试")]
    ConcurrencyConflict,

    #[error("数据存储失败，请稍后重试")]
    Persistence(#[source] BoxError),
}

/// 兑换服务 Result 类型别名
pub type Result<T> = std::result::Result<T, RedemptionError>;

impl RedemptionError {
    /// 包装存储层错误
    pub fn persistence(err: impl Into<BoxError>) -> Self {
        Self::Persistence(err.into())
    }

    /// 检查是否为可重试的错误
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Persistence(_) | Self::ConcurrencyConflict)
    }

    /// 检查是否为业务错误（非系统错误）
    pub fn is_business_error(&self) -> bool {
        !matches!(self, Self::Persistence(_) | Self::ConcurrencyConflict)
    }

    /// 获取错误码（用于 API 响应）
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::UserNotFound(_) => "USER_NOT_FOUND",
            Self::RewardNotFound(_) => "REWARD_NOT_FOUND",
            Self::RequestNotFound(_) => "REQUEST_NOT_FOUND",
            Self::InsufficientPoints { .. } => "INSUFFICIENT_POINTS",
            Self::OutOfStock(_) => "OUT_OF_STOCK",
            Self::AlreadyFinalized { .. } => "ALREADY_FINALIZED",
            Self::RewardInUse { .. } => "REWARD_IN_USE",
            Self::ConcurrencyConflict => "CONCURRENCY_CONFLICT",
            Self::Persistence(_) => "PERSISTENCE_FAILURE",
        }
    }
}

impl From<sqlx::Error> for RedemptionError {
    fn from(err: sqlx::Error) -> Self {
        Self::persistence(err)
    }
}

impl From<validator::ValidationErrors> for RedemptionError {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::Validation(errors.to_string())
    }
}

impl From<AmountError> for RedemptionError {
    fn from(err: AmountError) -> Self {
        Self::Validation(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    fn points(value: i64) -> Points {
        Points::new(value).unwrap()
    }

    #[test]
    fn test_error_is_retryable() {
        assert!(RedemptionError::ConcurrencyConflict.is_retryable());
        assert!(RedemptionError::from(sqlx::Error::PoolTimedOut).is_retryable());
        assert!(!RedemptionError::OutOfStock(Uuid::nil()).is_retryable());
        assert!(
            !RedemptionError::InsufficientPoints {
                required: points(30),
                available: points(10),
            }
            .is_retryable()
        );
    }

    #[test]
    fn test_error_is_business_error() {
        assert!(RedemptionError::UserNotFound("user-1".to_string()).is_business_error());
        assert!(
            RedemptionError::AlreadyFinalized {
                request_id: Uuid::nil(),
                status: RequestStatus::Done,
            }
            .is_business_error()
        );
        assert!(!RedemptionError::ConcurrencyConflict.is_business_error());
        assert!(!RedemptionError::persistence("disk full").is_business_error());
    }

    #[test]
    fn test_error_code() {
        assert_eq!(
            RedemptionError::OutOfStock(Uuid::nil()).error_code(),
            "OUT_OF_STOCK"
        );
        assert_eq!(
            RedemptionError::Validation("name".to_string()).error_code(),
            "VALIDATION_ERROR"
        );
        assert_eq!(
            RedemptionError::persistence("boom").error_code(),
            "PERSISTENCE_FAILURE"
        );
    }

    #[test]
    fn test_error_display() {
        let err = RedemptionError::InsufficientPoints {
            required: points(30),
            available: points(10),
        };
        assert!(err.to_string().contains("30"));
        assert!(err.to_string().contains("10"));

        let err = RedemptionError::AlreadyFinalized {
            request_id: Uuid::nil(),
            status: RequestStatus::Rejected,
        };
        assert!(err.to_string().contains("REJECTED"));
    }

    #[test]
    fn test_persistence_hides_storage_details() {
        let err = RedemptionError::from(sqlx::Error::Protocol(
            "relation \"users\" does not exist".to_string(),
        ));
        assert!(!err.to_string().contains("users"));
        assert!(err.source().unwrap().to_string().contains("users"));
    }
}
