//! 基础设施错误类型
//!
//! 配置加载、数据库连接、可观测性初始化等启动阶段的错误。
//! 业务错误由各服务自己的错误类型表达。

use thiserror::Error;

/// 基础设施错误
#[derive(Debug, Error)]
pub enum InfraError {
    #[error("数据库错误: {0}")]
    Database(#[from] sqlx::Error),

    #[error("配置错误: {0}")]
    Config(#[from] config::ConfigError),

    #[error("可观测性初始化失败: {0}")]
    Observability(String),
}

/// 基础设施 Result 类型别名
pub type Result<T> = std::result::Result<T, InfraError>;

impl InfraError {
    /// 获取错误码
    pub fn code(&self) -> &'static str {
        match self {
            Self::Database(_) => "DATABASE_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Observability(_) => "OBSERVABILITY_ERROR",
        }
    }

    /// 是否为可重试错误
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Database(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code() {
        let err = InfraError::Observability("recorder already installed".to_string());
        assert_eq!(err.code(), "OBSERVABILITY_ERROR");
        assert!(err.to_string().contains("recorder already installed"));
    }

    #[test]
    fn test_is_retryable() {
        let db_err = InfraError::Database(sqlx::Error::PoolTimedOut);
        assert!(db_err.is_retryable());

        let config_err = InfraError::Config(config::ConfigError::NotFound("database".to_string()));
        assert!(!config_err.is_retryable());
    }
}
