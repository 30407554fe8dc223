//! 数据库连接管理模块
//!
//! 提供 PostgreSQL 连接池管理，支持健康检查和连接配置。

use crate::config::DatabaseConfig;
use crate::error::{InfraError, Result};
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use std::str::FromStr;
use std::time::Duration;
use tracing::{info, instrument};

/// 数据库连接池包装
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// 创建数据库连接池
    ///
    /// `statement_timeout_ms` 大于 0 时会作为会话参数下发，
    /// 保证任何一条 SQL 都不会无限期阻塞。
    #[instrument(skip(config))]
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        info!("Connecting to database...");

        let options = connect_options(config)?;
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_seconds))
            .idle_timeout(Duration::from_secs(config.idle_timeout_seconds))
            .connect_with(options)
            .await?;

        info!("Database connection pool created");

        Ok(Self { pool })
    }

    /// 获取连接池引用
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// 健康检查
    pub async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(InfraError::from)
    }

    /// 关闭连接池
    pub async fn close(&self) {
        self.pool.close().await;
        info!("Database connection pool closed");
    }
}

fn connect_options(config: &DatabaseConfig) -> Result<PgConnectOptions> {
    let options = PgConnectOptions::from_str(&config.url)?;
    if config.statement_timeout_ms == 0 {
        return Ok(options);
    }
    Ok(options.options([(
        "statement_timeout",
        format!("{}ms", config.statement_timeout_ms),
    )]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_options_rejects_bad_url() {
        let config = DatabaseConfig {
            url: "not a url".to_string(),
            ..Default::default()
        };
        assert!(connect_options(&config).is_err());
    }

    #[test]
    fn test_connect_options_parses_default_url() {
        let config = DatabaseConfig::default();
        let options = connect_options(&config).unwrap();
        assert_eq!(options.get_database(), Some("reward_db"));
    }

    #[tokio::test]
    #[ignore] // 需要数据库连接
    async fn test_database_connection() {
        let config = DatabaseConfig {
            url: std::env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            ..Default::default()
        };
        let db = Database::connect(&config).await.unwrap();
        db.health_check().await.unwrap();
    }
}
