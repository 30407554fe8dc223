//! 统一可观测性模块
//!
//! 提供 logging 与 metrics 的统一初始化。
//! 所有入口通过单一函数配置可观测性，确保一致的日志格式和指标命名。

pub mod metrics;
pub mod tracing;

use ::tracing::info;

use crate::config::ObservabilityConfig;
use crate::error::Result;

/// 统一初始化可观测性
///
/// 初始化顺序：
/// 1. Tracing（日志）
/// 2. Metrics（Prometheus 指标，仅在配置启用时）
///
/// # Example
///
/// ```ignore
/// use reward_shared::{config::AppConfig, observability};
///
/// let config = AppConfig::load("reward-redemption-service")?;
/// observability::init(&config.service_name, &config.observability)?;
/// ```
pub fn init(service_name: &str, config: &ObservabilityConfig) -> Result<()> {
    tracing::init(config)?;

    if config.metrics_enabled {
        metrics::init(config)?;
    }
    metrics::describe();

    info!(
        service = %service_name,
        metrics_enabled = config.metrics_enabled,
        metrics_port = config.metrics_port,
        "Observability initialized"
    );

    Ok(())
}
