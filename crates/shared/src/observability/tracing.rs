//! 日志初始化
//!
//! 基于 tracing-subscriber，`RUST_LOG` 优先于配置文件中的日志级别。

use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

use crate::config::ObservabilityConfig;
use crate::error::{InfraError, Result};

/// 构建日志级别过滤器
pub fn env_filter(config: &ObservabilityConfig) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// 初始化全局 subscriber
///
/// 重复初始化会返回错误，调用方只应在进程入口调用一次。
pub fn init(config: &ObservabilityConfig) -> Result<()> {
    let fmt_layer = if config.json_logs {
        fmt::layer()
            .json()
            .with_span_events(FmtSpan::CLOSE)
            .with_target(true)
            .with_thread_ids(true)
            .boxed()
    } else {
        fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_ansi(true)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(env_filter(config))
        .with(fmt_layer)
        .try_init()
        .map_err(|e| InfraError::Observability(e.to_string()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_filter_falls_back_on_invalid_level() {
        let config = ObservabilityConfig {
            log_level: "not[a]valid=filter=".to_string(),
            ..Default::default()
        };
        // 无效配置不会 panic，退化为 info
        let _ = env_filter(&config);
    }
}
