//! Prometheus 指标模块
//!
//! 基于 metrics crate 和 metrics-exporter-prometheus 实现指标收集与导出。
//! 指标通过独立的 HTTP 端口暴露，供 Prometheus 抓取。

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tracing::info;

use crate::config::ObservabilityConfig;
use crate::error::{InfraError, Result};

/// 兑换申请提交次数，标签 `outcome`
pub const REDEMPTION_SUBMISSIONS_TOTAL: &str = "redemption_submissions_total";
/// 兑换审批次数，标签 `decision`、`outcome`
pub const REDEMPTION_DECISIONS_TOTAL: &str = "redemption_decisions_total";
/// 任务积分入账次数
pub const POINT_CREDITS_TOTAL: &str = "point_credits_total";

/// 安装 Prometheus recorder 并启动 `/metrics` 监听
///
/// 需要在 tokio 运行时内调用。
pub fn init(config: &ObservabilityConfig) -> Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], config.metrics_port));
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| InfraError::Observability(e.to_string()))?;

    info!("Metrics exporter listening on {}", addr);
    Ok(())
}

/// 注册指标描述
///
/// 未安装 recorder 时这些调用是空操作。
pub fn describe() {
    metrics::describe_counter!(
        REDEMPTION_SUBMISSIONS_TOTAL,
        "Total number of reward redemption submissions"
    );
    metrics::describe_counter!(
        REDEMPTION_DECISIONS_TOTAL,
        "Total number of reward redemption decisions"
    );
    metrics::describe_counter!(POINT_CREDITS_TOTAL, "Total number of task point credits");
}
