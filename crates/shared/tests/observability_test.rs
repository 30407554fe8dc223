//! 可观测性模块集成测试

use reward_shared::config::ObservabilityConfig;
use reward_shared::error::InfraError;
use reward_shared::observability;

#[test]
fn test_describe_without_recorder_is_noop() {
    observability::metrics::describe();
    metrics::counter!(observability::metrics::REDEMPTION_SUBMISSIONS_TOTAL, "outcome" => "success")
        .increment(1);
}

#[test]
fn test_tracing_init_only_once() {
    let config = ObservabilityConfig {
        json_logs: true,
        ..Default::default()
    };

    observability::tracing::init(&config).unwrap();
    tracing::info!("subscriber installed");

    let err = observability::tracing::init(&config).unwrap_err();
    assert!(matches!(err, InfraError::Observability(_)));
    assert_eq!(err.code(), "OBSERVABILITY_ERROR");
}
